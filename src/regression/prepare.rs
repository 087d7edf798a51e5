use log::debug;

use crate::{context::EvaluationContext, error::MetricError, matrix::DenseMatrix};

/// The ground truth and prediction of one output column after filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnPair {
    pub y_true: Vec<f64>,
    pub y_pred: Vec<f64>,
}

/// Validated regression inputs, scoped to one metric call.
///
/// Filtering runs per column, so columns may hold different numbers of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRegression {
    pub columns: Vec<ColumnPair>,
    pub single_column: bool,
    pub decimal: u32,
}

/// Validates shapes, resolves the decimal and applies the `positive_only` and `clean` row filters.
///
/// `positive_only` keeps rows where both values are strictly positive; `clean`
/// drops rows where the prediction is zero.
pub fn prepare_regression(
    y_true: &DenseMatrix,
    y_pred: &DenseMatrix,
    clean: bool,
    decimal: Option<i32>,
    positive_only: bool,
    ctx: &EvaluationContext,
) -> Result<PreparedRegression, MetricError> {
    let decimal = ctx.resolve_decimal(decimal)?;
    if y_true.rows() != y_pred.rows() {
        return Err(MetricError::ShapeMismatch(format!(
            "y_true has {} samples but y_pred has {}",
            y_true.rows(),
            y_pred.rows()
        )));
    }
    if y_true.cols() != y_pred.cols() {
        return Err(MetricError::ShapeMismatch(format!(
            "y_true has {} columns but y_pred has {}",
            y_true.cols(),
            y_pred.cols()
        )));
    }
    if y_true.rows() == 0 || y_true.cols() == 0 {
        return Err(MetricError::InvalidValue("y_true and y_pred must not be empty".to_string()));
    }

    let columns = (0..y_true.cols())
        .map(|j| {
            let (t, p) = (y_true.column(j), y_pred.column(j));
            filter_column(j, t, p, clean, positive_only)
        })
        .collect();

    Ok(PreparedRegression {
        columns,
        single_column: y_true.cols() == 1,
        decimal,
    })
}

fn filter_column(index: usize, y_true: Vec<f64>, y_pred: Vec<f64>, clean: bool, positive_only: bool) -> ColumnPair {
    if !clean && !positive_only {
        return ColumnPair { y_true, y_pred };
    }
    let total = y_true.len();
    let (t, p): (Vec<f64>, Vec<f64>) = y_true
        .into_iter()
        .zip(y_pred)
        .filter(|&(t, p)| !(positive_only && (t <= 0.0 || p <= 0.0)) && !(clean && p == 0.0))
        .unzip();
    if t.len() != total {
        debug!("Column {}: filtering dropped {} of {} rows", index, total - t.len(), total);
    }
    ColumnPair { y_true: t, y_pred: p }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_detection() {
        let ctx = EvaluationContext::default();
        let t = DenseMatrix::from_column(&[1.0, 2.0]);
        let p = DenseMatrix::new(2, 1, &[1.0, 2.0]);
        let prepared = prepare_regression(&t, &p, false, None, false, &ctx).unwrap();
        assert!(prepared.single_column);
        assert_eq!(prepared.decimal, 5);

        let t = DenseMatrix::new(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let prepared = prepare_regression(&t, &t, false, Some(3), false, &ctx).unwrap();
        assert!(!prepared.single_column);
        assert_eq!(prepared.columns[1].y_true, vec![2.0, 4.0]);
        assert_eq!(prepared.decimal, 3);
    }

    #[test]
    fn test_length_mismatch() {
        let ctx = EvaluationContext::default();
        let t = DenseMatrix::from_column(&[1.0, 2.0, 3.0]);
        let p = DenseMatrix::from_column(&[1.0, 2.0]);
        let result = prepare_regression(&t, &p, false, None, false, &ctx);
        assert!(matches!(result, Err(MetricError::ShapeMismatch(_))));
    }

    #[test]
    fn test_negative_decimal() {
        let ctx = EvaluationContext::default();
        let t = DenseMatrix::from_column(&[1.0]);
        let result = prepare_regression(&t, &t, false, Some(-2), false, &ctx);
        assert!(matches!(result, Err(MetricError::InvalidValue(_))));
    }

    #[test]
    fn test_clean_drops_zero_predictions() {
        let ctx = EvaluationContext::default();
        let t = DenseMatrix::from_column(&[1.0, 0.0, 3.0]);
        let p = DenseMatrix::from_column(&[0.0, 2.0, 3.0]);
        let prepared = prepare_regression(&t, &p, true, None, false, &ctx).unwrap();
        assert_eq!(prepared.columns[0].y_true, vec![0.0, 3.0]);
        assert_eq!(prepared.columns[0].y_pred, vec![2.0, 3.0]);
    }

    #[test]
    fn test_positive_only_per_column() {
        let ctx = EvaluationContext::default();
        let t = DenseMatrix::new(3, 2, &[1.0, -1.0, 2.0, 2.0, -3.0, 3.0]);
        let p = DenseMatrix::new(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let prepared = prepare_regression(&t, &p, false, None, true, &ctx).unwrap();
        assert_eq!(prepared.columns[0].y_true, vec![1.0, 2.0]);
        assert_eq!(prepared.columns[1].y_true, vec![2.0, 3.0]);
    }
}
