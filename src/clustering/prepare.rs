use log::debug;

use crate::{context::EvaluationContext, encoder::LabelEncoder, error::MetricError, matrix::DenseMatrix};

/// Encoded true and predicted labels, scoped to one metric call.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedExternal {
    pub y_true: Vec<usize>,
    pub y_pred: Vec<usize>,
    pub n_classes: usize,
    pub n_clusters: usize,
    pub decimal: u32,
}

/// Encoded predicted labels alongside their feature matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedInternal<'a> {
    pub x: &'a DenseMatrix,
    pub labels: Vec<usize>,
    pub n_clusters: usize,
    pub decimal: u32,
}

/// Validates and encodes labels for metrics comparing two labelings.
///
/// The true and predicted labels get independent encoders.
pub fn prepare_clustering_external<L: Ord + Clone>(
    y_true: Option<&[L]>,
    y_pred: Option<&[L]>,
    decimal: Option<i32>,
    ctx: &EvaluationContext,
) -> Result<PreparedExternal, MetricError> {
    let decimal = ctx.resolve_decimal(decimal)?;
    let (y_true, y_pred) = match (y_true, y_pred) {
        (Some(t), Some(p)) => (t, p),
        _ => {
            return Err(MetricError::MissingInput(
                "You need to pass y_true and y_pred to calculate external clustering metrics.".to_string(),
            ))
        }
    };
    if y_true.len() != y_pred.len() {
        return Err(MetricError::ShapeMismatch(format!(
            "y_true has {} labels but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(MetricError::InvalidValue("y_true and y_pred must not be empty".to_string()));
    }

    let (true_encoder, y_true) = LabelEncoder::fit_transform(y_true);
    let (pred_encoder, y_pred) = LabelEncoder::fit_transform(y_pred);
    debug!(
        "Encoded {} samples into {} classes and {} clusters",
        y_true.len(),
        true_encoder.n_classes(),
        pred_encoder.n_classes()
    );
    Ok(PreparedExternal {
        y_true,
        y_pred,
        n_classes: true_encoder.n_classes(),
        n_clusters: pred_encoder.n_classes(),
        decimal,
    })
}

/// Validates and encodes predicted labels for metrics scoring a labeling against its features.
pub fn prepare_clustering_internal<'a, L: Ord + Clone>(
    x: Option<&'a DenseMatrix>,
    y_pred: Option<&[L]>,
    decimal: Option<i32>,
    ctx: &EvaluationContext,
) -> Result<PreparedInternal<'a>, MetricError> {
    let decimal = ctx.resolve_decimal(decimal)?;
    let x = x.ok_or_else(|| MetricError::MissingInput("To calculate internal metrics, you need to pass X.".to_string()))?;
    let y_pred = y_pred.ok_or_else(|| {
        MetricError::MissingInput("You need to pass y_pred to calculate internal clustering metrics.".to_string())
    })?;
    if x.rows() != y_pred.len() {
        return Err(MetricError::ShapeMismatch(format!(
            "X has {} samples but y_pred has {}",
            x.rows(),
            y_pred.len()
        )));
    }
    if y_pred.is_empty() || x.cols() == 0 {
        return Err(MetricError::InvalidValue("X and y_pred must not be empty".to_string()));
    }

    let (encoder, labels) = LabelEncoder::fit_transform(y_pred);
    debug!("Encoded {} samples into {} clusters", labels.len(), encoder.n_classes());
    Ok(PreparedInternal {
        x,
        labels,
        n_clusters: encoder.n_classes(),
        decimal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_encoders_are_independent() {
        let ctx = EvaluationContext::default();
        let t = ["b", "a", "b", "c"];
        let p = ["z", "z", "y", "y"];
        let prepared = prepare_clustering_external(Some(&t[..]), Some(&p[..]), None, &ctx).unwrap();
        assert_eq!(prepared.y_true, vec![1, 0, 1, 2]);
        assert_eq!(prepared.y_pred, vec![1, 1, 0, 0]);
        assert_eq!(prepared.n_classes, 3);
        assert_eq!(prepared.n_clusters, 2);
    }

    #[test]
    fn test_external_missing_and_mismatch() {
        let ctx = EvaluationContext::default();
        let t = [0, 1, 1];
        let result = prepare_clustering_external(Some(&t[..]), None, None, &ctx);
        assert!(matches!(result, Err(MetricError::MissingInput(_))));
        let result = prepare_clustering_external(Some(&t[..]), Some(&t[..2]), None, &ctx);
        assert!(matches!(result, Err(MetricError::ShapeMismatch(_))));
    }

    #[test]
    fn test_internal_validation() {
        let ctx = EvaluationContext::default();
        let x = DenseMatrix::new(3, 1, &[0.0, 1.0, 2.0]);
        let labels = [5, 5, 9];
        let prepared = prepare_clustering_internal(Some(&x), Some(&labels[..]), Some(2), &ctx).unwrap();
        assert_eq!(prepared.labels, vec![0, 0, 1]);
        assert_eq!(prepared.n_clusters, 2);
        assert_eq!(prepared.decimal, 2);

        let result = prepare_clustering_internal::<i32>(None, Some(&labels[..]), None, &ctx);
        assert!(matches!(result, Err(MetricError::MissingInput(_))));
        let result = prepare_clustering_internal(Some(&x), Some(&labels[..2]), None, &ctx);
        assert!(matches!(result, Err(MetricError::ShapeMismatch(_))));
    }
}
