use serde::{Deserialize, Serialize};

use super::{error::MetricError, util::round_to};

/// How per-column scores of a multi-output evaluation are reduced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiOutput {
    /// Keep one score per column.
    #[default]
    RawValues,
    /// Unweighted mean of the column scores.
    Mean,
    /// Weighted mean, one weight per column.
    Weights(Vec<f64>),
}

/// The result of a metric call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Vector(Vec<f64>),
    /// Element-wise results, one vector per output column.
    Columns(Vec<Vec<f64>>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            MetricValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            MetricValue::Scalar(v) => format!("{}", v),
            MetricValue::Vector(v) => format!("{:?}", v),
            MetricValue::Columns(c) => format!("{:?}", c),
        }
    }
}

/// Reduces per-column scores under `mode` and rounds the outcome as the final step.
///
/// A single-column evaluation always yields a scalar regardless of `mode`.
pub fn aggregate(
    per_column: &[f64],
    single_column: bool,
    mode: &MultiOutput,
    decimal: u32,
) -> Result<MetricValue, MetricError> {
    if single_column {
        let value = per_column.first().copied().unwrap_or(f64::NAN);
        return Ok(MetricValue::Scalar(round_to(value, decimal)));
    }
    match mode {
        MultiOutput::RawValues => Ok(MetricValue::Vector(
            per_column.iter().map(|&v| round_to(v, decimal)).collect(),
        )),
        MultiOutput::Mean => {
            let mean = per_column.iter().sum::<f64>() / per_column.len() as f64;
            Ok(MetricValue::Scalar(round_to(mean, decimal)))
        }
        MultiOutput::Weights(weights) => {
            if weights.len() != per_column.len() {
                return Err(MetricError::InvalidValue(format!(
                    "multi_output weights must have {} entries, but had {}",
                    per_column.len(),
                    weights.len()
                )));
            }
            let total: f64 = weights.iter().sum();
            if total == 0.0 {
                return Err(MetricError::InvalidValue("multi_output weights must not sum to zero".to_string()));
            }
            let weighted: f64 = per_column.iter().zip(weights).map(|(v, w)| v * w).sum();
            Ok(MetricValue::Scalar(round_to(weighted / total, decimal)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_is_scalar() {
        let result = aggregate(&[0.123456], true, &MultiOutput::RawValues, 3).unwrap();
        assert_eq!(result, MetricValue::Scalar(0.123));
    }

    #[test]
    fn test_raw_values() {
        let result = aggregate(&[0.5, 0.25], false, &MultiOutput::RawValues, 5).unwrap();
        assert_eq!(result, MetricValue::Vector(vec![0.5, 0.25]));
    }

    #[test]
    fn test_mean() {
        let result = aggregate(&[1.0, 2.0, 6.0], false, &MultiOutput::Mean, 5).unwrap();
        assert_eq!(result.as_scalar(), Some(3.0));
    }

    #[test]
    fn test_weights_normalized_by_sum() {
        let result = aggregate(&[1.0, 3.0], false, &MultiOutput::Weights(vec![3.0, 1.0]), 5).unwrap();
        assert_eq!(result.as_scalar(), Some(1.5));
    }

    #[test]
    fn test_weights_length_mismatch() {
        let result = aggregate(&[1.0, 3.0], false, &MultiOutput::Weights(vec![1.0]), 5);
        assert!(matches!(result, Err(MetricError::InvalidValue(_))));
    }

    #[test]
    fn test_multi_output_from_json() {
        let mode: MultiOutput = serde_json::from_str(r#"{"weights":[0.2,0.8]}"#).unwrap();
        assert_eq!(mode, MultiOutput::Weights(vec![0.2, 0.8]));
        let mode: MultiOutput = serde_json::from_str(r#""raw_values""#).unwrap();
        assert_eq!(mode, MultiOutput::RawValues);
    }
}
