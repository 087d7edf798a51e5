use log::warn;

use super::error::MetricError;

/// Settings shared by every metric call of one evaluator.
///
/// `biggest_value`/`smallest_value` are substituted for metrics that are
/// mathematically undefined on the given input when `raise_error` is false.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationContext {
    pub decimal: u32,
    pub raise_error: bool,
    pub biggest_value: f64,
    pub smallest_value: f64,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            decimal: 5,
            raise_error: false,
            biggest_value: f64::INFINITY,
            smallest_value: f64::NEG_INFINITY,
        }
    }
}

impl EvaluationContext {
    /// Resolves a per-call decimal override against the context default.
    pub fn resolve_decimal(&self, decimal: Option<i32>) -> Result<u32, MetricError> {
        match decimal {
            None => Ok(self.decimal),
            Some(d) if d < 0 => Err(MetricError::InvalidValue(format!(
                "decimal must be a non-negative integer, but was {}",
                d
            ))),
            Some(d) => Ok(d as u32),
        }
    }

    /// Either fails with a degenerate-metric error or returns `value`, depending on `raise_error`.
    pub fn fallback(&self, message: &str, value: f64) -> Result<f64, MetricError> {
        if self.raise_error {
            return Err(MetricError::DegenerateMetric(message.to_string()));
        }
        warn!("{} Returning {} instead.", message, value);
        Ok(value)
    }
}
