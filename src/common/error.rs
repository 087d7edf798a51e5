use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Degenerate metric: {0}")]
    DegenerateMetric(String),
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}
