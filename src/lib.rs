pub mod clustering;
pub mod common;
pub mod regression;

pub use common::{aggregate, context, encoder, error, matrix, options};
pub(crate) use common::util;

pub use aggregate::{MetricValue, MultiOutput};
pub use clustering::{ClusteringInputs, ClusteringKind, ClusteringMetric, ClusteringMetricBuilder, MetricDescriptor};
pub use context::EvaluationContext;
pub use error::MetricError;
pub use options::MetricOptions;
pub use regression::{RegressionInputs, RegressionKind, RegressionMetric, RegressionMetricBuilder};
pub use util::{round_to, EPSILON};
