use serde::{Deserialize, Serialize};

use super::aggregate::MultiOutput;

/// Per-call options accepted by every metric.
///
/// Options a metric does not use are ignored. `None` means the metric's own
/// default (for `clean`/`positive_only`) or the evaluator's setting (for `decimal`).
/// Option dictionaries can be read from JSON:
///
/// ```
/// let opts: evalkit::MetricOptions = serde_json::from_str(r#"{"model": 2, "clean": false}"#).unwrap();
/// assert_eq!(opts.model, Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricOptions {
    pub multi_output: Option<MultiOutput>,
    pub decimal: Option<i32>,
    pub clean: Option<bool>,
    pub positive_only: Option<bool>,
    /// Dunn index: track only the needed distances instead of the full distance matrix.
    pub use_modified: Option<bool>,
    /// Ksq-DetW index: min-max scale the features first.
    pub use_normalized: Option<bool>,
    /// NRMSE denominator variant, 0 to 3.
    pub model: Option<u8>,
    /// MASE seasonal lag.
    pub m: Option<usize>,
    /// Silhouette index: return per-sample values instead of the mean. When
    /// unset, `multi_output: raw_values` requests the same thing.
    pub per_sample: Option<bool>,
}

impl MetricOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multi_output(mut self, multi_output: MultiOutput) -> Self {
        self.multi_output = Some(multi_output);
        self
    }

    pub fn decimal(mut self, decimal: i32) -> Self {
        self.decimal = Some(decimal);
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = Some(clean);
        self
    }

    pub fn positive_only(mut self, positive_only: bool) -> Self {
        self.positive_only = Some(positive_only);
        self
    }

    pub fn use_modified(mut self, use_modified: bool) -> Self {
        self.use_modified = Some(use_modified);
        self
    }

    pub fn use_normalized(mut self, use_normalized: bool) -> Self {
        self.use_normalized = Some(use_normalized);
        self
    }

    pub fn model(mut self, model: u8) -> Self {
        self.model = Some(model);
        self
    }

    pub fn m(mut self, m: usize) -> Self {
        self.m = Some(m);
        self
    }

    pub fn per_sample(mut self, per_sample: bool) -> Self {
        self.per_sample = Some(per_sample);
        self
    }
}
