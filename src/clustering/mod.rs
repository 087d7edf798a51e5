use std::collections::BTreeMap;

use log::info;

use crate::{
    aggregate::{MetricValue, MultiOutput},
    context::EvaluationContext,
    error::MetricError,
    matrix::DenseMatrix,
    options::MetricOptions,
    util::round_to,
};

use catalog::Formula;
use external::ExternalInput;
use internal::{InternalInput, InternalParams};
use prepare::{prepare_clustering_external, prepare_clustering_internal};

pub mod catalog;
mod external;
mod internal;
pub mod pairwise;
pub mod prepare;

pub use catalog::{ClusteringKind, Direction, MetricDescriptor};

/// Per-call overrides of the evaluator's stored data.
#[derive(Debug)]
pub struct ClusteringInputs<'a, L> {
    pub y_true: Option<&'a [L]>,
    pub y_pred: Option<&'a [L]>,
    pub x: Option<&'a DenseMatrix>,
}

impl<L> Clone for ClusteringInputs<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for ClusteringInputs<'_, L> {}

impl<L> Default for ClusteringInputs<'_, L> {
    fn default() -> Self {
        Self {
            y_true: None,
            y_pred: None,
            x: None,
        }
    }
}

impl<'a, L> ClusteringInputs<'a, L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn y_true(mut self, y_true: &'a [L]) -> Self {
        self.y_true = Some(y_true);
        self
    }

    pub fn y_pred(mut self, y_pred: &'a [L]) -> Self {
        self.y_pred = Some(y_pred);
        self
    }

    pub fn x(mut self, x: &'a DenseMatrix) -> Self {
        self.x = Some(x);
        self
    }
}

pub struct ClusteringMetricBuilder<L> {
    y_true: Option<Vec<L>>,
    y_pred: Option<Vec<L>>,
    x: Option<DenseMatrix>,
    decimal: i32,
    raise_error: bool,
    biggest_value: f64,
    smallest_value: f64,
}

impl<L: Ord + Clone> ClusteringMetricBuilder<L> {
    pub fn new() -> Self {
        let defaults = EvaluationContext::default();
        Self {
            y_true: None,
            y_pred: None,
            x: None,
            decimal: defaults.decimal as i32,
            raise_error: defaults.raise_error,
            biggest_value: defaults.biggest_value,
            smallest_value: defaults.smallest_value,
        }
    }

    pub fn y_true(mut self, y_true: Vec<L>) -> Self {
        self.y_true = Some(y_true);
        self
    }

    pub fn y_pred(mut self, y_pred: Vec<L>) -> Self {
        self.y_pred = Some(y_pred);
        self
    }

    pub fn x(mut self, x: impl Into<DenseMatrix>) -> Self {
        self.x = Some(x.into());
        self
    }

    pub fn decimal(mut self, decimal: i32) -> Self {
        self.decimal = decimal;
        self
    }

    pub fn raise_error(mut self, raise_error: bool) -> Self {
        self.raise_error = raise_error;
        self
    }

    pub fn biggest_value(mut self, biggest_value: f64) -> Self {
        self.biggest_value = biggest_value;
        self
    }

    pub fn smallest_value(mut self, smallest_value: f64) -> Self {
        self.smallest_value = smallest_value;
        self
    }

    fn validate(&self) -> Result<(), MetricError> {
        if self.decimal < 0 {
            return Err(MetricError::ConfigError(format!(
                "decimal must be a non-negative integer, but was {}",
                self.decimal
            )));
        }
        if self.biggest_value.is_nan() || self.smallest_value.is_nan() {
            return Err(MetricError::ConfigError("Sentinel values must not be NaN".to_string()));
        }
        if self.smallest_value > self.biggest_value {
            return Err(MetricError::ConfigError(format!(
                "smallest_value {} is greater than biggest_value {}",
                self.smallest_value, self.biggest_value
            )));
        }
        Ok(())
    }

    pub fn build(self) -> Result<ClusteringMetric<L>, MetricError> {
        self.validate()?;
        Ok(ClusteringMetric {
            y_true: self.y_true,
            y_pred: self.y_pred,
            x: self.x,
            context: EvaluationContext {
                decimal: self.decimal as u32,
                raise_error: self.raise_error,
                biggest_value: self.biggest_value,
                smallest_value: self.smallest_value,
            },
        })
    }
}

impl<L: Ord + Clone> Default for ClusteringMetricBuilder<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates internal and external clustering metrics by name.
///
/// ```
/// use evalkit::{ClusteringMetric, MetricOptions};
///
/// let metric = ClusteringMetric::builder()
///     .y_true(vec![0, 0, 1, 1])
///     .y_pred(vec![1, 1, 0, 0])
///     .build()
///     .unwrap();
/// let rand = metric.evaluate("RaS", &MetricOptions::new()).unwrap();
/// assert_eq!(rand.as_scalar(), Some(1.0));
/// ```
#[derive(Clone, Debug)]
pub struct ClusteringMetric<L = i64> {
    y_true: Option<Vec<L>>,
    y_pred: Option<Vec<L>>,
    x: Option<DenseMatrix>,
    context: EvaluationContext,
}

impl<L: Ord + Clone> ClusteringMetric<L> {
    pub fn builder() -> ClusteringMetricBuilder<L> {
        ClusteringMetricBuilder::new()
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Describes one metric by its code.
    pub fn get_support(code: &str) -> Result<MetricDescriptor, MetricError> {
        ClusteringKind::ALL
            .iter()
            .find(|kind| kind.code() == code)
            .map(|kind| kind.descriptor())
            .ok_or_else(|| MetricError::UnknownMetric(format!("ClusteringMetric doesn't support metric named: {}", code)))
    }

    /// Describes every metric, keyed by code.
    pub fn get_support_all() -> BTreeMap<&'static str, MetricDescriptor> {
        ClusteringKind::ALL
            .iter()
            .map(|kind| (kind.code(), kind.descriptor()))
            .collect()
    }

    /// Evaluates the metric `name` on the stored data.
    pub fn evaluate(&self, name: &str, options: &MetricOptions) -> Result<MetricValue, MetricError> {
        self.evaluate_with(name, ClusteringInputs::default(), options)
    }

    /// Evaluates the metric `name`, preferring `inputs` over the stored data.
    pub fn evaluate_with(
        &self,
        name: &str,
        inputs: ClusteringInputs<L>,
        options: &MetricOptions,
    ) -> Result<MetricValue, MetricError> {
        let kind = ClusteringKind::from_name(name)?;
        self.score(kind, inputs, options)
    }

    /// Evaluates a resolved metric kind.
    pub fn score(
        &self,
        kind: ClusteringKind,
        inputs: ClusteringInputs<L>,
        options: &MetricOptions,
    ) -> Result<MetricValue, MetricError> {
        let y_pred = inputs.y_pred.or(self.y_pred.as_deref());
        match kind.formula() {
            Formula::External(kernel) => {
                let y_true = inputs.y_true.or(self.y_true.as_deref());
                let prepared = prepare_clustering_external(y_true, y_pred, options.decimal, &self.context)?;
                let input = ExternalInput {
                    y_true: &prepared.y_true,
                    y_pred: &prepared.y_pred,
                    n_classes: prepared.n_classes,
                    n_clusters: prepared.n_clusters,
                };
                let value = kernel(&input, &self.context)?;
                Ok(MetricValue::Scalar(round_to(value, prepared.decimal)))
            }
            Formula::Internal(kernel) => {
                let x = inputs.x.or(self.x.as_ref());
                let prepared = prepare_clustering_internal(x, y_pred, options.decimal, &self.context)?;
                let input = InternalInput {
                    x: prepared.x,
                    labels: &prepared.labels,
                    n_clusters: prepared.n_clusters,
                };
                if kind == ClusteringKind::SilhouetteIndex && per_sample(options) {
                    let samples = internal::silhouette_samples(&input, &self.context)?;
                    return Ok(MetricValue::Vector(
                        samples.into_iter().map(|v| round_to(v, prepared.decimal)).collect(),
                    ));
                }
                let defaults = InternalParams::default();
                let params = InternalParams {
                    use_modified: options.use_modified.unwrap_or(defaults.use_modified),
                    use_normalized: options.use_normalized.unwrap_or(defaults.use_normalized),
                };
                let value = kernel(&input, &params, &self.context)?;
                Ok(MetricValue::Scalar(round_to(value, prepared.decimal)))
            }
        }
    }

    /// Evaluates several metrics on the stored data. `options`, when given, must
    /// hold one entry per name.
    pub fn get_metrics_by_list_names(
        &self,
        names: &[&str],
        options: Option<&[MetricOptions]>,
    ) -> Result<BTreeMap<String, MetricValue>, MetricError> {
        if let Some(opts) = options {
            if opts.len() != names.len() {
                return Err(MetricError::InvalidValue(format!(
                    "{} metric names but {} option entries were given",
                    names.len(),
                    opts.len()
                )));
            }
        }
        let default = MetricOptions::default();
        let mut results = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            let opts = options.map_or(&default, |o| &o[i]);
            results.insert(name.to_string(), self.evaluate(name, opts)?);
        }
        info!("Evaluated {} clustering metrics", results.len());
        Ok(results)
    }

    /// Evaluates every metric in `metrics` with its own options.
    pub fn get_metrics_by_dict(
        &self,
        metrics: &BTreeMap<String, MetricOptions>,
    ) -> Result<BTreeMap<String, MetricValue>, MetricError> {
        let mut results = BTreeMap::new();
        for (name, opts) in metrics {
            results.insert(name.clone(), self.evaluate(name, opts)?);
        }
        info!("Evaluated {} clustering metrics", results.len());
        Ok(results)
    }
}

/// Silhouette per-sample output, requested by `per_sample` or by `multi_output`
/// set to raw values.
fn per_sample(options: &MetricOptions) -> bool {
    options
        .per_sample
        .unwrap_or(matches!(options.multi_output, Some(MultiOutput::RawValues)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external(y_true: Vec<i64>, y_pred: Vec<i64>) -> ClusteringMetric {
        ClusteringMetric::builder().y_true(y_true).y_pred(y_pred).build().unwrap()
    }

    fn scalar(metric: &ClusteringMetric, name: &str) -> f64 {
        metric.evaluate(name, &MetricOptions::new()).unwrap().as_scalar().unwrap()
    }

    #[test]
    fn test_relabelled_perfect_agreement() {
        let metric = external(vec![0, 0, 1, 1], vec![1, 1, 0, 0]);
        for name in ["RaS", "FMS", "HS", "CS", "VMS", "PrS", "ReS", "FmS", "JS", "PuS", "NMIS", "HGS", "TS"] {
            assert_eq!(scalar(&metric, name), 1.0, "{}", name);
        }
        assert_eq!(scalar(&metric, "ES"), 0.0);
        assert_eq!(scalar(&metric, "MIS"), 0.69315);
    }

    #[test]
    fn test_identical_labelings() {
        let metric = external(vec![0, 0, 1, 1], vec![0, 0, 1, 1]);
        assert_eq!(scalar(&metric, "RaS"), 1.0);
        assert_eq!(scalar(&metric, "PuS"), 1.0);
        let entropy = scalar(&metric, "ES");
        assert_eq!(entropy, 0.0);
        assert!(entropy.is_sign_positive());
        let json = serde_json::to_string(&metric.evaluate("ES", &MetricOptions::new()).unwrap()).unwrap();
        assert!(!json.contains('-'));
    }

    #[test]
    fn test_string_labels() {
        let metric: ClusteringMetric<&str> = ClusteringMetric::builder()
            .y_true(vec!["cat", "cat", "dog", "dog"])
            .y_pred(vec!["a", "b", "b", "b"])
            .build()
            .unwrap();
        let precision = metric.evaluate("precision_score", &MetricOptions::new()).unwrap();
        // yy=1, ny=2
        assert_eq!(precision.as_scalar(), Some(0.33333));
    }

    #[test]
    fn test_single_cluster_hubert_gamma() {
        let metric = external(vec![0, 1, 0, 1], vec![0, 0, 0, 0]);
        assert_eq!(scalar(&metric, "HGS"), f64::NEG_INFINITY);

        let strict: ClusteringMetric = ClusteringMetric::builder()
            .y_true(vec![0, 1, 0, 1])
            .y_pred(vec![0, 0, 0, 0])
            .raise_error(true)
            .build()
            .unwrap();
        assert!(matches!(
            strict.evaluate("HGS", &MetricOptions::new()),
            Err(MetricError::DegenerateMetric(_))
        ));

        let custom: ClusteringMetric = ClusteringMetric::builder()
            .y_true(vec![0, 1, 0, 1])
            .y_pred(vec![0, 0, 0, 0])
            .smallest_value(-10.0)
            .build()
            .unwrap();
        assert_eq!(scalar(&custom, "PhS"), -10.0);
    }

    #[test]
    fn test_internal_metrics() {
        let x = DenseMatrix::new(6, 2, &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 10.0, 10.0, 10.0, 11.0, 11.0, 10.0]);
        let metric: ClusteringMetric = ClusteringMetric::builder()
            .x(x)
            .y_pred(vec![7, 7, 7, 3, 3, 3])
            .build()
            .unwrap();
        assert_eq!(scalar(&metric, "CHI"), 450.0);
        assert_eq!(scalar(&metric, "SSEI"), 2.66667);
        assert_eq!(scalar(&metric, "BHI"), 0.44444);
        assert_eq!(scalar(&metric, "DI"), 9.51315);

        let dunn_brute = metric
            .evaluate("DI", &MetricOptions::new().use_modified(false))
            .unwrap();
        assert_eq!(dunn_brute.as_scalar(), Some(9.51315));

        let per_sample = metric
            .evaluate("SI", &MetricOptions::new().per_sample(true))
            .unwrap();
        assert_eq!(per_sample.as_vector().map(|v| v.len()), Some(6));

        let raw_values = metric
            .evaluate("SI", &MetricOptions::new().multi_output(MultiOutput::RawValues))
            .unwrap();
        assert_eq!(raw_values, per_sample);
        let mean = metric
            .evaluate("SI", &MetricOptions::new().multi_output(MultiOutput::Mean))
            .unwrap();
        assert!(mean.as_scalar().is_some());
    }

    #[test]
    fn test_missing_inputs() {
        let metric: ClusteringMetric = ClusteringMetric::builder().y_pred(vec![0, 1]).build().unwrap();
        assert!(matches!(
            metric.evaluate("RaS", &MetricOptions::new()),
            Err(MetricError::MissingInput(_))
        ));
        assert!(matches!(
            metric.evaluate("BHI", &MetricOptions::new()),
            Err(MetricError::MissingInput(_))
        ));
    }

    #[test]
    fn test_evaluate_with_overrides() {
        let metric: ClusteringMetric = ClusteringMetric::builder().build().unwrap();
        let t: [i64; 5] = [0, 0, 1, 1, 2];
        let p: [i64; 5] = [0, 0, 1, 2, 2];
        let inputs = ClusteringInputs::new().y_true(&t).y_pred(&p);
        let jaccard = metric.evaluate_with("JS", inputs, &MetricOptions::new().decimal(3)).unwrap();
        // yy=1, yn=1, ny=1
        assert_eq!(jaccard.as_scalar(), Some(0.333));

        let short: [i64; 3] = [0, 0, 1];
        let inputs = ClusteringInputs::new().y_true(&t).y_pred(&short);
        assert!(matches!(
            metric.evaluate_with("JS", inputs, &MetricOptions::new()),
            Err(MetricError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_builder_validation() {
        let result = ClusteringMetric::<i64>::builder()
            .biggest_value(-1.0)
            .smallest_value(1.0)
            .build();
        assert!(matches!(result, Err(MetricError::ConfigError(_))));
    }

    #[test]
    fn test_support() {
        let chi = ClusteringMetric::<i64>::get_support("CHI").unwrap();
        assert_eq!(chi.direction, Direction::Max);
        assert!(matches!(
            ClusteringMetric::<i64>::get_support("chi"),
            Err(MetricError::UnknownMetric(_))
        ));
        assert_eq!(ClusteringMetric::<i64>::get_support_all().len(), ClusteringKind::ALL.len());
    }

    #[test]
    fn test_batch() {
        let metric = external(vec![0, 0, 1, 1], vec![0, 0, 1, 1]);
        let results = metric.get_metrics_by_list_names(&["RaS", "JS"], None).unwrap();
        assert_eq!(results["RaS"].as_scalar(), Some(1.0));

        let mut request = BTreeMap::new();
        request.insert("MIS".to_string(), MetricOptions::new().decimal(2));
        let results = metric.get_metrics_by_dict(&request).unwrap();
        assert_eq!(results["MIS"].as_scalar(), Some(0.69));

        let opts = [MetricOptions::new()];
        let result = metric.get_metrics_by_list_names(&["RaS", "JS"], Some(&opts[..]));
        assert!(matches!(result, Err(MetricError::InvalidValue(_))));
    }
}
