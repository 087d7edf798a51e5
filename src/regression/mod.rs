use std::collections::BTreeMap;

use log::info;

use crate::{
    aggregate::{aggregate, MetricValue},
    context::EvaluationContext,
    error::MetricError,
    matrix::DenseMatrix,
    options::MetricOptions,
    util::{round_to, EPSILON},
};

use catalog::Formula;
use kernels::KernelParams;
use prepare::prepare_regression;

pub mod catalog;
mod histogram;
mod kernels;
pub mod prepare;

pub use catalog::RegressionKind;

const MISSING_INPUT: &str = "You need to pass y_true and y_pred to object creation or function called.";

/// Per-call overrides of the evaluator's stored data.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegressionInputs<'a> {
    pub y_true: Option<&'a DenseMatrix>,
    pub y_pred: Option<&'a DenseMatrix>,
}

impl<'a> RegressionInputs<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn y_true(mut self, y_true: &'a DenseMatrix) -> Self {
        self.y_true = Some(y_true);
        self
    }

    pub fn y_pred(mut self, y_pred: &'a DenseMatrix) -> Self {
        self.y_pred = Some(y_pred);
        self
    }
}

pub struct RegressionMetricBuilder {
    y_true: Option<DenseMatrix>,
    y_pred: Option<DenseMatrix>,
    decimal: i32,
}

impl RegressionMetricBuilder {
    pub fn new() -> Self {
        Self {
            y_true: None,
            y_pred: None,
            decimal: 5,
        }
    }

    pub fn y_true(mut self, y_true: impl Into<DenseMatrix>) -> Self {
        self.y_true = Some(y_true.into());
        self
    }

    pub fn y_pred(mut self, y_pred: impl Into<DenseMatrix>) -> Self {
        self.y_pred = Some(y_pred.into());
        self
    }

    pub fn decimal(mut self, decimal: i32) -> Self {
        self.decimal = decimal;
        self
    }

    fn validate(&self) -> Result<(), MetricError> {
        if self.decimal < 0 {
            return Err(MetricError::ConfigError(format!(
                "decimal must be a non-negative integer, but was {}",
                self.decimal
            )));
        }
        if self.y_true.is_some() != self.y_pred.is_some() {
            return Err(MetricError::ConfigError(
                "y_true and y_pred must be supplied together".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build(self) -> Result<RegressionMetric, MetricError> {
        self.validate()?;
        Ok(RegressionMetric {
            y_true: self.y_true,
            y_pred: self.y_pred,
            context: EvaluationContext {
                decimal: self.decimal as u32,
                ..EvaluationContext::default()
            },
        })
    }
}

impl Default for RegressionMetricBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates regression and time-series metrics by name.
///
/// ```
/// use evalkit::{MetricOptions, RegressionMetric};
///
/// let metric = RegressionMetric::builder()
///     .y_true(vec![3.0, -0.5, 2.0, 7.0])
///     .y_pred(vec![2.5, 0.0, 2.0, 8.0])
///     .build()
///     .unwrap();
/// let mae = metric.evaluate("MAE", &MetricOptions::new()).unwrap();
/// assert_eq!(mae.as_scalar(), Some(0.5));
/// ```
#[derive(Clone, Debug)]
pub struct RegressionMetric {
    y_true: Option<DenseMatrix>,
    y_pred: Option<DenseMatrix>,
    context: EvaluationContext,
}

impl RegressionMetric {
    pub fn builder() -> RegressionMetricBuilder {
        RegressionMetricBuilder::new()
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Evaluates the metric `name` on the stored data.
    pub fn evaluate(&self, name: &str, options: &MetricOptions) -> Result<MetricValue, MetricError> {
        self.evaluate_with(name, RegressionInputs::default(), options)
    }

    /// Evaluates the metric `name`, preferring `inputs` over the stored data.
    pub fn evaluate_with(
        &self,
        name: &str,
        inputs: RegressionInputs,
        options: &MetricOptions,
    ) -> Result<MetricValue, MetricError> {
        let kind = RegressionKind::from_name(name)?;
        self.score(kind, inputs, options)
    }

    /// Evaluates a resolved metric kind.
    pub fn score(
        &self,
        kind: RegressionKind,
        inputs: RegressionInputs,
        options: &MetricOptions,
    ) -> Result<MetricValue, MetricError> {
        let (y_true, y_pred) = self.resolve(inputs)?;
        let (default_clean, default_positive) = kind.default_filters();
        let prepared = prepare_regression(
            y_true,
            y_pred,
            options.clean.unwrap_or(default_clean),
            options.decimal,
            options.positive_only.unwrap_or(default_positive),
            &self.context,
        )?;

        match kind.formula() {
            Formula::Column(kernel) => {
                let params = KernelParams {
                    m: options.m.unwrap_or(1),
                    model: options.model.unwrap_or(0),
                    epsilon: EPSILON,
                };
                let per_column = prepared
                    .columns
                    .iter()
                    .map(|c| kernel(&c.y_true, &c.y_pred, &params))
                    .collect::<Result<Vec<f64>, MetricError>>()?;
                let mode = options.multi_output.clone().unwrap_or_default();
                aggregate(&per_column, prepared.single_column, &mode, prepared.decimal)
            }
            Formula::Element(kernel) => {
                let mut columns: Vec<Vec<f64>> = prepared
                    .columns
                    .iter()
                    .map(|c| {
                        c.y_true
                            .iter()
                            .zip(&c.y_pred)
                            .map(|(&t, &p)| round_to(kernel(t, p), prepared.decimal))
                            .collect()
                    })
                    .collect();
                if prepared.single_column {
                    Ok(MetricValue::Vector(columns.remove(0)))
                } else {
                    Ok(MetricValue::Columns(columns))
                }
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
        info!("Evaluated {} regression metrics", results.len());
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
        info!("Evaluated {} regression metrics", results.len());
        Ok(results)
    }

    fn resolve<'a>(&'a self, inputs: RegressionInputs<'a>) -> Result<(&'a DenseMatrix, &'a DenseMatrix), MetricError> {
        let y_true = inputs.y_true.or(self.y_true.as_ref());
        let y_pred = inputs.y_pred.or(self.y_pred.as_ref());
        match (y_true, y_pred) {
            (Some(t), Some(p)) => Ok((t, p)),
            _ => Err(MetricError::MissingInput(MISSING_INPUT.to_string())),
        }
    }
}
