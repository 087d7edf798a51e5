//! Per-column regression formulas.
//!
//! Every kernel receives one filtered output column and returns its unrounded
//! score. Multi-output evaluation simply runs the kernel once per column.

use crate::{
    error::MetricError,
    util::{self, EPSILON},
};

use super::histogram::{binned_distributions, cross_entropy, kl_divergence};

/// Metric-specific parameters resolved from the call options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KernelParams {
    /// Seasonal lag for MASE.
    pub m: usize,
    /// Denominator variant for NRMSE.
    pub model: u8,
    /// Lower clip before logarithms.
    pub epsilon: f64,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            m: 1,
            model: 0,
            epsilon: EPSILON,
        }
    }
}

pub(crate) type ColumnKernel = fn(&[f64], &[f64], &KernelParams) -> Result<f64, MetricError>;
pub(crate) type ElementKernel = fn(f64, f64) -> f64;

fn squared_errors(t: &[f64], p: &[f64]) -> f64 {
    t.iter().zip(p).map(|(a, b)| (b - a) * (b - a)).sum()
}

fn absolute_errors<'a>(t: &'a [f64], p: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
    t.iter().zip(p).map(|(a, b)| (b - a).abs())
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / n as f64
}

fn pearson(t: &[f64], p: &[f64]) -> f64 {
    let (mt, mp) = (util::mean(t), util::mean(p));
    let numerator: f64 = t.iter().zip(p).map(|(a, b)| (a - mt) * (b - mp)).sum();
    let st = t.iter().map(|a| (a - mt) * (a - mt)).sum::<f64>().sqrt();
    let sp = p.iter().map(|b| (b - mp) * (b - mp)).sum::<f64>().sqrt();
    numerator / (st * sp)
}

fn willmott(t: &[f64], p: &[f64]) -> f64 {
    let m = util::mean(t);
    let denominator: f64 = t
        .iter()
        .zip(p)
        .map(|(a, b)| {
            let d = (b - m).abs() + (a - m).abs();
            d * d
        })
        .sum();
    1.0 - squared_errors(t, p) / denominator
}

fn explained_variance_ratio(t: &[f64], p: &[f64]) -> f64 {
    1.0 - util::variance(&util::diff(t, p)) / util::variance(t)
}

pub(crate) fn explained_variance(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(explained_variance_ratio(t, p))
}

pub(crate) fn max_error(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(absolute_errors(t, p).fold(f64::NEG_INFINITY, f64::max))
}

pub(crate) fn mae(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(absolute_errors(t, p)))
}

pub(crate) fn mse(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(squared_errors(t, p) / t.len() as f64)
}

pub(crate) fn rmse(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok((squared_errors(t, p) / t.len() as f64).sqrt())
}

pub(crate) fn msle(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(t.iter().zip(p).map(|(a, b)| (a / b).ln().powi(2))))
}

pub(crate) fn median_absolute_error(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(util::median(&absolute_errors(t, p).collect::<Vec<_>>()))
}

pub(crate) fn mre(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(t.iter().zip(p).map(|(a, b)| (a - b).abs() / a)))
}

pub(crate) fn mape(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(t.iter().zip(p).map(|(a, b)| (a - b).abs() / a.abs())))
}

pub(crate) fn smape(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(t.iter().zip(p).map(|(a, b)| 2.0 * (b - a).abs() / (a.abs() + b.abs()))))
}

pub(crate) fn maape(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(mean_of(t.iter().zip(p).map(|(a, b)| ((a - b) / a).abs().atan())))
}

pub(crate) fn mase(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    let m = params.m;
    if m == 0 || m >= t.len() {
        return Err(MetricError::InvalidValue(format!(
            "MASE lag m must be in 1..{}, but was {}",
            t.len(),
            m
        )));
    }
    let naive = mean_of(t[m..].iter().zip(&t[..t.len() - m]).map(|(a, b)| (a - b).abs()));
    Ok(mean_of(absolute_errors(t, p)) / naive)
}

pub(crate) fn nse(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let m = util::mean(t);
    let total: f64 = t.iter().map(|a| (a - m) * (a - m)).sum();
    Ok(1.0 - squared_errors(t, p) / total)
}

pub(crate) fn willmott_index(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(willmott(t, p))
}

pub(crate) fn pearson_r(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(pearson(t, p))
}

pub(crate) fn pearson_r_squared(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(pearson(t, p).powi(2))
}

pub(crate) fn confidence_index(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(pearson(t, p) * willmott(t, p))
}

pub(crate) fn deviation_of_runoff_volume(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(util::sum(p) / util::sum(t))
}

pub(crate) fn kling_gupta(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let r = pearson(t, p);
    let (mt, mp) = (util::mean(t), util::mean(p));
    let beta = mp / mt;
    let gamma = (util::std_dev(p) / mp) / (util::std_dev(t) / mt);
    Ok(1.0 - ((r - 1.0).powi(2) + (beta - 1.0).powi(2) + (gamma - 1.0).powi(2)).sqrt())
}

/// Lorenz-curve integral of the truth share accumulated in descending prediction order.
pub(crate) fn gini(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let n = t.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p[b].total_cmp(&p[a]));
    let total_losses = util::sum(t);
    let population_delta = 1.0 / n as f64;
    let (mut accumulated_loss, mut accumulated_population, mut score) = (0.0, 0.0, 0.0);
    for &i in &order {
        accumulated_loss += t[i] / total_losses;
        accumulated_population += population_delta;
        score += accumulated_loss - accumulated_population;
    }
    Ok(score / n as f64)
}

/// Mean absolute pairwise difference of the concatenated series, over twice its mean. O(N^2).
pub(crate) fn gini_wiki(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let y: Vec<f64> = t.iter().chain(p).copied().collect();
    let n = y.len() as f64;
    let mut score = 0.0;
    for a in &y {
        for b in &y {
            score += (a - b).abs();
        }
    }
    Ok(score / (2.0 * n * n * util::mean(&y)))
}

pub(crate) fn change_in_direction(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let matches = t
        .windows(2)
        .zip(p.windows(2))
        .map(|(a, b)| if util::sign(a[1] - a[0]) == util::sign(b[1] - b[0]) { 1.0 } else { 0.0 });
    Ok(mean_of(matches))
}

pub(crate) fn entropy(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    Ok(-t.iter().zip(p).map(|(a, b)| a * b.max(params.epsilon).ln()).sum::<f64>())
}

pub(crate) fn binned_cross_entropy(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    let dist = binned_distributions(t, p);
    Ok(cross_entropy(&dist.f_true, &dist.f_pred, params.epsilon))
}

pub(crate) fn binned_kl_divergence(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    let dist = binned_distributions(t, p);
    Ok(kl_divergence(&dist.f_true, &dist.f_pred, params.epsilon))
}

pub(crate) fn binned_js_divergence(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    let dist = binned_distributions(t, p);
    let m: Vec<f64> = dist.f_true.iter().zip(&dist.f_pred).map(|(a, b)| 0.5 * (a + b)).collect();
    Ok(0.5 * kl_divergence(&dist.f_true, &m, params.epsilon) + 0.5 * kl_divergence(&dist.f_pred, &m, params.epsilon))
}

pub(crate) fn variance_accounted_for(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(explained_variance_ratio(t, p) * 100.0)
}

pub(crate) fn relative_absolute_error(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let denominator = t.iter().map(|a| a * a).sum::<f64>().sqrt();
    Ok(squared_errors(t, p).sqrt() / denominator)
}

fn ratio_within(t: &[f64], p: &[f64], lower: f64, upper: f64) -> f64 {
    mean_of(t.iter().zip(p).map(|(a, b)| {
        let div = a / b;
        if div >= lower && div <= upper {
            1.0
        } else {
            0.0
        }
    }))
}

pub(crate) fn a10(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(ratio_within(t, p, 0.9, 1.1))
}

pub(crate) fn a20(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    Ok(ratio_within(t, p, 0.8, 1.2))
}

pub(crate) fn nrmse(t: &[f64], p: &[f64], params: &KernelParams) -> Result<f64, MetricError> {
    let rmse = (squared_errors(t, p) / t.len() as f64).sqrt();
    match params.model {
        0 => Ok(rmse / util::std_dev(p)),
        1 => Ok(rmse / util::mean(p)),
        2 => Ok(rmse / (util::max(t) - util::min(t))),
        3 => Ok(mean_of(t.iter().zip(p).map(|(a, b)| ((b + 1.0) / (a + 1.0)).ln().powi(2))).sqrt()),
        other => Err(MetricError::InvalidValue(format!(
            "NRMSE model must be one of 0, 1, 2, 3, but was {}",
            other
        ))),
    }
}

pub(crate) fn residual_standard_error(t: &[f64], p: &[f64], _: &KernelParams) -> Result<f64, MetricError> {
    let ratio: Vec<f64> = t.iter().zip(p).map(|(a, b)| a / b).collect();
    let (mp, mr) = (util::mean(p), util::mean(&ratio));
    let up = p.iter().zip(&ratio).map(|(b, r)| (b - mp) * (r - mr)).sum::<f64>().powi(2);
    let down = p.iter().map(|b| (b - mp) * (b - mp)).sum::<f64>() * ratio.iter().map(|r| (r - mr) * (r - mr)).sum::<f64>();
    Ok(up / down)
}

pub(crate) fn single_relative_error(t: f64, p: f64) -> f64 {
    p / t - 1.0
}

pub(crate) fn single_absolute_error(t: f64, p: f64) -> f64 {
    t.abs() - p.abs()
}

pub(crate) fn single_squared_error(t: f64, p: f64) -> f64 {
    (t - p) * (t - p)
}

pub(crate) fn single_squared_log_error(t: f64, p: f64) -> f64 {
    (t.ln() - p.ln()).powi(2)
}
