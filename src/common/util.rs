/// Lower clip applied before taking logarithms of probabilities.
pub const EPSILON: f64 = 1e-10;

/// Rounds half to even at `decimal` fractional digits. Non-finite values pass through.
pub fn round_to(value: f64, decimal: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimal as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

pub(crate) fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean; NaN for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

/// Population variance (ddof = 0).
pub(crate) fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median with midpoint interpolation for even lengths.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

pub(crate) fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub(crate) fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Element-wise difference `a - b`.
pub(crate) fn diff(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Sign as -1, 0 or 1, matching the convention where zero has its own sign.
pub(crate) fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Shannon entropy of a probability vector in the given base, skipping zero entries.
pub(crate) fn shannon_entropy(probabilities: &[f64], base: f64) -> f64 {
    let sum: f64 = probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.log(base))
        .sum();
    // -0.0 when every probability is 0 or 1
    if sum == 0.0 {
        0.0
    } else {
        -sum
    }
}
