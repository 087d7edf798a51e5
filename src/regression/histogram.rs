use crate::util;

/// Probability mass of the true and predicted values over a shared set of bins.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BinnedDistributions {
    pub f_true: Vec<f64>,
    pub f_pred: Vec<f64>,
}

/// Bins both series into `K - 1` equal-width bins laid over the true values,
/// where `K` is the number of distinct true values (at least one bin). The outer
/// edges are widened to cover both series.
pub(crate) fn binned_distributions(y_true: &[f64], y_pred: &[f64]) -> BinnedDistributions {
    let edges = bin_edges(y_true, y_pred);
    let f_true = to_probabilities(&histogram(y_true, &edges), y_true.len());
    let f_pred = to_probabilities(&histogram(y_pred, &edges), y_pred.len());
    BinnedDistributions { f_true, f_pred }
}

fn bin_edges(y_true: &[f64], y_pred: &[f64]) -> Vec<f64> {
    let mut distinct = y_true.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    let bins = distinct.len().saturating_sub(1).max(1);

    let (mut lo, mut hi) = (util::min(y_true), util::max(y_true));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    edges[0] = util::min(y_true).min(util::min(y_pred));
    edges[bins] = util::max(y_true).max(util::max(y_pred));
    edges
}

/// Counts values per bin. Bins are half-open except the last, which includes its right edge.
/// Values outside the edges are ignored.
pub(crate) fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len() - 1;
    let mut counts = vec![0usize; bins];
    let (first, last) = (edges[0], edges[bins]);
    for &v in values {
        if v < first || v > last || v.is_nan() {
            continue;
        }
        let b = if v == last {
            bins - 1
        } else {
            edges.partition_point(|&e| e <= v) - 1
        };
        counts[b.min(bins - 1)] += 1;
    }
    counts
}

fn to_probabilities(counts: &[usize], total: usize) -> Vec<f64> {
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

/// `-sum(p * ln(max(q, epsilon)))` over entries where both `p` and `q` are strictly positive.
pub(crate) fn cross_entropy(p: &[f64], q: &[f64], epsilon: f64) -> f64 {
    -p.iter()
        .zip(q)
        .filter(|&(&a, &b)| a > 0.0 && b > 0.0)
        .map(|(&a, &b)| a * b.max(epsilon).ln())
        .sum::<f64>()
}

/// `CE(p, q) - CE(p, p)`.
pub(crate) fn kl_divergence(p: &[f64], q: &[f64], epsilon: f64) -> f64 {
    cross_entropy(p, q, epsilon) - cross_entropy(p, p, epsilon)
}
