//! Scores comparing a predicted labeling against the ground truth.

use crate::{context::EvaluationContext, error::MetricError, util};

use super::pairwise::{contingency, cross_table, Contingency};

/// Encoded labelings handed to every external kernel.
pub(crate) struct ExternalInput<'a> {
    pub y_true: &'a [usize],
    pub y_pred: &'a [usize],
    pub n_classes: usize,
    pub n_clusters: usize,
}

impl ExternalInput<'_> {
    fn pairs(&self) -> Contingency {
        contingency(self.y_true, self.y_pred, false)
    }

    fn table(&self) -> Vec<Vec<usize>> {
        cross_table(self.y_true, self.y_pred, self.n_classes, self.n_clusters)
    }

    fn n(&self) -> f64 {
        self.y_true.len() as f64
    }
}

pub(crate) type ExternalKernel = fn(&ExternalInput, &EvaluationContext) -> Result<f64, MetricError>;

fn entropy_of_counts(counts: impl Iterator<Item = usize>, total: f64) -> f64 {
    let probs: Vec<f64> = counts.map(|c| c as f64 / total).collect();
    util::shannon_entropy(&probs, std::f64::consts::E)
}

fn class_totals(table: &[Vec<usize>]) -> Vec<usize> {
    table.iter().map(|row| row.iter().sum()).collect()
}

fn cluster_totals(table: &[Vec<usize>], n_clusters: usize) -> Vec<usize> {
    (0..n_clusters).map(|k| table.iter().map(|row| row[k]).sum()).collect()
}

fn mutual_information(table: &[Vec<usize>], n_clusters: usize, n: f64) -> f64 {
    let rows = class_totals(table);
    let cols = cluster_totals(table, n_clusters);
    let mut mi = 0.0;
    for (c, row) in table.iter().enumerate() {
        for (k, &count) in row.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let p_ij = count as f64 / n;
            let p_i = rows[c] as f64 / n;
            let p_j = cols[k] as f64 / n;
            mi += p_ij * (p_ij / (p_i * p_j)).ln();
        }
    }
    mi
}

/// `1 - H(A|B)/H(A)`, or 1 when `A` carries no entropy. `table[a][b]` counts co-occurrences.
fn homogeneity(table: &[Vec<usize>], n_b: usize, n: f64) -> f64 {
    let h_a = entropy_of_counts(class_totals(table).into_iter(), n);
    if h_a == 0.0 {
        return 1.0;
    }
    let b_totals = cluster_totals(table, n_b);
    let mut h_a_given_b = 0.0;
    for row in table {
        for (b, &count) in row.iter().enumerate() {
            if count == 0 {
                continue;
            }
            h_a_given_b -= (count as f64 / n) * (count as f64 / b_totals[b] as f64).ln();
        }
    }
    1.0 - h_a_given_b / h_a
}

fn transpose(table: &[Vec<usize>], n_cols: usize) -> Vec<Vec<usize>> {
    (0..n_cols).map(|k| table.iter().map(|row| row[k]).collect()).collect()
}

fn homogeneity_completeness(input: &ExternalInput) -> (f64, f64) {
    let table = input.table();
    let h = homogeneity(&table, input.n_clusters, input.n());
    let c = homogeneity(&transpose(&table, input.n_clusters), input.n_classes, input.n());
    (h, c)
}

pub(crate) fn mutual_info(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    Ok(mutual_information(&input.table(), input.n_clusters, input.n()))
}

pub(crate) fn normalized_mutual_info(input: &ExternalInput, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    let table = input.table();
    let n = input.n();
    let h_true = entropy_of_counts(class_totals(&table).into_iter(), n);
    let h_pred = entropy_of_counts(cluster_totals(&table, input.n_clusters).into_iter(), n);
    if h_true == 0.0 || h_pred == 0.0 {
        return ctx.fallback(
            "The Normalized Mutual Information score is undefined when either labeling has a single cluster.",
            0.0,
        );
    }
    Ok(2.0 * mutual_information(&table, input.n_clusters, n) / (h_true + h_pred))
}

pub(crate) fn rand_score(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok((c.yy + c.nn) / c.total())
}

pub(crate) fn fowlkes_mallows(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / ((c.yy + c.ny) * (c.yy + c.yn)).sqrt())
}

pub(crate) fn homogeneity_score(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    Ok(homogeneity_completeness(input).0)
}

pub(crate) fn completeness_score(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    Ok(homogeneity_completeness(input).1)
}

pub(crate) fn v_measure(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let (h, c) = homogeneity_completeness(input);
    if h + c == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * h * c / (h + c))
}

pub(crate) fn precision(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / (c.yy + c.ny))
}

pub(crate) fn recall(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / (c.yy + c.yn))
}

pub(crate) fn f_measure(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    let p = c.yy / (c.yy + c.ny);
    let r = c.yy / (c.yy + c.yn);
    Ok(2.0 * p * r / (p + r))
}

pub(crate) fn czekanowski_dice(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(2.0 * c.yy / (2.0 * c.yy + c.yn + c.ny))
}

pub(crate) fn hubert_gamma(input: &ExternalInput, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.n_clusters == 1 {
        return ctx.fallback(
            "The Hubert Gamma score is undefined when y_pred has only 1 cluster.",
            ctx.smallest_value,
        );
    }
    let c = contingency(input.y_true, input.y_pred, true);
    let numerator = c.total() * c.yy - (c.yy + c.yn) * (c.yy + c.ny);
    let denominator = ((c.yy + c.yn) * (c.yy + c.ny) * (c.nn + c.yn) * (c.nn + c.ny)).sqrt();
    Ok(numerator / denominator)
}

pub(crate) fn jaccard(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / (c.yy + c.yn + c.ny))
}

pub(crate) fn kulczynski(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(0.5 * (c.yy / (c.yy + c.ny) + c.yy / (c.yy + c.yn)))
}

pub(crate) fn mc_nemar(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok((c.nn - c.ny) / (c.nn + c.ny).sqrt())
}

pub(crate) fn phi(input: &ExternalInput, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.n_clusters == 1 {
        return ctx.fallback("The Phi score is undefined when y_pred has only 1 cluster.", ctx.smallest_value);
    }
    let c = contingency(input.y_true, input.y_pred, true);
    let numerator = c.yy * c.nn - c.yn * c.ny;
    let denominator = (c.yy + c.yn) * (c.yy + c.ny) * (c.yn + c.nn) * (c.ny + c.nn);
    Ok(numerator / denominator)
}

pub(crate) fn rogers_tanimoto(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok((c.yy + c.nn) / (c.yy + c.nn + 2.0 * (c.yn + c.ny)))
}

pub(crate) fn russel_rao(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / c.total())
}

pub(crate) fn sokal_sneath1(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(c.yy / (c.yy + 2.0 * (c.yn + c.ny)))
}

pub(crate) fn sokal_sneath2(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok((c.yy + c.nn) / (c.yy + c.nn + 0.5 * (c.yn + c.ny)))
}

/// Sum over true classes of the largest predicted-cluster count, over `N`.
pub(crate) fn purity(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let majority: usize = input
        .table()
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .sum();
    Ok(majority as f64 / input.n())
}

/// Size-weighted base-2 entropy of the true classes inside each predicted cluster.
pub(crate) fn entropy_score(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let by_cluster = transpose(&input.table(), input.n_clusters);
    let n = input.n();
    let score = by_cluster
        .iter()
        .map(|classes| {
            let size: usize = classes.iter().sum();
            if size == 0 {
                return 0.0;
            }
            let probs: Vec<f64> = classes.iter().map(|&c| c as f64 / size as f64).collect();
            (size as f64 / n) * util::shannon_entropy(&probs, 2.0)
        })
        .sum();
    Ok(score)
}

pub(crate) fn tau(input: &ExternalInput, _: &EvaluationContext) -> Result<f64, MetricError> {
    let c = input.pairs();
    Ok(((c.yy + c.nn) - (c.yn + c.ny)) / c.total())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(t: &'a [usize], p: &'a [usize]) -> ExternalInput<'a> {
        let n_classes = t.iter().max().map_or(0, |m| m + 1);
        let n_clusters = p.iter().max().map_or(0, |m| m + 1);
        ExternalInput {
            y_true: t,
            y_pred: p,
            n_classes,
            n_clusters,
        }
    }

    #[test]
    fn test_identical_labelings() {
        let ctx = EvaluationContext::default();
        let t = [0, 0, 1, 1, 2, 2];
        let i = input(&t, &t);
        for kernel in [
            rand_score as ExternalKernel,
            fowlkes_mallows,
            homogeneity_score,
            completeness_score,
            v_measure,
            precision,
            recall,
            f_measure,
            czekanowski_dice,
            jaccard,
            kulczynski,
            rogers_tanimoto,
            sokal_sneath1,
            sokal_sneath2,
            purity,
            tau,
            normalized_mutual_info,
            hubert_gamma,
        ] {
            assert!((kernel(&i, &ctx).unwrap() - 1.0).abs() < 1e-12);
        }
        assert!(entropy_score(&i, &ctx).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_pair_scores() {
        let ctx = EvaluationContext::default();
        let t = [0, 0, 0, 1, 1, 1];
        let p = [0, 0, 1, 1, 2, 2];
        let i = input(&t, &p);
        // yy=2, yn=4, ny=1, nn=8
        assert!((precision(&i, &ctx).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&i, &ctx).unwrap() - 2.0 / 6.0).abs() < 1e-12);
        assert!((rand_score(&i, &ctx).unwrap() - 10.0 / 15.0).abs() < 1e-12);
        assert!((jaccard(&i, &ctx).unwrap() - 2.0 / 7.0).abs() < 1e-12);
        assert!((russel_rao(&i, &ctx).unwrap() - 2.0 / 15.0).abs() < 1e-12);
        assert!((tau(&i, &ctx).unwrap() - 5.0 / 15.0).abs() < 1e-12);
        assert!((mc_nemar(&i, &ctx).unwrap() - 7.0 / 3.0).abs() < 1e-12);
        assert!((purity(&i, &ctx).unwrap() - 4.0 / 6.0).abs() < 1e-12);
        // cluster 1 mixes one sample of each class
        assert!((entropy_score(&i, &ctx).unwrap() - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_scores() {
        let ctx = EvaluationContext::default();
        let t = [0, 0, 1, 1, 2, 0, 1];
        let p = [1, 0, 1, 1, 0, 0, 2];
        let forward = input(&t, &p);
        let backward = input(&p, &t);
        for kernel in [
            rand_score as ExternalKernel,
            mutual_info,
            normalized_mutual_info,
            fowlkes_mallows,
            jaccard,
            v_measure,
        ] {
            let a = kernel(&forward, &ctx).unwrap();
            let b = kernel(&backward, &ctx).unwrap();
            assert!((a - b).abs() < 1e-12);
        }
        let h = homogeneity_score(&forward, &ctx).unwrap();
        let c = completeness_score(&backward, &ctx).unwrap();
        assert!((h - c).abs() < 1e-12);
        let p = precision(&forward, &ctx).unwrap();
        let r = recall(&backward, &ctx).unwrap();
        assert!((p - r).abs() < 1e-12);
    }

    #[test]
    fn test_single_cluster_fallbacks() {
        let mut ctx = EvaluationContext::default();
        let t = [0, 0, 1, 1];
        let p = [0, 0, 0, 0];
        let i = input(&t, &p);
        assert_eq!(hubert_gamma(&i, &ctx).unwrap(), f64::NEG_INFINITY);
        assert_eq!(phi(&i, &ctx).unwrap(), f64::NEG_INFINITY);
        assert_eq!(normalized_mutual_info(&i, &ctx).unwrap(), 0.0);
        ctx.smallest_value = -1.0;
        assert_eq!(hubert_gamma(&i, &ctx).unwrap(), -1.0);
        ctx.raise_error = true;
        assert!(matches!(hubert_gamma(&i, &ctx), Err(MetricError::DegenerateMetric(_))));
        assert!(matches!(phi(&i, &ctx), Err(MetricError::DegenerateMetric(_))));
    }
}
