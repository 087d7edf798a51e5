//! Indices scoring a predicted labeling against its own feature matrix.

use crate::{context::EvaluationContext, error::MetricError, matrix::DenseMatrix};

use super::pairwise::{
    determinant, dunn_brute_force, dunn_modified, euclidean, gamma_comparisons, log_determinant, pair_distances,
    squared_euclidean, total_scatter, within_scatter, ClusterGeometry,
};

/// Features and encoded predicted labels handed to every internal kernel.
pub(crate) struct InternalInput<'a> {
    pub x: &'a DenseMatrix,
    pub labels: &'a [usize],
    pub n_clusters: usize,
}

impl InternalInput<'_> {
    fn geometry(&self) -> ClusterGeometry {
        ClusterGeometry::new(self.x, self.labels, self.n_clusters)
    }

    fn n(&self) -> f64 {
        self.labels.len() as f64
    }

    fn single_cluster(&self) -> bool {
        self.n_clusters == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InternalParams {
    pub use_modified: bool,
    pub use_normalized: bool,
}

impl Default for InternalParams {
    fn default() -> Self {
        Self {
            use_modified: true,
            use_normalized: true,
        }
    }
}

pub(crate) type InternalKernel = fn(&InternalInput, &InternalParams, &EvaluationContext) -> Result<f64, MetricError>;

fn undefined(name: &str) -> String {
    format!("The {} is undefined when y_pred has only 1 cluster.", name)
}

pub(crate) fn ball_hall(input: &InternalInput, _: &InternalParams, _: &EvaluationContext) -> Result<f64, MetricError> {
    let g = input.geometry();
    let total: f64 = g
        .cluster_sse(input.x)
        .iter()
        .enumerate()
        .map(|(k, sse)| sse / g.size(k) as f64)
        .sum();
    Ok(total / g.n_clusters() as f64)
}

pub(crate) fn calinski_harabasz(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Calinski-Harabasz index"), 0.0);
    }
    let g = input.geometry();
    let wgss = g.wgss(input.x);
    if wgss == 0.0 {
        return Ok(1.0);
    }
    let k = g.n_clusters() as f64;
    Ok(g.bgss() * (input.n() - k) / (wgss * (k - 1.0)))
}

pub(crate) fn xie_beni(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Xie-Beni index"), ctx.biggest_value);
    }
    let g = input.geometry();
    let mut min_separation = f64::INFINITY;
    for a in 0..g.n_clusters() {
        for b in (a + 1)..g.n_clusters() {
            min_separation = min_separation.min(squared_euclidean(&g.centroids[a], &g.centroids[b]));
        }
    }
    Ok(g.wgss(input.x) / (input.n() * min_separation))
}

/// Clusters whose scatter trace is zero are skipped.
pub(crate) fn banfeld_raftery(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Banfeld-Raftery index"), ctx.biggest_value);
    }
    let g = input.geometry();
    Ok(g.cluster_sse(input.x)
        .iter()
        .enumerate()
        .filter(|(_, &sse)| sse > 0.0)
        .map(|(k, sse)| {
            let size = g.size(k) as f64;
            size * (sse / size).ln()
        })
        .sum())
}

pub(crate) fn davies_bouldin(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Davies-Bouldin index"), ctx.biggest_value);
    }
    let g = input.geometry();
    let spread = g.mean_spread(input.x);
    let k = g.n_clusters();
    let total: f64 = (0..k)
        .map(|a| {
            (0..k)
                .filter(|&b| b != a)
                .map(|b| (spread[a] + spread[b]) / euclidean(&g.centroids[a], &g.centroids[b]))
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .sum();
    Ok(total / k as f64)
}

/// `ln(det(T) / det(WG))`, through log-determinants when both are available.
fn log_det_ratio_of(input: &InternalInput) -> f64 {
    let g = input.geometry();
    let t = total_scatter(input.x, &g);
    let w = within_scatter(input.x, input.labels, &g);
    match (log_determinant(&t), log_determinant(&w)) {
        (Some(lt), Some(lw)) => lt - lw,
        _ => (determinant(&t) / determinant(&w)).ln(),
    }
}

pub(crate) fn det_ratio(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Det-Ratio index"), ctx.smallest_value);
    }
    Ok(log_det_ratio_of(input).exp())
}

pub(crate) fn log_det_ratio(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Log Det Ratio index"), ctx.smallest_value);
    }
    Ok(input.n() * log_det_ratio_of(input))
}

pub(crate) fn dunn(input: &InternalInput, params: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Dunn index"), 0.0);
    }
    let distances = if params.use_modified {
        dunn_modified(input.x, &input.geometry())
    } else {
        dunn_brute_force(input.x, input.labels)
    };
    Ok(distances.min_between / distances.max_diameter)
}

pub(crate) fn ksq_detw(input: &InternalInput, params: &InternalParams, _: &EvaluationContext) -> Result<f64, MetricError> {
    let scaled;
    let x = if params.use_normalized {
        scaled = input.x.min_max_scaled();
        &scaled
    } else {
        input.x
    };
    let g = ClusterGeometry::new(x, input.labels, input.n_clusters);
    let k = input.n_clusters as f64;
    Ok(k * k * determinant(&within_scatter(x, input.labels, &g)))
}

pub(crate) fn log_ss_ratio(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Log SS Ratio index"), ctx.smallest_value);
    }
    let g = input.geometry();
    Ok((g.bgss() / g.wgss(input.x)).ln())
}

/// Per-sample silhouette widths. Members of singleton clusters score 0.
pub(crate) fn silhouette_samples(input: &InternalInput, ctx: &EvaluationContext) -> Result<Vec<f64>, MetricError> {
    if input.single_cluster() {
        let value = ctx.fallback(&undefined("Silhouette index"), ctx.smallest_value)?;
        return Ok(vec![value; input.labels.len()]);
    }
    let g = input.geometry();
    let samples = (0..input.labels.len())
        .map(|i| {
            let own = input.labels[i];
            if g.size(own) == 1 {
                return 0.0;
            }
            let mut mean_to = vec![0.0; g.n_clusters()];
            for (j, &k) in input.labels.iter().enumerate() {
                if j != i {
                    mean_to[k] += input.x.distance(i, j);
                }
            }
            let a = mean_to[own] / (g.size(own) - 1) as f64;
            let b = (0..g.n_clusters())
                .filter(|&k| k != own)
                .map(|k| mean_to[k] / g.size(k) as f64)
                .fold(f64::INFINITY, f64::min);
            let scale = a.max(b);
            if scale == 0.0 {
                0.0
            } else {
                (b - a) / scale
            }
        })
        .collect();
    Ok(samples)
}

pub(crate) fn silhouette(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Silhouette index"), ctx.smallest_value);
    }
    let samples = silhouette_samples(input, ctx)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

pub(crate) fn sum_squared_error(input: &InternalInput, _: &InternalParams, _: &EvaluationContext) -> Result<f64, MetricError> {
    Ok(input.geometry().wgss(input.x))
}

/// Within-pair and merged SSE of every cluster pair, merged SSE by Ward's identity.
fn pair_merges(input: &InternalInput) -> Vec<(f64, f64, usize)> {
    let g = input.geometry();
    let sse = g.cluster_sse(input.x);
    let mut merges = Vec::new();
    for a in 0..g.n_clusters() {
        for b in (a + 1)..g.n_clusters() {
            let (na, nb) = (g.size(a) as f64, g.size(b) as f64);
            let je2 = sse[a] + sse[b];
            let je1 = je2 + na * nb / (na + nb) * squared_euclidean(&g.centroids[a], &g.centroids[b]);
            merges.push((je2, je1, g.size(a) + g.size(b)));
        }
    }
    merges
}

pub(crate) fn duda_hart(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Duda-Hart index"), ctx.biggest_value);
    }
    let merges = pair_merges(input);
    let total: f64 = merges.iter().map(|(je2, je1, _)| je2 / je1).sum();
    Ok(total / merges.len() as f64)
}

pub(crate) fn beale(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Beale index"), ctx.biggest_value);
    }
    let d = input.x.cols() as f64;
    let merges = pair_merges(input);
    if merges.iter().any(|&(je2, _, size)| size <= 2 || je2 == 0.0) {
        return ctx.fallback(
            "The Beale index is undefined when two merged clusters hold 2 samples or no within-cluster scatter.",
            ctx.biggest_value,
        );
    }
    let total: f64 = merges
        .iter()
        .map(|&(je2, je1, size)| {
            let n = size as f64;
            ((je1 - je2) / je2) / ((n - 1.0) / (n - 2.0) * 2f64.powf(2.0 / d) - 1.0)
        })
        .sum();
    Ok(total / merges.len() as f64)
}

pub(crate) fn r_squared(input: &InternalInput, _: &InternalParams, _: &EvaluationContext) -> Result<f64, MetricError> {
    let g = input.geometry();
    let bgss = g.bgss();
    Ok(bgss / (bgss + g.wgss(input.x)))
}

/// All-points core distance of each sample within its own cluster. Coincident
/// points do not contribute.
fn core_distances(input: &InternalInput, g: &ClusterGeometry) -> Vec<f64> {
    let d = input.x.cols() as f64;
    let mut core = vec![0.0; input.labels.len()];
    for members in &g.members {
        if members.len() < 2 {
            continue;
        }
        for &i in members {
            let density: f64 = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| input.x.distance(i, j))
                .filter(|&dist| dist > 0.0)
                .map(|dist| (1.0 / dist).powf(d))
                .sum();
            if density > 0.0 {
                core[i] = (density / (members.len() - 1) as f64).powf(-1.0 / d);
            }
        }
    }
    core
}

/// Largest edge of the minimum spanning tree over `members` under `weight`.
fn mst_max_edge(members: &[usize], weight: impl Fn(usize, usize) -> f64) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    let mut in_tree = vec![false; members.len()];
    let mut best = vec![f64::INFINITY; members.len()];
    best[0] = 0.0;
    let mut max_edge: f64 = 0.0;
    for _ in 0..members.len() {
        let next = (0..members.len())
            .filter(|&v| !in_tree[v])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]));
        let Some(u) = next else { break };
        in_tree[u] = true;
        max_edge = max_edge.max(best[u]);
        for v in 0..members.len() {
            if !in_tree[v] {
                best[v] = best[v].min(weight(members[u], members[v]));
            }
        }
    }
    max_edge
}

/// `(1 - DBCV) / 2`, mapping the density-based validity onto `[0, 1]` with 0 best.
pub(crate) fn density_based_validation(
    input: &InternalInput,
    _: &InternalParams,
    ctx: &EvaluationContext,
) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Density-based Clustering Validation index"), 1.0);
    }
    let g = input.geometry();
    let core = core_distances(input, &g);
    let reach = |i: usize, j: usize| input.x.distance(i, j).max(core[i]).max(core[j]);

    let k = g.n_clusters();
    let sparseness: Vec<f64> = g.members.iter().map(|m| mst_max_edge(m, reach)).collect();
    let mut separation = vec![f64::INFINITY; k];
    for a in 0..k {
        for b in (a + 1)..k {
            let mut closest = f64::INFINITY;
            for &i in &g.members[a] {
                for &j in &g.members[b] {
                    closest = closest.min(reach(i, j));
                }
            }
            separation[a] = separation[a].min(closest);
            separation[b] = separation[b].min(closest);
        }
    }
    let validity: f64 = (0..k)
        .map(|c| {
            let scale = separation[c].max(sparseness[c]);
            let v = if scale == 0.0 {
                0.0
            } else {
                (separation[c] - sparseness[c]) / scale
            };
            g.size(c) as f64 / input.n() * v
        })
        .sum();
    Ok((1.0 - validity) / 2.0)
}

pub(crate) fn hartigan(input: &InternalInput, _: &InternalParams, ctx: &EvaluationContext) -> Result<f64, MetricError> {
    if input.single_cluster() {
        return ctx.fallback(&undefined("Hartigan index"), ctx.biggest_value);
    }
    let g = input.geometry();
    Ok(g.wgss(input.x) / g.bgss())
}

/// Compares every within-cluster distance with every later between-cluster distance. O(N^4).
pub(crate) fn baker_hubert_gamma(
    input: &InternalInput,
    _: &InternalParams,
    _: &EvaluationContext,
) -> Result<f64, MetricError> {
    let (plus, minus) = gamma_comparisons(&pair_distances(input.x, input.labels));
    let total = plus + minus;
    if total == 0 {
        return Ok(0.0);
    }
    Ok((plus as f64 - minus as f64) / total as f64)
}

/// Share of discordant comparisons among all pair-of-pairs. O(N^4).
pub(crate) fn g_plus(input: &InternalInput, _: &InternalParams, _: &EvaluationContext) -> Result<f64, MetricError> {
    let pairs = pair_distances(input.x, input.labels);
    let (_, discordant) = gamma_comparisons(&pairs);
    let p = pairs.len() as f64;
    Ok(2.0 * discordant as f64 / (p * (p - 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [usize; 6] = [0, 0, 0, 1, 1, 1];

    fn blobs() -> DenseMatrix {
        DenseMatrix::new(6, 2, &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 10.0, 10.0, 10.0, 11.0, 11.0, 10.0])
    }

    fn run(kernel: InternalKernel, params: InternalParams) -> f64 {
        let x = blobs();
        let input = InternalInput {
            x: &x,
            labels: &LABELS,
            n_clusters: 2,
        };
        kernel(&input, &params, &EvaluationContext::default()).unwrap()
    }

    fn close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-4, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_scatter_based_indices() {
        let p = InternalParams::default();
        close(run(ball_hall, p), 4.0 / 9.0);
        close(run(sum_squared_error, p), 8.0 / 3.0);
        close(run(calinski_harabasz, p), 450.0);
        close(run(r_squared, p), 900.0 / 908.0);
        close(run(hartigan, p), (8.0 / 3.0) / 300.0);
        close(run(log_ss_ratio, p), 112.5f64.ln());
        close(run(xie_beni, p), (8.0 / 3.0) / 1200.0);
        close(run(banfeld_raftery, p), 6.0 * (4.0f64 / 9.0).ln());
        close(run(davies_bouldin, p), 0.092494);
        close(run(duda_hart, p), (8.0 / 3.0) / (8.0 / 3.0 + 300.0));
        close(run(beale, p), 75.0);
    }

    #[test]
    fn test_determinant_indices() {
        let p = InternalParams::default();
        close(run(det_ratio, p), 451.0);
        close(run(log_det_ratio, p), 6.0 * 451f64.ln());
        let raw = InternalParams {
            use_normalized: false,
            ..p
        };
        close(run(ksq_detw, raw), 16.0 / 3.0);
        assert!(run(ksq_detw, p) < run(ksq_detw, raw));
    }

    #[test]
    fn test_distance_indices() {
        let modified = InternalParams::default();
        let brute = InternalParams {
            use_modified: false,
            ..modified
        };
        close(run(dunn, modified), 90.5f64.sqrt());
        assert_eq!(run(dunn, modified), run(dunn, brute));
        assert!(run(silhouette, modified) > 0.8);
        assert_eq!(run(baker_hubert_gamma, modified), 1.0);
        assert_eq!(run(g_plus, modified), 0.0);
        let dbcv = run(density_based_validation, modified);
        assert!((0.0..0.1).contains(&dbcv));
    }

    #[test]
    fn test_silhouette_singleton_scores_zero() {
        let x = DenseMatrix::new(4, 1, &[0.0, 0.1, 0.2, 5.0]);
        let labels = [0, 0, 0, 1];
        let input = InternalInput {
            x: &x,
            labels: &labels,
            n_clusters: 2,
        };
        let samples = silhouette_samples(&input, &EvaluationContext::default()).unwrap();
        assert_eq!(samples[3], 0.0);
        assert!(samples[..3].iter().all(|&s| s > 0.9));
    }

    #[test]
    fn test_beale_degenerate_merges() {
        let x = DenseMatrix::new(4, 2, &[0.0, 0.0, 0.0, 1.0, 5.0, 5.0, 6.0, 6.0]);
        let p = InternalParams::default();
        let mut ctx = EvaluationContext::default();

        let singletons = [0, 0, 1, 2];
        let input = InternalInput {
            x: &x,
            labels: &singletons,
            n_clusters: 3,
        };
        assert_eq!(beale(&input, &p, &ctx).unwrap(), f64::INFINITY);

        let duplicates = DenseMatrix::new(4, 2, &[1.0, 1.0, 1.0, 1.0, 4.0, 4.0, 4.0, 4.0]);
        let pairs = [0, 0, 1, 1];
        let input = InternalInput {
            x: &duplicates,
            labels: &pairs,
            n_clusters: 2,
        };
        ctx.biggest_value = 1e6;
        assert_eq!(beale(&input, &p, &ctx).unwrap(), 1e6);
        ctx.raise_error = true;
        assert!(matches!(beale(&input, &p, &ctx), Err(MetricError::DegenerateMetric(_))));
    }

    #[test]
    fn test_single_cluster_fallbacks() {
        let x = blobs();
        let labels = [0; 6];
        let input = InternalInput {
            x: &x,
            labels: &labels,
            n_clusters: 1,
        };
        let p = InternalParams::default();
        let mut ctx = EvaluationContext::default();
        assert_eq!(calinski_harabasz(&input, &p, &ctx).unwrap(), 0.0);
        assert_eq!(davies_bouldin(&input, &p, &ctx).unwrap(), f64::INFINITY);
        assert_eq!(log_ss_ratio(&input, &p, &ctx).unwrap(), f64::NEG_INFINITY);
        assert_eq!(dunn(&input, &p, &ctx).unwrap(), 0.0);
        assert_eq!(density_based_validation(&input, &p, &ctx).unwrap(), 1.0);
        ctx.raise_error = true;
        assert!(matches!(xie_beni(&input, &p, &ctx), Err(MetricError::DegenerateMetric(_))));
        assert!(matches!(silhouette_samples(&input, &ctx), Err(MetricError::DegenerateMetric(_))));
    }
}
