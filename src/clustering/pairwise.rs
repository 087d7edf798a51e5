//! Pair counting, cluster geometry and distance enumeration shared by the clustering indices.

use nalgebra::DMatrix;

use crate::matrix::DenseMatrix;

/// Pair agreement counts over all sample pairs `i < j`.
///
/// `yy`: same class and same cluster. `yn`: same class only. `ny`: same cluster only.
/// `nn`: neither.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contingency {
    pub yy: f64,
    pub yn: f64,
    pub ny: f64,
    pub nn: f64,
}

impl Contingency {
    pub fn total(&self) -> f64 {
        self.yy + self.yn + self.ny + self.nn
    }
}

/// Counts pair agreements between two labelings. With `normalize`, every count is
/// divided by `N(N-1)/2`.
pub fn contingency<T: PartialEq>(y_true: &[T], y_pred: &[T], normalize: bool) -> Contingency {
    let n = y_true.len().min(y_pred.len());
    let (mut yy, mut yn, mut ny, mut nn) = (0u64, 0u64, 0u64, 0u64);
    for i in 0..n {
        for j in (i + 1)..n {
            match (y_true[i] == y_true[j], y_pred[i] == y_pred[j]) {
                (true, true) => yy += 1,
                (true, false) => yn += 1,
                (false, true) => ny += 1,
                (false, false) => nn += 1,
            }
        }
    }
    let mut counts = Contingency {
        yy: yy as f64,
        yn: yn as f64,
        ny: ny as f64,
        nn: nn as f64,
    };
    if normalize {
        let pairs = (n * n.saturating_sub(1) / 2) as f64;
        if pairs > 0.0 {
            counts.yy /= pairs;
            counts.yn /= pairs;
            counts.ny /= pairs;
            counts.nn /= pairs;
        }
    }
    counts
}

/// `table[c][k]`: number of samples of class `c` assigned to cluster `k`.
pub(crate) fn cross_table(y_true: &[usize], y_pred: &[usize], n_classes: usize, n_clusters: usize) -> Vec<Vec<usize>> {
    let mut table = vec![vec![0usize; n_clusters]; n_classes];
    for (&c, &k) in y_true.iter().zip(y_pred) {
        table[c][k] += 1;
    }
    table
}

/// Relative rounding allowance on triangle-inequality bounds.
const BOUND_SLACK: f64 = 1e-9;

pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Centroids, sizes and members of each cluster of a dense labeling `0..K-1`.
#[derive(Clone, Debug)]
pub(crate) struct ClusterGeometry {
    pub centroids: Vec<Vec<f64>>,
    pub members: Vec<Vec<usize>>,
    pub global_mean: Vec<f64>,
}

impl ClusterGeometry {
    pub fn new(x: &DenseMatrix, labels: &[usize], n_clusters: usize) -> Self {
        let d = x.cols();
        let mut members = vec![Vec::new(); n_clusters];
        let mut centroids = vec![vec![0.0; d]; n_clusters];
        let mut global_mean = vec![0.0; d];
        for (i, &k) in labels.iter().enumerate() {
            members[k].push(i);
            for j in 0..d {
                let v = x.at(i, j);
                centroids[k][j] += v;
                global_mean[j] += v;
            }
        }
        for (centroid, idx) in centroids.iter_mut().zip(&members) {
            let size = idx.len().max(1) as f64;
            centroid.iter_mut().for_each(|v| *v /= size);
        }
        let n = labels.len().max(1) as f64;
        global_mean.iter_mut().for_each(|v| *v /= n);
        Self {
            centroids,
            members,
            global_mean,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn size(&self, k: usize) -> usize {
        self.members[k].len()
    }

    /// Sum of squared distances of each cluster's members to its centroid.
    pub fn cluster_sse(&self, x: &DenseMatrix) -> Vec<f64> {
        self.members
            .iter()
            .zip(&self.centroids)
            .map(|(idx, c)| idx.iter().map(|&i| x.squared_distance_to(i, c)).sum())
            .collect()
    }

    /// Within-group sum of squares.
    pub fn wgss(&self, x: &DenseMatrix) -> f64 {
        self.cluster_sse(x).iter().sum()
    }

    /// Between-group sum of squares.
    pub fn bgss(&self) -> f64 {
        self.members
            .iter()
            .zip(&self.centroids)
            .map(|(idx, c)| idx.len() as f64 * squared_euclidean(c, &self.global_mean))
            .sum()
    }

    /// Mean member-to-centroid distance of each cluster.
    pub fn mean_spread(&self, x: &DenseMatrix) -> Vec<f64> {
        self.members
            .iter()
            .zip(&self.centroids)
            .map(|(idx, c)| {
                let total: f64 = idx.iter().map(|&i| x.squared_distance_to(i, c).sqrt()).sum();
                total / idx.len().max(1) as f64
            })
            .collect()
    }
}

fn accumulate_outer(scatter: &mut DMatrix<f64>, delta: &[f64]) {
    for a in 0..delta.len() {
        for b in 0..delta.len() {
            scatter[(a, b)] += delta[a] * delta[b];
        }
    }
}

/// Total scatter matrix `T` around the global mean.
pub(crate) fn total_scatter(x: &DenseMatrix, geometry: &ClusterGeometry) -> DMatrix<f64> {
    let d = x.cols();
    let mut scatter = DMatrix::<f64>::zeros(d, d);
    for i in 0..x.rows() {
        let delta: Vec<f64> = x.row(i).iter().zip(&geometry.global_mean).map(|(v, m)| v - m).collect();
        accumulate_outer(&mut scatter, &delta);
    }
    scatter
}

/// Pooled within-group scatter matrix `WG`.
pub(crate) fn within_scatter(x: &DenseMatrix, labels: &[usize], geometry: &ClusterGeometry) -> DMatrix<f64> {
    let d = x.cols();
    let mut scatter = DMatrix::<f64>::zeros(d, d);
    for (i, &k) in labels.iter().enumerate() {
        let delta: Vec<f64> = x.row(i).iter().zip(&geometry.centroids[k]).map(|(v, m)| v - m).collect();
        accumulate_outer(&mut scatter, &delta);
    }
    scatter
}

/// Natural log of the determinant, through Cholesky when the matrix is positive
/// definite and LU otherwise. `None` when the determinant is not positive.
pub(crate) fn log_determinant(m: &DMatrix<f64>) -> Option<f64> {
    if let Some(chol) = m.clone().cholesky() {
        return Some(2.0 * chol.l().diagonal().iter().map(|v| v.ln()).sum::<f64>());
    }
    let det = m.clone().lu().determinant();
    if det > 0.0 {
        Some(det.ln())
    } else {
        None
    }
}

pub(crate) fn determinant(m: &DMatrix<f64>) -> f64 {
    match m.clone().cholesky() {
        Some(chol) => chol.l().diagonal().iter().map(|v| v * v).product(),
        None => m.clone().lu().determinant(),
    }
}

/// Smallest distance between points of different clusters and largest distance
/// between points of the same cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DunnDistances {
    pub min_between: f64,
    pub max_diameter: f64,
}

/// Builds the full `N x N` distance matrix first.
pub(crate) fn dunn_brute_force(x: &DenseMatrix, labels: &[usize]) -> DunnDistances {
    let n = x.rows();
    let mut distances = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = x.distance(i, j);
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    let mut result = DunnDistances {
        min_between: f64::INFINITY,
        max_diameter: 0.0,
    };
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = distances[(i, j)];
            if labels[i] == labels[j] {
                result.max_diameter = result.max_diameter.max(d);
            } else {
                result.min_between = result.min_between.min(d);
            }
        }
    }
    result
}

/// Prunes with centroid radii: a cluster whose doubled radius cannot beat the
/// current diameter is skipped, and so is a cluster pair whose centroid gap
/// minus both radii cannot beat the current minimum. Exact, same result as
/// [`dunn_brute_force`].
pub(crate) fn dunn_modified(x: &DenseMatrix, geometry: &ClusterGeometry) -> DunnDistances {
    let k = geometry.n_clusters();
    let radii: Vec<f64> = geometry
        .members
        .iter()
        .zip(&geometry.centroids)
        .map(|(idx, c)| {
            idx.iter()
                .map(|&i| x.squared_distance_to(i, c).sqrt())
                .fold(0.0, f64::max)
        })
        .collect();

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| radii[b].total_cmp(&radii[a]));
    let mut max_diameter: f64 = 0.0;
    for &c in &order {
        if 2.0 * radii[c] * (1.0 + BOUND_SLACK) < max_diameter {
            continue;
        }
        let idx = &geometry.members[c];
        for (a, &i) in idx.iter().enumerate() {
            for &j in &idx[a + 1..] {
                max_diameter = max_diameter.max(x.distance(i, j));
            }
        }
    }

    let mut cluster_pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(k * k.saturating_sub(1) / 2);
    for a in 0..k {
        for b in (a + 1)..k {
            let gap = euclidean(&geometry.centroids[a], &geometry.centroids[b]);
            cluster_pairs.push((gap - radii[a] - radii[b], a, b));
        }
    }
    cluster_pairs.sort_by(|l, r| l.0.total_cmp(&r.0));
    let mut min_between = f64::INFINITY;
    for (bound, a, b) in cluster_pairs {
        let slack = BOUND_SLACK * (bound.abs() + radii[a] + radii[b]);
        if bound - slack > min_between {
            continue;
        }
        for &i in &geometry.members[a] {
            for &j in &geometry.members[b] {
                min_between = min_between.min(x.distance(i, j));
            }
        }
    }
    DunnDistances {
        min_between,
        max_diameter,
    }
}

/// Distance of every pair `i < j` in enumeration order, flagged `true` when the
/// two samples belong to different clusters.
pub(crate) fn pair_distances(x: &DenseMatrix, labels: &[usize]) -> Vec<(f64, bool)> {
    let n = x.rows();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((x.distance(i, j), labels[i] != labels[j]));
        }
    }
    pairs
}

/// Counts, over pair-of-pairs `(p, q)` with `p` before `q`, `p` within a cluster
/// and `q` between clusters, how often `d(p) < d(q)` and `d(p) > d(q)`.
pub(crate) fn gamma_comparisons(pairs: &[(f64, bool)]) -> (u64, u64) {
    let (mut concordant, mut discordant) = (0u64, 0u64);
    for (a, &(within_dist, between_a)) in pairs.iter().enumerate() {
        if between_a {
            continue;
        }
        for &(between_dist, between_b) in &pairs[a + 1..] {
            if !between_b {
                continue;
            }
            if within_dist < between_dist {
                concordant += 1;
            } else if within_dist > between_dist {
                discordant += 1;
            }
        }
    }
    (concordant, discordant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn blobs() -> (DenseMatrix, Vec<usize>) {
        let x = DenseMatrix::new(6, 2, &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 10.0, 10.0, 10.0, 11.0, 11.0, 10.0]);
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_contingency_counts_every_pair() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let n = rng.random_range(2..40);
            let t: Vec<usize> = (0..n).map(|_| rng.random_range(0..4)).collect();
            let p: Vec<usize> = (0..n).map(|_| rng.random_range(0..3)).collect();
            let c = contingency(&t, &p, false);
            assert_eq!(c.total(), (n * (n - 1) / 2) as f64);
            let normalized = contingency(&t, &p, true);
            assert!((normalized.total() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contingency_symmetry() {
        let t = [0, 0, 1, 1, 2];
        let p = [0, 1, 1, 1, 0];
        let forward = contingency(&t, &p, false);
        let backward = contingency(&p, &t, false);
        assert_eq!(forward.yy, backward.yy);
        assert_eq!(forward.nn, backward.nn);
        assert_eq!(forward.yn, backward.ny);
        assert_eq!(forward.ny, backward.yn);
    }

    #[test]
    fn test_contingency_small() {
        let c = contingency(&[0, 0, 1, 1], &[0, 0, 1, 1], false);
        assert_eq!(c, Contingency { yy: 2.0, yn: 0.0, ny: 0.0, nn: 4.0 });
    }

    #[test]
    fn test_geometry() {
        let (x, labels) = blobs();
        let g = ClusterGeometry::new(&x, &labels, 2);
        assert_eq!(g.size(0), 3);
        assert!((g.centroids[0][0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((g.global_mean[0] - 16.0 / 3.0).abs() < 1e-12);
        let sse = g.cluster_sse(&x);
        assert!((sse[0] - 4.0 / 3.0).abs() < 1e-12);
        assert!((g.wgss(&x) - 8.0 / 3.0).abs() < 1e-12);
        let t = total_scatter(&x, &g);
        let w = within_scatter(&x, &labels, &g);
        let total_trace = t.trace();
        assert!((total_trace - (g.wgss(&x) + g.bgss())).abs() < 1e-9);
        assert!((w.trace() - g.wgss(&x)).abs() < 1e-9);
    }

    #[test]
    fn test_determinants_agree() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        assert!((determinant(&m) - 11.0).abs() < 1e-9);
        assert!((log_determinant(&m).unwrap() - 11f64.ln()).abs() < 1e-9);

        let indefinite = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert!((determinant(&indefinite) + 1.0).abs() < 1e-9);
        assert!(log_determinant(&indefinite).is_none());
    }

    #[test]
    fn test_dunn_paths_agree() {
        let (x, labels) = blobs();
        let g = ClusterGeometry::new(&x, &labels, 2);
        assert_eq!(dunn_brute_force(&x, &labels), dunn_modified(&x, &g));

        let mut rng = StdRng::seed_from_u64(7);
        let n = 25;
        let data: Vec<f64> = (0..n * 3).map(|_| rng.random_range(-5.0..5.0)).collect();
        let x = DenseMatrix::new(n, 3, &data);
        let labels: Vec<usize> = (0..n).map(|i| i % 4).collect();
        let g = ClusterGeometry::new(&x, &labels, 4);
        assert_eq!(dunn_brute_force(&x, &labels), dunn_modified(&x, &g));
    }

    #[test]
    fn test_dunn_pruning_on_separated_clusters() {
        let mut rng = StdRng::seed_from_u64(11);
        let k = 6;
        let n = 60;
        let labels: Vec<usize> = (0..n).map(|i| i % k).collect();
        let data: Vec<f64> = labels
            .iter()
            .flat_map(|&c| {
                let offset = 40.0 * c as f64;
                [offset + rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0) * (c + 1) as f64]
            })
            .collect();
        let x = DenseMatrix::new(n, 2, &data);
        let g = ClusterGeometry::new(&x, &labels, k);
        let modified = dunn_modified(&x, &g);
        assert_eq!(dunn_brute_force(&x, &labels), modified);
        assert!(modified.min_between > 30.0);
    }

    #[test]
    fn test_gamma_comparisons() {
        let pairs = [(1.0, false), (5.0, true), (0.5, true), (2.0, false), (3.0, true)];
        let (concordant, discordant) = gamma_comparisons(&pairs);
        assert_eq!(concordant, 3);
        assert_eq!(discordant, 1);
    }
}
