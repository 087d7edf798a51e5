use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::error::MetricError;

/// A dense `f64` matrix with samples in rows and outputs (or features) in columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    data: DMatrix<f64>,
}

impl DenseMatrix {
    /// Creates a new dense matrix with given rows, columns, and row-major data.
    pub fn new(rows: usize, cols: usize, data: &[f64]) -> Self {
        Self {
            data: DMatrix::from_row_slice(rows, cols, data),
        }
    }

    /// Creates a single-column matrix from a sample vector.
    pub fn from_column(values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_column_slice(values.len(), 1, values),
        }
    }

    /// Creates a matrix from a list of rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MetricError> {
        let cols = rows.first().map_or(0, |r| r.len());
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(MetricError::ShapeMismatch(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                cols
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Ok(Self::new(rows.len(), cols, &flat))
    }

    /// Creates a new dense matrix with given rows and columns, initialized with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[(i, j)] = value;
    }

    /// Copies column `j` into a vector.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.data.column(j).iter().copied().collect()
    }

    /// Copies row `i` into a vector.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.data.row(i).iter().copied().collect()
    }

    /// Squared Euclidean distance between row `i` and row `j`.
    #[inline]
    pub fn squared_distance(&self, i: usize, j: usize) -> f64 {
        (0..self.cols())
            .map(|k| {
                let d = self.data[(i, k)] - self.data[(j, k)];
                d * d
            })
            .sum()
    }

    /// Euclidean distance between row `i` and row `j`.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.squared_distance(i, j).sqrt()
    }

    /// Squared Euclidean distance between row `i` and an arbitrary point.
    #[inline]
    pub fn squared_distance_to(&self, i: usize, point: &[f64]) -> f64 {
        point
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                let d = self.data[(i, k)] - p;
                d * d
            })
            .sum()
    }

    /// Returns a copy scaled column-wise into [0, 1]. Constant columns become zero.
    pub fn min_max_scaled(&self) -> DenseMatrix {
        let mut scaled = self.clone();
        for j in 0..self.cols() {
            let column = self.data.column(j);
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = max - min;
            for i in 0..self.rows() {
                let v = if range > 0.0 { (self.at(i, j) - min) / range } else { 0.0 };
                scaled.set(i, j, v);
            }
        }
        scaled
    }

    /// Flattens the matrix into a single vector of elements in row major layout.
    pub fn flatten(&self) -> Vec<f64> {
        self.data
            .row_iter()
            .flat_map(|row| row.into_iter().copied().collect::<Vec<_>>())
            .collect()
    }
}

impl From<Vec<f64>> for DenseMatrix {
    fn from(values: Vec<f64>) -> Self {
        DenseMatrix::from_column(&values)
    }
}

impl From<&[f64]> for DenseMatrix {
    fn from(values: &[f64]) -> Self {
        DenseMatrix::from_column(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let matrix = DenseMatrix::new(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(matrix.at(1, 1), 4.0);
        assert_eq!(matrix.at(0, 1), 2.0);
    }

    #[test]
    fn test_from_column() {
        let matrix = DenseMatrix::from_column(&[1.0, 2.0, 3.0]);
        assert_eq!((matrix.rows(), matrix.cols()), (3, 1));
        assert_eq!(matrix.column(0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(DenseMatrix::from_rows(&rows), Err(MetricError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let matrix = DenseMatrix::from_rows(&rows).unwrap();
        assert_eq!((matrix.rows(), matrix.cols()), (3, 2));
        assert_eq!(matrix.row(2), vec![5.0, 6.0]);
        assert_eq!(matrix.flatten(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_distance() {
        let matrix = DenseMatrix::new(2, 2, &[0.0, 0.0, 3.0, 4.0]);
        assert!((matrix.distance(0, 1) - 5.0).abs() < 1e-12);
        assert!((matrix.squared_distance_to(1, &[0.0, 0.0]) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_max_scaled() {
        let matrix = DenseMatrix::new(3, 2, &[0.0, 5.0, 5.0, 5.0, 10.0, 5.0]);
        let scaled = matrix.min_max_scaled();
        assert_eq!(scaled.column(0), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled.column(1), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zeros() {
        let matrix = DenseMatrix::zeros(2, 3);
        assert_eq!((matrix.rows(), matrix.cols()), (2, 3));
        assert!(matrix.flatten().iter().all(|&v| v == 0.0));
    }
}
