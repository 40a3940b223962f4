// matrix.rs

//! # Matrix Module
//!
//! A dense, row-major matrix of `f64` values used as the read-only input of a
//! partitioned reduction.
//!
//! A `Matrix` is never empty and always rectangular: every constructor
//! validates its input and returns `ReduceError::InvalidArgument` otherwise.
//! Element `(row, col)` lives at flattened index `row * cols + col`.
//!
//! ## Usage:
//! ```rust
//! use matrix_workers::matrix::Matrix;
//! let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(m.sum(), 10.0);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::ReduceError;

//Matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>, // Flat vector for matrix elements
}

impl Matrix {
    // Constructor for a new matrix from flat row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ReduceError> {
        let len = element_count(rows, cols)?;
        if len != data.len() {
            return Err(ReduceError::invalid(format!(
                "data size mismatch: {}x{} needs {} elements, got {}",
                rows,
                cols,
                len,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from nested rows, rejecting empty or ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ReduceError> {
        let first = rows
            .first()
            .ok_or_else(|| ReduceError::invalid("matrix has no rows"))?;
        let cols = first.len();
        if cols == 0 {
            return Err(ReduceError::invalid("matrix rows are empty"));
        }

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(ReduceError::invalid(format!(
                    "matrix is not rectangular: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }

        Self::new(rows.len(), cols, data)
    }

    // Random-initialized matrix, standard normal entries
    pub fn random(rows: usize, cols: usize, seed: Option<u64>) -> Result<Self, ReduceError> {
        let len = element_count(rows, cols)?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ReduceError::invalid(format!("normal distribution: {}", e)))?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let data: Vec<f64> = (0..len).map(|_| normal.sample(&mut rng)).collect();

        Self::new(rows, cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of elements in the flattened index space.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    // Never true for a constructed matrix; kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Immutable access to matrix elements
    pub fn at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    /// Maps a flattened index back to `(row, col)`.
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    // Sequential reference sum, row-major order
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

// rows * cols, rejecting empty and overflowing shapes
fn element_count(rows: usize, cols: usize) -> Result<usize, ReduceError> {
    if rows == 0 || cols == 0 {
        return Err(ReduceError::invalid(format!(
            "matrix must be non-empty, got {}x{}",
            rows, cols
        )));
    }
    rows.checked_mul(cols).ok_or_else(|| {
        ReduceError::invalid(format!("matrix shape {}x{} overflows usize", rows, cols))
    })
}
