//! Dense square complex matrices for verbatim unitaries, Kraus operators
//! and Hermitian observables.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// A square matrix over `Complex64`, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl SquareMatrix {
    /// Build a matrix from row-major data; `data.len()` must be a perfect
    /// square.
    pub fn new(data: Vec<Complex64>) -> IrResult<Self> {
        let dim = (data.len() as f64).sqrt().round() as usize;
        if dim * dim != data.len() {
            return Err(IrError::MalformedMatrix {
                dim,
                elements: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Build a matrix from nested rows, checking that the shape is square.
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> IrResult<Self> {
        let dim = rows.len();
        let mut data = Vec::with_capacity(dim * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(IrError::MalformedMatrix {
                    dim,
                    elements: rows.iter().map(Vec::len).sum(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { dim, data })
    }

    /// Identity matrix of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// Row/column count.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits an operator of this dimension acts on, if the
    /// dimension is a power of two.
    pub fn num_qubits(&self) -> Option<usize> {
        (self.dim.is_power_of_two()).then(|| self.dim.trailing_zeros() as usize)
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Row-major element slice.
    pub fn elements(&self) -> &[Complex64] {
        &self.data
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); self.dim * self.dim];
        for r in 0..self.dim {
            for c in 0..self.dim {
                data[c * self.dim + r] = self.get(r, c).conj();
            }
        }
        Self {
            dim: self.dim,
            data,
        }
    }

    /// Matrix product `self * other`; dimensions must agree.
    pub fn matmul(&self, other: &Self) -> IrResult<Self> {
        if self.dim != other.dim {
            return Err(IrError::MalformedMatrix {
                dim: self.dim,
                elements: other.data.len(),
            });
        }
        let n = self.dim;
        let mut data = vec![Complex64::new(0.0, 0.0); n * n];
        for r in 0..n {
            for c in 0..n {
                let mut acc = Complex64::new(0.0, 0.0);
                for k in 0..n {
                    acc += self.get(r, k) * other.get(k, c);
                }
                data[r * n + c] = acc;
            }
        }
        Ok(Self { dim: n, data })
    }

    /// Check that the matrix fits the given number of target qubits.
    pub fn check_targets(&self, targets: usize) -> IrResult<()> {
        if self.num_qubits() == Some(targets) {
            Ok(())
        } else {
            Err(IrError::MatrixArityMismatch {
                dim: self.dim,
                targets,
            })
        }
    }

    /// Maximum elementwise distance to another matrix.
    pub fn distance(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for SquareMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]", self.dim, self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_shape_validation() {
        assert!(SquareMatrix::new(vec![c(1.0, 0.0); 4]).is_ok());
        assert!(matches!(
            SquareMatrix::new(vec![c(1.0, 0.0); 3]),
            Err(IrError::MalformedMatrix { .. })
        ));
    }

    #[test]
    fn test_num_qubits() {
        let m = SquareMatrix::identity(4);
        assert_eq!(m.num_qubits(), Some(2));
        assert!(m.check_targets(2).is_ok());
        assert!(m.check_targets(1).is_err());
    }

    #[test]
    fn test_dagger() {
        let m = SquareMatrix::from_rows(vec![
            vec![c(1.0, 0.0), c(0.0, 1.0)],
            vec![c(0.0, 0.0), c(0.0, -1.0)],
        ])
        .unwrap();
        let d = m.dagger();
        assert_eq!(d.get(1, 0), c(0.0, -1.0));
        assert_eq!(d.get(1, 1), c(0.0, 1.0));
    }

    #[test]
    fn test_matmul_identity() {
        let m = SquareMatrix::from_rows(vec![
            vec![c(1.0, 0.0), c(2.0, 0.0)],
            vec![c(3.0, 0.0), c(4.0, 0.0)],
        ])
        .unwrap();
        let id = SquareMatrix::identity(2);
        assert_eq!(m.matmul(&id).unwrap(), m);
    }
}
