//! Observables for expectation, variance and sample result requests.

use serde::{Deserialize, Serialize};

use crate::matrix::SquareMatrix;

/// An observable, as named in result pragmas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observable {
    /// Pauli-I.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// An explicit Hermitian matrix.
    Hermitian(SquareMatrix),
    /// A tensor product of factor observables, outermost first.
    Tensor(Vec<Observable>),
}

impl Observable {
    /// Build a named single-qubit observable from its pragma spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i" => Some(Observable::I),
            "x" => Some(Observable::X),
            "y" => Some(Observable::Y),
            "z" => Some(Observable::Z),
            "h" => Some(Observable::H),
            _ => None,
        }
    }

    /// Number of qubits the observable acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Observable::I
            | Observable::X
            | Observable::Y
            | Observable::Z
            | Observable::H => 1,
            Observable::Hermitian(m) => m.num_qubits().unwrap_or(1),
            Observable::Tensor(factors) => factors.iter().map(Observable::num_qubits).sum(),
        }
    }

    /// Collapse a tensor product with a single factor to the factor itself.
    pub fn flattened(self) -> Self {
        match self {
            Observable::Tensor(mut factors) if factors.len() == 1 => factors.remove(0),
            other => other,
        }
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observable::I => write!(f, "i"),
            Observable::X => write!(f, "x"),
            Observable::Y => write!(f, "y"),
            Observable::Z => write!(f, "z"),
            Observable::H => write!(f, "h"),
            Observable::Hermitian(m) => write!(f, "hermitian{m}"),
            Observable::Tensor(factors) => {
                let mut first = true;
                for factor in factors {
                    if !first {
                        write!(f, " @ ")?;
                    }
                    first = false;
                    write!(f, "{factor}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Observable::from_name("x"), Some(Observable::X));
        assert_eq!(Observable::from_name("h"), Some(Observable::H));
        assert_eq!(Observable::from_name("q"), None);
    }

    #[test]
    fn test_tensor_arity() {
        let obs = Observable::Tensor(vec![Observable::X, Observable::Z]);
        assert_eq!(obs.num_qubits(), 2);
        assert_eq!(format!("{obs}"), "x @ z");
    }

    #[test]
    fn test_flatten_singleton() {
        let obs = Observable::Tensor(vec![Observable::Y]).flattened();
        assert_eq!(obs, Observable::Y);
    }

    #[test]
    fn test_hermitian_arity() {
        let m = SquareMatrix::identity(4);
        assert_eq!(Observable::Hermitian(m).num_qubits(), 2);
    }
}
