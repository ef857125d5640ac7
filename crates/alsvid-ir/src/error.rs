//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building or validating a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Instruction target lies outside the allocated qubit range.
    #[error("Target {target} out of range for circuit with {qubit_count} qubits")]
    TargetOutOfRange {
        /// The offending target.
        target: QubitId,
        /// Number of qubits allocated in the circuit.
        qubit_count: u32,
    },

    /// An operator still carries a symbolic parameter.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Matrix data does not match the declared dimension.
    #[error("Matrix of {elements} elements is not {dim}x{dim}")]
    MalformedMatrix {
        /// Declared row/column count.
        dim: usize,
        /// Number of elements supplied.
        elements: usize,
    },

    /// Matrix dimension does not fit the number of targets.
    #[error("{dim}x{dim} matrix cannot act on {targets} qubit(s)")]
    MatrixArityMismatch {
        /// Row/column count of the matrix.
        dim: usize,
        /// Number of target qubits supplied.
        targets: usize,
    },

    /// A Kraus channel was built with no operators.
    #[error("Kraus channel requires at least one operator")]
    EmptyKraus,

    /// Operator applied to the wrong number of qubits.
    #[error("Operator '{name}' acts on {expected} qubit(s), got {got}")]
    TargetCountMismatch {
        /// Operator name.
        name: String,
        /// Qubit count the operator is defined on.
        expected: usize,
        /// Number of targets supplied.
        got: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
