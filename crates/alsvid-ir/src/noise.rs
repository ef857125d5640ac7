//! Noise channels attachable to a circuit through `#pragma braket noise`.
//!
//! The IR records which physical process acts on which qubits; the density
//! matrix backend owns the corresponding Kraus decompositions. Only the
//! `Kraus` variant carries explicit matrices, because there the pragma *is*
//! the decomposition.

use serde::{Deserialize, Serialize};

use crate::matrix::SquareMatrix;

/// A noise channel with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum NoiseChannel {
    /// Flips |0⟩ ↔ |1⟩ with probability `probability`.
    BitFlip { probability: f64 },

    /// Applies Z with probability `probability`.
    PhaseFlip { probability: f64 },

    /// Applies X, Y, Z with the respective probabilities.
    PauliChannel { px: f64, py: f64, pz: f64 },

    /// Single-qubit depolarizing channel.
    Depolarizing { probability: f64 },

    /// Two-qubit depolarizing channel.
    TwoQubitDepolarizing { probability: f64 },

    /// Two-qubit dephasing channel.
    TwoQubitDephasing { probability: f64 },

    /// Energy relaxation (T1 decay).
    AmplitudeDamping { gamma: f64 },

    /// Amplitude damping towards a mixed equilibrium state.
    GeneralizedAmplitudeDamping { gamma: f64, probability: f64 },

    /// Dephasing without energy loss (T2 decay).
    PhaseDamping { gamma: f64 },

    /// Channel given directly by its Kraus operators.
    Kraus { operators: Vec<SquareMatrix> },
}

impl NoiseChannel {
    /// Wire name of the channel, as spelled in noise pragmas.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseChannel::BitFlip { .. } => "bit_flip",
            NoiseChannel::PhaseFlip { .. } => "phase_flip",
            NoiseChannel::PauliChannel { .. } => "pauli_channel",
            NoiseChannel::Depolarizing { .. } => "depolarizing",
            NoiseChannel::TwoQubitDepolarizing { .. } => "two_qubit_depolarizing",
            NoiseChannel::TwoQubitDephasing { .. } => "two_qubit_dephasing",
            NoiseChannel::AmplitudeDamping { .. } => "amplitude_damping",
            NoiseChannel::GeneralizedAmplitudeDamping { .. } => "generalized_amplitude_damping",
            NoiseChannel::PhaseDamping { .. } => "phase_damping",
            NoiseChannel::Kraus { .. } => "kraus",
        }
    }

    /// Number of qubits the channel acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            NoiseChannel::TwoQubitDepolarizing { .. } | NoiseChannel::TwoQubitDephasing { .. } => 2,
            NoiseChannel::Kraus { operators } => operators
                .first()
                .and_then(SquareMatrix::num_qubits)
                .unwrap_or(1),
            _ => 1,
        }
    }

    /// The scalar parameters of the channel, in declaration order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            NoiseChannel::BitFlip { probability }
            | NoiseChannel::PhaseFlip { probability }
            | NoiseChannel::Depolarizing { probability }
            | NoiseChannel::TwoQubitDepolarizing { probability }
            | NoiseChannel::TwoQubitDephasing { probability } => vec![*probability],
            NoiseChannel::PauliChannel { px, py, pz } => vec![*px, *py, *pz],
            NoiseChannel::AmplitudeDamping { gamma } | NoiseChannel::PhaseDamping { gamma } => {
                vec![*gamma]
            }
            NoiseChannel::GeneralizedAmplitudeDamping { gamma, probability } => {
                vec![*gamma, *probability]
            }
            NoiseChannel::Kraus { .. } => vec![],
        }
    }
}
