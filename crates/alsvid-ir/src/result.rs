//! Result requests attached to a circuit by result pragmas.

use serde::{Deserialize, Serialize};

use crate::observable::Observable;
use crate::qubit::QubitId;

/// A requested simulation result.
///
/// `targets: None` means "all allocated qubits", resolved by the consumer
/// once the final qubit count is known to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultSpec {
    /// The full state vector.
    StateVector,

    /// Amplitudes of the listed computational basis states.
    Amplitude { states: Vec<String> },

    /// Measurement probabilities over the target qubits.
    Probability { targets: Option<Vec<QubitId>> },

    /// Reduced density matrix over the target qubits.
    DensityMatrix { targets: Option<Vec<QubitId>> },

    /// Expectation value of an observable.
    Expectation {
        observable: Observable,
        targets: Option<Vec<QubitId>>,
    },

    /// Variance of an observable.
    Variance {
        observable: Observable,
        targets: Option<Vec<QubitId>>,
    },

    /// Per-shot samples of an observable.
    Sample {
        observable: Observable,
        targets: Option<Vec<QubitId>>,
    },
}

impl ResultSpec {
    /// Wire name of the result type, as spelled in result pragmas.
    pub fn name(&self) -> &'static str {
        match self {
            ResultSpec::StateVector => "state_vector",
            ResultSpec::Amplitude { .. } => "amplitude",
            ResultSpec::Probability { .. } => "probability",
            ResultSpec::DensityMatrix { .. } => "density_matrix",
            ResultSpec::Expectation { .. } => "expectation",
            ResultSpec::Variance { .. } => "variance",
            ResultSpec::Sample { .. } => "sample",
        }
    }

    /// Explicit targets, if the request names any.
    pub fn targets(&self) -> Option<&[QubitId]> {
        match self {
            ResultSpec::StateVector | ResultSpec::Amplitude { .. } => None,
            ResultSpec::Probability { targets }
            | ResultSpec::DensityMatrix { targets }
            | ResultSpec::Expectation { targets, .. }
            | ResultSpec::Variance { targets, .. }
            | ResultSpec::Sample { targets, .. } => targets.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(ResultSpec::StateVector.name(), "state_vector");
        assert_eq!(
            ResultSpec::Probability { targets: None }.name(),
            "probability"
        );
    }

    #[test]
    fn test_targets_accessor() {
        let spec = ResultSpec::DensityMatrix {
            targets: Some(vec![QubitId(1), QubitId(0)]),
        };
        assert_eq!(spec.targets(), Some(&[QubitId(1), QubitId(0)][..]));

        let all = ResultSpec::Probability { targets: None };
        assert_eq!(all.targets(), None);
    }
}
