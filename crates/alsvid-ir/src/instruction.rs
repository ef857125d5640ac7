//! Circuit instructions combining operators with their targets.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::matrix::SquareMatrix;
use crate::noise::NoiseChannel;
use crate::operator::{GateOp, Operator};
use crate::qubit::QubitId;

/// A single instruction: one operator applied to an ordered target list.
///
/// Control qubits of a wrapped operator come first in `targets`, in the
/// order of the operator's control pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operator to apply.
    pub operator: Operator,
    /// Target qubits, controls first.
    pub targets: Vec<QubitId>,
}

impl Instruction {
    /// Create an instruction from any operator.
    pub fn new(operator: Operator, targets: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            operator,
            targets: targets.into_iter().collect(),
        }
    }

    /// A named-gate instruction with resolved parameters.
    pub fn gate(
        name: impl Into<String>,
        params: Vec<f64>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self::new(Operator::Gate(GateOp::new(name, params)), targets)
    }

    /// A noise channel instruction.
    pub fn noise(channel: NoiseChannel, targets: impl IntoIterator<Item = QubitId>) -> Self {
        Self::new(Operator::Noise(channel), targets)
    }

    /// A verbatim-unitary instruction; the matrix must fit the target count.
    pub fn unitary(
        matrix: SquareMatrix,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<Self> {
        let targets: Vec<QubitId> = targets.into_iter().collect();
        matrix.check_targets(targets.len())?;
        Ok(Self::new(Operator::Unitary(matrix), targets))
    }

    /// Check that every target is addressable in a circuit of
    /// `qubit_count` qubits and that control patterns fit.
    pub fn validate(&self, qubit_count: u32) -> IrResult<()> {
        for &target in &self.targets {
            if target.0 >= qubit_count {
                return Err(IrError::TargetOutOfRange {
                    target,
                    qubit_count,
                });
            }
        }
        let controls = self.operator.control_pattern().len();
        if controls > self.targets.len() {
            return Err(IrError::TargetCountMismatch {
                name: self.operator.name().to_string(),
                expected: controls,
                got: self.targets.len(),
            });
        }
        Ok(())
    }
}
