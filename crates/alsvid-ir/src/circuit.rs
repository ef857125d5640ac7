//! The flat circuit record produced by elaboration.

use serde::{Deserialize, Serialize};

use crate::error::IrResult;
use crate::instruction::Instruction;
use crate::qubit::QubitId;
use crate::result::ResultSpec;

/// A fully-elaborated circuit: an ordered instruction stream over a flat
/// qubit address space, plus the result requests collected from pragmas.
///
/// Invariants maintained by [`Circuit::push`]:
/// - every instruction target is `< qubit_count`;
/// - every instruction parameter is a concrete number (templates with free
///   parameters never reach the circuit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of allocated qubits.
    qubit_count: u32,
    /// Instructions in elaborated execution order.
    instructions: Vec<Instruction>,
    /// Result requests in source order.
    results: Vec<ResultSpec>,
    /// Qubits named by `measure` statements, in source order, deduplicated.
    measured_qubits: Vec<QubitId>,
    /// Whether a `verbatim` pragma was seen.
    verbatim: bool,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the qubit address space by `count` qubits, returning the
    /// first newly-allocated index.
    pub fn allocate(&mut self, count: u32) -> QubitId {
        let first = QubitId(self.qubit_count);
        self.qubit_count += count;
        first
    }

    /// Grow the address space so that `target` is addressable. Used for
    /// hardware qubits (`$3`), which address the space directly.
    pub fn ensure_allocated(&mut self, target: QubitId) {
        self.qubit_count = self.qubit_count.max(target.0 + 1);
    }

    /// Append an instruction after validating its targets.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<()> {
        instruction.validate(self.qubit_count)?;
        self.instructions.push(instruction);
        Ok(())
    }

    /// Append a result request.
    pub fn push_result(&mut self, result: ResultSpec) {
        self.results.push(result);
    }

    /// Record a measured qubit (terminal annotation, idempotent).
    pub fn record_measurement(&mut self, qubit: QubitId) {
        if !self.measured_qubits.contains(&qubit) {
            self.measured_qubits.push(qubit);
        }
    }

    /// Record that a `verbatim` pragma was seen.
    pub fn mark_verbatim(&mut self) {
        self.verbatim = true;
    }

    /// Number of allocated qubits.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// The instruction stream, in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The result requests, in source order.
    pub fn results(&self) -> &[ResultSpec] {
        &self.results
    }

    /// Qubits named by `measure` statements.
    pub fn measured_qubits(&self) -> &[QubitId] {
        &self.measured_qubits
    }

    /// Whether a `verbatim` pragma was seen.
    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// All allocated qubit indices in ascending order.
    pub fn all_qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        (0..self.qubit_count).map(QubitId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrError;

    #[test]
    fn test_allocation() {
        let mut circuit = Circuit::new();
        assert_eq!(circuit.allocate(1), QubitId(0));
        assert_eq!(circuit.allocate(4), QubitId(1));
        assert_eq!(circuit.qubit_count(), 5);
    }

    #[test]
    fn test_push_validates_targets() {
        let mut circuit = Circuit::new();
        circuit.allocate(2);
        assert!(circuit.push(Instruction::gate("h", vec![], [QubitId(0)])).is_ok());
        assert!(matches!(
            circuit.push(Instruction::gate("h", vec![], [QubitId(2)])),
            Err(IrError::TargetOutOfRange { .. })
        ));
        assert_eq!(circuit.instructions().len(), 1);
    }

    #[test]
    fn test_hardware_allocation() {
        let mut circuit = Circuit::new();
        circuit.ensure_allocated(QubitId(3));
        assert_eq!(circuit.qubit_count(), 4);
        // Re-addressing a lower qubit does not shrink the space.
        circuit.ensure_allocated(QubitId(1));
        assert_eq!(circuit.qubit_count(), 4);
    }

    #[test]
    fn test_measured_qubits_dedup() {
        let mut circuit = Circuit::new();
        circuit.allocate(2);
        circuit.record_measurement(QubitId(1));
        circuit.record_measurement(QubitId(0));
        circuit.record_measurement(QubitId(1));
        assert_eq!(circuit.measured_qubits(), &[QubitId(1), QubitId(0)]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut circuit = Circuit::new();
        circuit.allocate(2);
        circuit
            .push(Instruction::gate("rx", vec![0.25], [QubitId(1)]))
            .unwrap();
        circuit.push_result(ResultSpec::StateVector);

        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
