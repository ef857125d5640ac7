//! Operators applied by circuit instructions.

use serde::{Deserialize, Serialize};

use crate::matrix::SquareMatrix;
use crate::noise::NoiseChannel;

/// A named standard-library gate with resolved parameters.
///
/// The name → unitary registry lives in the simulation backend; the IR
/// carries the algebraic form only. `power` is the gate exponent accumulated
/// from `pow`/`inv` modifiers: `inv` negates it, `pow(x)` multiplies by `x`,
/// and the backend raises the unitary accordingly (exactly for the familiar
/// half/quarter-turn families, numerically otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    /// Lower-case gate name, e.g. `"rx"`.
    pub name: String,
    /// Fully-resolved numeric parameters.
    pub params: Vec<f64>,
    /// Algebraic exponent, 1.0 for a plain application.
    pub power: f64,
}

impl GateOp {
    /// A plain (power 1) gate application.
    pub fn new(name: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            params,
            power: 1.0,
        }
    }
}

/// What an instruction applies to its targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// A named gate.
    Gate(GateOp),

    /// A control-wrapped operator. `pattern[i]` is the required state of
    /// the i-th control qubit (1 = ctrl, 0 = negctrl); control qubits are
    /// prepended to the instruction's target list in pattern order.
    Control {
        inner: Box<Operator>,
        pattern: Vec<u8>,
    },

    /// A verbatim unitary matrix from a `unitary` pragma.
    Unitary(SquareMatrix),

    /// A noise channel from a `noise` pragma.
    Noise(NoiseChannel),

    /// Global phase `e^{iθ}` over every allocated qubit.
    GPhase { angle: f64 },
}

impl Operator {
    /// Name of the underlying operation, unwrapping control layers.
    pub fn name(&self) -> &str {
        match self {
            Operator::Gate(g) => &g.name,
            Operator::Control { inner, .. } => inner.name(),
            Operator::Unitary(_) => "unitary",
            Operator::Noise(n) => n.name(),
            Operator::GPhase { .. } => "gphase",
        }
    }

    /// Resolved numeric parameters of the underlying operation.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Operator::Gate(g) => g.params.clone(),
            Operator::Control { inner, .. } => inner.parameters(),
            Operator::Unitary(_) => vec![],
            Operator::Noise(n) => n.parameters(),
            Operator::GPhase { angle } => vec![*angle],
        }
    }

    /// The control bit pattern, empty for unwrapped operators.
    pub fn control_pattern(&self) -> &[u8] {
        match self {
            Operator::Control { pattern, .. } => pattern,
            _ => &[],
        }
    }

    /// Accumulated gate exponent, 1.0 where the notion does not apply.
    pub fn power(&self) -> f64 {
        match self {
            Operator::Gate(g) => g.power,
            Operator::Control { inner, .. } => inner.power(),
            _ => 1.0,
        }
    }

    /// Check whether this is a noise channel.
    pub fn is_noise(&self) -> bool {
        matches!(self, Operator::Noise(_))
    }

    /// Wrap in one more control layer; the new control is outermost and its
    /// qubit is expected first in the target list.
    #[must_use]
    pub fn controlled(self, bit: u8) -> Self {
        match self {
            Operator::Control { inner, mut pattern } => {
                pattern.insert(0, bit);
                Operator::Control { inner, pattern }
            }
            other => Operator::Control {
                inner: Box::new(other),
                pattern: vec![bit],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_accessors() {
        let op = Operator::Gate(GateOp::new("rx", vec![0.5]));
        assert_eq!(op.name(), "rx");
        assert_eq!(op.parameters(), vec![0.5]);
        assert_eq!(op.power(), 1.0);
        assert!(op.control_pattern().is_empty());
    }

    #[test]
    fn test_control_merging() {
        let op = Operator::Gate(GateOp::new("x", vec![]))
            .controlled(0)
            .controlled(1);
        // Outermost control first.
        assert_eq!(op.control_pattern(), &[1, 0]);
        assert_eq!(op.name(), "x");
    }

    #[test]
    fn test_gphase_parameters() {
        let op = Operator::GPhase {
            angle: -std::f64::consts::FRAC_PI_2,
        };
        assert_eq!(op.parameters(), vec![-std::f64::consts::FRAC_PI_2]);
        assert_eq!(op.name(), "gphase");
    }
}
