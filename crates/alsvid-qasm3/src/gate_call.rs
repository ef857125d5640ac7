//! Gate templates and the gate-call engine.
//!
//! Every gate, builtin or user-defined, is stored as a template: a list
//! of parametric instructions over template-local qubit indices, with
//! angles as [`Parameter`] expressions over the gate's free parameters.
//! A call site binds parameters, lowers the modifier chain, broadcasts
//! register targets and emits concrete instructions.

use rustc_hash::FxHashMap;

use alsvid_ir::{GateOp, Operator, Parameter};

use crate::ast::{GateCall, GateModifier};
use crate::error::{ElabError, ElabResult};
use crate::visitor::Visitor;

/// Builtin gate table: `(name, classical parameters, qubit targets)`.
///
/// The names follow the Braket native gate set plus the OpenQASM builtin
/// `U`; the unitary definitions live in the simulation backend.
const BUILTIN_GATES: &[(&str, usize, usize)] = &[
    ("U", 3, 1),
    ("i", 0, 1),
    ("h", 0, 1),
    ("x", 0, 1),
    ("y", 0, 1),
    ("z", 0, 1),
    ("s", 0, 1),
    ("si", 0, 1),
    ("t", 0, 1),
    ("ti", 0, 1),
    ("v", 0, 1),
    ("vi", 0, 1),
    ("rx", 1, 1),
    ("ry", 1, 1),
    ("rz", 1, 1),
    ("phaseshift", 1, 1),
    ("gpi", 1, 1),
    ("gpi2", 1, 1),
    ("prx", 2, 1),
    ("cnot", 0, 2),
    ("cx", 0, 2),
    ("cy", 0, 2),
    ("cz", 0, 2),
    ("cv", 0, 2),
    ("swap", 0, 2),
    ("iswap", 0, 2),
    ("pswap", 1, 2),
    ("xy", 1, 2),
    ("ecr", 0, 2),
    ("cphaseshift", 1, 2),
    ("cphaseshift00", 1, 2),
    ("cphaseshift01", 1, 2),
    ("cphaseshift10", 1, 2),
    ("xx", 1, 2),
    ("yy", 1, 2),
    ("zz", 1, 2),
    ("ms", 3, 2),
    ("ccnot", 0, 3),
    ("ccx", 0, 3),
    ("cswap", 0, 3),
];

/// An operator inside a gate template; angles may still be symbolic.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateOperator {
    Gate {
        name: String,
        params: Vec<Parameter>,
        power: f64,
    },
    Control {
        inner: Box<TemplateOperator>,
        pattern: Vec<u8>,
    },
    GPhase {
        angle: Parameter,
    },
}

impl TemplateOperator {
    /// Substitute free parameters from `bindings`.
    fn bind(&self, bindings: &FxHashMap<String, Parameter>) -> Self {
        let lookup = |name: &str| bindings.get(name).cloned();
        match self {
            TemplateOperator::Gate {
                name,
                params,
                power,
            } => TemplateOperator::Gate {
                name: name.clone(),
                params: params.iter().map(|p| p.bind_all(&lookup)).collect(),
                power: *power,
            },
            TemplateOperator::Control { inner, pattern } => TemplateOperator::Control {
                inner: Box::new(inner.bind(bindings)),
                pattern: pattern.clone(),
            },
            TemplateOperator::GPhase { angle } => TemplateOperator::GPhase {
                angle: angle.bind_all(&lookup),
            },
        }
    }

    /// Raise to a power: gate exponents multiply, global phases scale.
    fn powered(self, exponent: f64) -> Self {
        match self {
            TemplateOperator::Gate {
                name,
                params,
                power,
            } => TemplateOperator::Gate {
                name,
                params,
                power: power * exponent,
            },
            TemplateOperator::Control { inner, pattern } => TemplateOperator::Control {
                inner: Box::new(inner.powered(exponent)),
                pattern,
            },
            TemplateOperator::GPhase { angle } => TemplateOperator::GPhase {
                angle: (angle * Parameter::constant(exponent)).simplify(),
            },
        }
    }

    /// Adjoint: negate the exponent (the sequence reversal happens at the
    /// instruction level).
    fn adjoint(self) -> Self {
        match self {
            TemplateOperator::Gate {
                name,
                params,
                power,
            } => TemplateOperator::Gate {
                name,
                params,
                power: -power,
            },
            TemplateOperator::Control { inner, pattern } => TemplateOperator::Control {
                inner: Box::new(inner.adjoint()),
                pattern,
            },
            TemplateOperator::GPhase { angle } => TemplateOperator::GPhase {
                angle: (-angle).simplify(),
            },
        }
    }

    /// Wrap in one more (outermost) control layer.
    fn controlled(self, bit: u8) -> Self {
        match self {
            TemplateOperator::Control { inner, mut pattern } => {
                pattern.insert(0, bit);
                TemplateOperator::Control { inner, pattern }
            }
            other => TemplateOperator::Control {
                inner: Box::new(other),
                pattern: vec![bit],
            },
        }
    }

    /// Convert to an IR operator; every parameter must be bound by now.
    pub(crate) fn resolved(&self) -> ElabResult<Operator> {
        Ok(match self {
            TemplateOperator::Gate {
                name,
                params,
                power,
            } => {
                let params: Result<Vec<f64>, _> =
                    params.iter().map(Parameter::resolved).collect();
                Operator::Gate(GateOp {
                    name: name.clone(),
                    params: params?,
                    power: *power,
                })
            }
            TemplateOperator::Control { inner, pattern } => Operator::Control {
                inner: Box::new(inner.resolved()?),
                pattern: pattern.clone(),
            },
            TemplateOperator::GPhase { angle } => Operator::GPhase {
                angle: angle.resolved()?,
            },
        })
    }
}

/// A parametric instruction over template-local qubit indices. A global
/// phase keeps an empty target list until emission.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TemplateInstruction {
    pub operator: TemplateOperator,
    pub targets: Vec<usize>,
}

/// A registered gate definition.
#[derive(Debug, Clone)]
pub(crate) struct GateTemplate {
    pub params: Vec<String>,
    pub qubit_count: usize,
    pub body: Vec<TemplateInstruction>,
}

/// The initial gate registry: every builtin as a single-instruction
/// template over symbolic parameters, so call binding and modifier
/// lowering treat builtin and user gates uniformly.
pub(crate) fn builtin_registry() -> FxHashMap<String, GateTemplate> {
    let mut registry = FxHashMap::default();
    for &(name, n_params, n_qubits) in BUILTIN_GATES {
        let params: Vec<String> = (0..n_params).map(|i| format!("p{i}")).collect();
        let body = vec![TemplateInstruction {
            operator: TemplateOperator::Gate {
                name: name.to_string(),
                params: params.iter().map(|p| Parameter::free(p.clone())).collect(),
                power: 1.0,
            },
            targets: (0..n_qubits).collect(),
        }];
        registry.insert(
            name.to_string(),
            GateTemplate {
                params,
                qubit_count: n_qubits,
                body,
            },
        );
    }
    registry
}

/// A lowered gate modifier; `ctrl(k)` arrives already replicated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Modifier {
    Pow(f64),
    Inv,
    Ctrl,
    NegCtrl,
}

impl Visitor {
    /// Elaborate a gate call into concrete (or, inside a gate body,
    /// parametric) instructions.
    pub(crate) fn apply_gate_call(&mut self, call: &GateCall) -> ElabResult<()> {
        let modifiers = self.lower_modifiers(&call.modifiers)?;
        let n_ctrl = modifiers
            .iter()
            .filter(|m| matches!(m, Modifier::Ctrl | Modifier::NegCtrl))
            .count();

        if call.name == "gphase" {
            return self.apply_gphase(call, &modifiers, n_ctrl);
        }

        let template = self
            .gate_template(&call.name)
            .ok_or_else(|| ElabError::UnknownGate(call.name.clone()))?;

        if call.params.len() != template.params.len() {
            return Err(ElabError::GateParamCount {
                gate: call.name.clone(),
                expected: template.params.len(),
                got: call.params.len(),
            });
        }

        // Resolve each target position to its index list; the engine knows
        // the arity per position from the lengths.
        let lists = self.resolve_target_lists(&call.targets)?;
        let expected = n_ctrl + template.qubit_count;
        if lists.len() != expected {
            return Err(ElabError::GateQubitCount {
                gate: call.name.clone(),
                expected,
                got: lists.len(),
            });
        }

        // Bind classical arguments by parameter name; gate-body qubit
        // indices shift past the control block.
        let mut bindings = FxHashMap::default();
        for (param, expr) in template.params.iter().zip(&call.params) {
            let value = self.eval(expr)?;
            bindings.insert(param.clone(), self.value_to_param(value)?);
        }
        let mut seq: Vec<TemplateInstruction> = template
            .body
            .iter()
            .map(|inst| TemplateInstruction {
                operator: inst.operator.bind(&bindings),
                targets: inst.targets.iter().map(|t| t + n_ctrl).collect(),
            })
            .collect();

        apply_modifiers(&mut seq, &modifiers, n_ctrl);
        self.broadcast_emit(&call.name, seq, &lists)
    }

    /// `gphase(θ)` applies to every allocated qubit; with control
    /// modifiers the control qubits become the instruction targets and the
    /// phase stays zero-qubit underneath.
    fn apply_gphase(
        &mut self,
        call: &GateCall,
        modifiers: &[Modifier],
        n_ctrl: usize,
    ) -> ElabResult<()> {
        if call.params.len() != 1 {
            return Err(ElabError::GateParamCount {
                gate: "gphase".into(),
                expected: 1,
                got: call.params.len(),
            });
        }
        if call.targets.len() < n_ctrl {
            return Err(ElabError::GateQubitCount {
                gate: "gphase".into(),
                expected: n_ctrl,
                got: call.targets.len(),
            });
        }

        let value = self.eval(&call.params[0])?;
        let angle = self.value_to_param(value)?;
        let lists = self.resolve_target_lists(&call.targets[..n_ctrl])?;

        let mut seq = vec![TemplateInstruction {
            operator: TemplateOperator::GPhase { angle },
            targets: vec![],
        }];
        apply_modifiers(&mut seq, modifiers, n_ctrl);
        self.broadcast_emit("gphase", seq, &lists)
    }

    /// Evaluate a modifier chain, expanding `ctrl(k)` into `k` layers.
    fn lower_modifiers(&mut self, modifiers: &[GateModifier]) -> ElabResult<Vec<Modifier>> {
        let mut lowered = Vec::new();
        for modifier in modifiers {
            match modifier {
                GateModifier::Pow(e) => {
                    let value = self.eval(e)?;
                    lowered.push(Modifier::Pow(value.as_float()?));
                }
                GateModifier::Inv => lowered.push(Modifier::Inv),
                GateModifier::Ctrl(count) => {
                    let k = self.modifier_count(count, "ctrl")?;
                    lowered.extend(std::iter::repeat_n(Modifier::Ctrl, k));
                }
                GateModifier::NegCtrl(count) => {
                    let k = self.modifier_count(count, "negctrl")?;
                    lowered.extend(std::iter::repeat_n(Modifier::NegCtrl, k));
                }
            }
        }
        Ok(lowered)
    }

    fn modifier_count(
        &mut self,
        count: &Option<crate::ast::Expression>,
        modifier: &str,
    ) -> ElabResult<usize> {
        let Some(expr) = count else {
            return Ok(1);
        };
        let value = self.eval(expr)?;
        let k = match &value {
            crate::types::Value::Int(v) => *v,
            other => {
                return Err(ElabError::NonIntegerModifier {
                    modifier: modifier.to_string(),
                    got: other.kind().to_string(),
                });
            }
        };
        usize::try_from(k)
            .ok()
            .filter(|k| *k >= 1)
            .ok_or_else(|| ElabError::NonIntegerModifier {
                modifier: modifier.to_string(),
                got: k.to_string(),
            })
    }

    /// Broadcast the bound sequence over register-valued targets and emit.
    fn broadcast_emit(
        &mut self,
        gate: &str,
        seq: Vec<TemplateInstruction>,
        lists: &[Vec<u32>],
    ) -> ElabResult<()> {
        let copies = lists.iter().map(Vec::len).max().unwrap_or(1).max(1);
        if lists.iter().any(|l| l.len() != 1 && l.len() != copies) {
            return Err(ElabError::BroadcastMismatch {
                gate: gate.to_string(),
                lengths: lists.iter().map(Vec::len).collect(),
            });
        }

        tracing::debug!(
            gate,
            instructions = seq.len(),
            copies,
            "expanding gate call"
        );

        for copy in 0..copies {
            let concrete: Vec<u32> = lists
                .iter()
                .map(|l| if l.len() == 1 { l[0] } else { l[copy] })
                .collect();
            for inst in &seq {
                let targets: Vec<u32> = inst.targets.iter().map(|t| concrete[*t]).collect();
                self.sink(inst.operator.clone(), targets)?;
            }
        }
        Ok(())
    }
}

/// Apply a modifier chain innermost-first (reverse of the written order).
/// Each control layer consumes the rightmost unassigned control position,
/// so the outermost written modifier ends up on the leftmost target.
fn apply_modifiers(seq: &mut Vec<TemplateInstruction>, modifiers: &[Modifier], n_ctrl: usize) {
    let mut next_ctrl = n_ctrl;
    for modifier in modifiers.iter().rev() {
        match modifier {
            Modifier::Pow(x) => {
                for inst in seq.iter_mut() {
                    inst.operator = inst.operator.clone().powered(*x);
                }
            }
            Modifier::Inv => {
                seq.reverse();
                for inst in seq.iter_mut() {
                    inst.operator = inst.operator.clone().adjoint();
                }
            }
            Modifier::Ctrl | Modifier::NegCtrl => {
                next_ctrl -= 1;
                let bit = u8::from(matches!(modifier, Modifier::Ctrl));
                for inst in seq.iter_mut() {
                    inst.operator = inst.operator.clone().controlled(bit);
                    inst.targets.insert(0, next_ctrl);
                }
            }
        }
    }
    debug_assert_eq!(next_ctrl, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(name: &str, power: f64) -> TemplateOperator {
        TemplateOperator::Gate {
            name: name.into(),
            params: vec![],
            power,
        }
    }

    #[test]
    fn test_builtin_registry_shape() {
        let registry = builtin_registry();
        let rx = registry.get("rx").unwrap();
        assert_eq!(rx.params.len(), 1);
        assert_eq!(rx.qubit_count, 1);
        assert_eq!(rx.body.len(), 1);

        let ccnot = registry.get("ccnot").unwrap();
        assert_eq!(ccnot.qubit_count, 3);
    }

    #[test]
    fn test_bind_through_arithmetic() {
        let op = TemplateOperator::Gate {
            name: "rx".into(),
            params: vec![Parameter::free("theta") / Parameter::constant(2.0)],
            power: 1.0,
        };
        let mut bindings = FxHashMap::default();
        bindings.insert("theta".to_string(), Parameter::constant(1.0));
        match op.bind(&bindings) {
            TemplateOperator::Gate { params, .. } => {
                assert_eq!(params[0], Parameter::Constant(0.5));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_pow_and_inverse_compose() {
        let op = gate("x", 1.0).powered(0.5).adjoint();
        match op {
            TemplateOperator::Gate { power, .. } => assert_eq!(power, -0.5),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_inverse_reverses_sequence() {
        let mut seq = vec![
            TemplateInstruction {
                operator: gate("s", 1.0),
                targets: vec![0],
            },
            TemplateInstruction {
                operator: gate("t", 1.0),
                targets: vec![0],
            },
        ];
        apply_modifiers(&mut seq, &[Modifier::Inv], 0);
        assert_eq!(seq[0].operator, gate("t", -1.0));
        assert_eq!(seq[1].operator, gate("s", -1.0));
    }

    #[test]
    fn test_control_order_matches_written_chain() {
        // ctrl @ negctrl @ g q0, q1, q2: q0 is the positive control.
        let mut seq = vec![TemplateInstruction {
            operator: gate("x", 1.0),
            targets: vec![2],
        }];
        apply_modifiers(&mut seq, &[Modifier::Ctrl, Modifier::NegCtrl], 2);
        match &seq[0].operator {
            TemplateOperator::Control { pattern, .. } => {
                assert_eq!(pattern, &[1, 0]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(seq[0].targets, vec![0, 1, 2]);
    }

    #[test]
    fn test_ctrl_on_gphase_keeps_phase_zero_qubit() {
        let mut seq = vec![TemplateInstruction {
            operator: TemplateOperator::GPhase {
                angle: Parameter::constant(0.5),
            },
            targets: vec![],
        }];
        apply_modifiers(&mut seq, &[Modifier::Ctrl], 1);
        // The control qubit is the only target; the phase itself stays
        // target-less.
        assert_eq!(seq[0].targets, vec![0]);
        assert!(matches!(
            &seq[0].operator,
            TemplateOperator::Control { inner, pattern }
                if pattern == &[1] && matches!(**inner, TemplateOperator::GPhase { .. })
        ));
    }
}
