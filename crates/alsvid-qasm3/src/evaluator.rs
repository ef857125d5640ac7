//! Expression evaluation against the visitor's scope stack.
//!
//! Dispatch is by expression shape. Identifiers fall back from the
//! classical scope to the qubit registry, so a register name evaluates to
//! its index list. Inside gate bodies, arithmetic over free parameters
//! stays symbolic and collapses at call sites.

use num_complex::Complex64;

use alsvid_ir::{ParamBinOp, Parameter, QubitId};

use crate::ast::{BinaryOp, Expression, LValue, ScalarKind, TypeSpec, UnaryOp};
use crate::builtins;
use crate::error::{ElabError, ElabResult};
use crate::types::{
    ClassicalType, DEFAULT_FLOAT_WIDTH, DEFAULT_INT_WIDTH, Value, coerce, truncate_width,
};
use crate::visitor::Visitor;

/// A resolved index: a single position or a flattened selection.
enum Sel {
    One(usize),
    Many(Vec<usize>),
}

impl Sel {
    fn positions(&self) -> Vec<usize> {
        match self {
            Sel::One(i) => vec![*i],
            Sel::Many(v) => v.clone(),
        }
    }
}

impl Visitor {
    /// Evaluate an expression to a value.
    pub(crate) fn eval(&mut self, expr: &Expression) -> ElabResult<Value> {
        match expr {
            Expression::IntLiteral(v) => Ok(Value::Int(i128::from(*v))),
            Expression::FloatLiteral(v) => Ok(Value::Float(*v)),
            Expression::ImagLiteral(v) => Ok(Value::Complex(Complex64::new(0.0, *v))),
            Expression::BoolLiteral(b) => Ok(Value::Bool(*b)),
            Expression::BitStringLiteral(bits) => Ok(Value::Bits(bits.clone())),
            Expression::StringLiteral(s) => Ok(Value::Str(s.clone())),
            Expression::Irrational(i) => Ok(Value::Float(i.value())),
            Expression::Identifier(name) => self.eval_identifier(name),
            Expression::HardwareQubit(n) => self.hardware_qubit(*n),
            Expression::Index { name, indices } => self.eval_index(name, indices),
            Expression::Range { start, step, stop } => {
                let start = self.eval_opt_int(start.as_deref(), 0)?;
                let step = self.eval_opt_int(step.as_deref(), 1)?;
                let stop = match stop.as_deref() {
                    Some(e) => self.eval(e)?.as_int()?,
                    None => {
                        return Err(ElabError::TypeMismatch {
                            expected: "bounded range".into(),
                            found: "open-ended range".into(),
                        });
                    }
                };
                Ok(Value::Range { start, step, stop })
            }
            Expression::Set(items) | Expression::ArrayLiteral(items) => {
                let values: ElabResult<Vec<Value>> =
                    items.iter().map(|e| self.eval(e)).collect();
                Ok(Value::Array(values?))
            }
            Expression::Unary { op, operand } => {
                let value = self.eval(operand)?;
                apply_unary(*op, value)
            }
            Expression::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply_binary(*op, lhs, rhs)
            }
            Expression::Cast { ty, operand } => {
                let value = self.eval(operand)?;
                let ty = self.resolve_type(ty)?;
                coerce(value, &ty)
            }
            Expression::Call { name, args } => self.eval_call(name, args),
            Expression::Measure(targets) => {
                let qubits = self.resolve_target_lists(targets)?;
                for q in qubits.into_iter().flatten() {
                    self.record_measured(q)?;
                }
                // Measurement outcomes do not feed back into classical
                // values; the placeholder is always false.
                Ok(Value::Bool(false))
            }
        }
    }

    fn eval_opt_int(&mut self, expr: Option<&Expression>, default: i64) -> ElabResult<i64> {
        match expr {
            Some(e) => self.eval(e)?.as_int(),
            None => Ok(default),
        }
    }

    fn eval_identifier(&mut self, name: &str) -> ElabResult<Value> {
        if let Some(var) = self.scopes().get(name) {
            return var
                .value
                .clone()
                .ok_or_else(|| ElabError::Uninitialized(name.to_string()));
        }
        if let Some(register) = self.qubit_register(name) {
            return Ok(Value::Qubits(register));
        }
        Err(ElabError::UndefinedIdentifier(name.to_string()))
    }

    fn hardware_qubit(&mut self, n: u32) -> ElabResult<Value> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported(
                "hardware qubit inside a gate body".into(),
            ));
        }
        self.circuit_mut().ensure_allocated(QubitId(n));
        Ok(Value::Qubits(vec![n]))
    }

    fn eval_index(&mut self, name: &str, indices: &[Expression]) -> ElabResult<Value> {
        if self.scopes().get(name).is_some() {
            let (ty, value) = {
                let var = self.scopes().get(name).expect("checked above");
                let value = var
                    .value
                    .clone()
                    .ok_or_else(|| ElabError::Uninitialized(name.to_string()))?;
                (var.ty.clone(), value)
            };
            return self.index_read(name, &ty, &value, indices);
        }
        if let Some(register) = self.qubit_register(name) {
            if indices.len() != 1 {
                return Err(ElabError::TypeMismatch {
                    expected: "single qubit index".into(),
                    found: format!("{} indices", indices.len()),
                });
            }
            let sel = self.index_selection(&indices[0], register.len(), name)?;
            return Ok(match sel {
                Sel::One(i) => Value::Qubits(vec![register[i]]),
                Sel::Many(positions) => {
                    Value::Qubits(positions.iter().map(|&i| register[i]).collect())
                }
            });
        }
        Err(ElabError::UndefinedIdentifier(name.to_string()))
    }

    /// Resolve one index item against a dimension of `size`. Negative
    /// indices count from the end; a range with an open stop closes at the
    /// declared size minus one.
    fn index_selection(
        &mut self,
        item: &Expression,
        size: usize,
        name: &str,
    ) -> ElabResult<Sel> {
        match item {
            Expression::Range { start, step, stop } => {
                let start = self.eval_opt_int(start.as_deref(), 0)?;
                let step = self.eval_opt_int(step.as_deref(), 1)?;
                let stop = match stop.as_deref() {
                    Some(e) => self.eval(e)?.as_int()?,
                    None => size as i64 - 1,
                };
                let range = Value::Range {
                    start: normalize_index(start, size),
                    step,
                    stop: normalize_index(stop, size),
                };
                let positions: ElabResult<Vec<usize>> = range
                    .collect_range()?
                    .into_iter()
                    .map(|i| check_bounds(name, i, size))
                    .collect();
                Ok(Sel::Many(positions?))
            }
            Expression::Set(items) => {
                let positions: ElabResult<Vec<usize>> = items
                    .iter()
                    .map(|e| {
                        let i = self.eval(e)?.as_int()?;
                        check_bounds(name, normalize_index(i, size), size)
                    })
                    .collect();
                Ok(Sel::Many(positions?))
            }
            other => {
                let value = self.eval(other)?;
                match value {
                    Value::Range { .. } => {
                        let positions: ElabResult<Vec<usize>> = value
                            .collect_range()?
                            .into_iter()
                            .map(|i| check_bounds(name, normalize_index(i, size), size))
                            .collect();
                        Ok(Sel::Many(positions?))
                    }
                    Value::Array(items) => {
                        let positions: ElabResult<Vec<usize>> = items
                            .iter()
                            .map(|v| {
                                check_bounds(name, normalize_index(v.as_int()?, size), size)
                            })
                            .collect();
                        Ok(Sel::Many(positions?))
                    }
                    other => {
                        let i = normalize_index(other.as_int()?, size);
                        Ok(Sel::One(check_bounds(name, i, size)?))
                    }
                }
            }
        }
    }

    fn index_read(
        &mut self,
        name: &str,
        ty: &ClassicalType,
        value: &Value,
        indices: &[Expression],
    ) -> ElabResult<Value> {
        match value {
            Value::Bits(bits) => {
                let sel = self.index_selection(&indices[0], bits.len(), name)?;
                single_dim(name, indices)?;
                Ok(match sel {
                    Sel::One(i) => Value::Bool(bits[i]),
                    Sel::Many(positions) => {
                        Value::Bits(positions.iter().map(|&i| bits[i]).collect())
                    }
                })
            }
            Value::Int(v) => {
                // Bit-extract by most-significant-bit offset.
                let width = ty.width().unwrap_or(DEFAULT_INT_WIDTH) as usize;
                single_dim(name, indices)?;
                let sel = self.index_selection(&indices[0], width, name)?;
                let bit = |i: usize| (*v as u128 >> (width - 1 - i)) & 1 == 1;
                Ok(match sel {
                    Sel::One(i) => Value::Bool(bit(i)),
                    Sel::Many(positions) => {
                        Value::Bits(positions.into_iter().map(bit).collect())
                    }
                })
            }
            Value::Array(items) => {
                let sel = self.index_selection(&indices[0], items.len(), name)?;
                let elem_ty = element_type(ty);
                match sel {
                    Sel::One(i) => {
                        if indices.len() > 1 {
                            self.index_read(name, &elem_ty, &items[i].clone(), &indices[1..])
                        } else {
                            Ok(items[i].clone())
                        }
                    }
                    Sel::Many(positions) => {
                        let mut out = Vec::with_capacity(positions.len());
                        for i in positions {
                            let item = items[i].clone();
                            if indices.len() > 1 {
                                out.push(self.index_read(name, &elem_ty, &item, &indices[1..])?);
                            } else {
                                out.push(item);
                            }
                        }
                        Ok(Value::Array(out))
                    }
                }
            }
            other => Err(ElabError::TypeMismatch {
                expected: "indexable value".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Read the value an assignment target currently denotes.
    pub(crate) fn read_lvalue(&mut self, target: &LValue) -> ElabResult<Value> {
        if target.indices.is_empty() {
            self.scopes().read(&target.name).map(Clone::clone)
        } else {
            self.eval_index(&target.name, &target.indices)
        }
    }

    /// Write through an indexed assignment target, broadcasting scalars
    /// over slice selections.
    pub(crate) fn write_lvalue(&mut self, target: &LValue, value: Value) -> ElabResult<()> {
        let (ty, mut current) = {
            let var = self
                .scopes()
                .get(&target.name)
                .ok_or_else(|| ElabError::UndefinedIdentifier(target.name.clone()))?;
            let current = var
                .value
                .clone()
                .ok_or_else(|| ElabError::Uninitialized(target.name.clone()))?;
            (var.ty.clone(), current)
        };
        let name = target.name.clone();
        self.write_into(&name, &ty, &mut current, &target.indices, value)?;
        self.scopes_mut()
            .get_mut(&name)
            .expect("checked above")
            .value = Some(current);
        Ok(())
    }

    fn write_into(
        &mut self,
        name: &str,
        ty: &ClassicalType,
        current: &mut Value,
        indices: &[Expression],
        value: Value,
    ) -> ElabResult<()> {
        if indices.is_empty() {
            *current = coerce(value, ty)?;
            return Ok(());
        }
        match current {
            Value::Bits(bits) => {
                single_dim(name, indices)?;
                let sel = self.index_selection(&indices[0], bits.len(), name)?;
                write_bit_positions(bits, &sel.positions(), &value)?;
                Ok(())
            }
            Value::Int(v) => {
                single_dim(name, indices)?;
                let width = ty.width().unwrap_or(DEFAULT_INT_WIDTH);
                let sel = self.index_selection(&indices[0], width as usize, name)?;
                let mut bits: Vec<bool> = (0..width as usize)
                    .map(|i| (*v as u128 >> (width as usize - 1 - i)) & 1 == 1)
                    .collect();
                write_bit_positions(&mut bits, &sel.positions(), &value)?;
                let raw = bits.iter().fold(0u128, |acc, b| (acc << 1) | u128::from(*b));
                let signed = matches!(ty, ClassicalType::Int { .. });
                *v = truncate_width(raw as i128, width, signed);
                Ok(())
            }
            Value::Array(items) => {
                let sel = self.index_selection(&indices[0], items.len(), name)?;
                let elem_ty = element_type(ty);
                match sel {
                    Sel::One(i) => {
                        let mut item = items[i].clone();
                        self.write_into(name, &elem_ty, &mut item, &indices[1..], value)?;
                        items[i] = item;
                        Ok(())
                    }
                    Sel::Many(positions) => {
                        let sources: Vec<Value> = match &value {
                            Value::Array(src) if src.len() == positions.len() => src.clone(),
                            scalar => vec![scalar.clone(); positions.len()],
                        };
                        for (i, src) in positions.into_iter().zip(sources) {
                            let mut item = items[i].clone();
                            self.write_into(name, &elem_ty, &mut item, &indices[1..], src)?;
                            items[i] = item;
                        }
                        Ok(())
                    }
                }
            }
            other => Err(ElabError::TypeMismatch {
                expected: "indexable value".into(),
                found: other.kind().into(),
            }),
        }
    }

    fn eval_call(&mut self, name: &str, args: &[Expression]) -> ElabResult<Value> {
        if self.has_function(name) {
            return self.call_function(name, args);
        }
        let values: ElabResult<Vec<Value>> = args.iter().map(|e| self.eval(e)).collect();
        match builtins::call_builtin(name, &values?) {
            Some(result) => result,
            None => Err(ElabError::UnknownFunction(name.to_string())),
        }
    }

    /// Resolve a qubit target expression to its index list.
    pub(crate) fn resolve_qubits(&mut self, expr: &Expression) -> ElabResult<Vec<u32>> {
        match self.eval(expr)? {
            Value::Qubits(indices) => Ok(indices),
            other => Err(ElabError::TypeMismatch {
                expected: "qubit target".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Resolve every target position of a call.
    pub(crate) fn resolve_target_lists(
        &mut self,
        targets: &[Expression],
    ) -> ElabResult<Vec<Vec<u32>>> {
        targets.iter().map(|t| self.resolve_qubits(t)).collect()
    }

    /// Collect the items a `for` loop iterates over.
    pub(crate) fn eval_iterable(&mut self, expr: &Expression) -> ElabResult<Vec<Value>> {
        match self.eval(expr)? {
            value @ Value::Range { .. } => {
                Ok(value.collect_range()?.into_iter().map(|i| Value::Int(i128::from(i))).collect())
            }
            Value::Array(items) => Ok(items),
            Value::Bits(bits) => Ok(bits.into_iter().map(Value::Bool).collect()),
            other => Err(ElabError::TypeMismatch {
                expected: "iterable".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Convert an evaluated value to a (possibly symbolic) gate parameter.
    pub(crate) fn value_to_param(&self, value: Value) -> ElabResult<Parameter> {
        match value {
            Value::Int(v) => Ok(Parameter::constant(v as f64)),
            Value::Float(v) => Ok(Parameter::constant(v)),
            Value::Bool(b) => Ok(Parameter::constant(f64::from(u8::from(b)))),
            Value::Param(p) => Ok(p),
            other => Err(ElabError::TypeMismatch {
                expected: "numeric gate parameter".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Resolve a source-level type to a concrete classical type.
    pub(crate) fn resolve_type(&mut self, ty: &TypeSpec) -> ElabResult<ClassicalType> {
        match ty {
            TypeSpec::Scalar { kind, designator } => {
                let size = match designator {
                    Some(e) => {
                        let v = self.eval(e)?.as_int()?;
                        if v < 1 {
                            return Err(ElabError::TypeMismatch {
                                expected: "positive type width".into(),
                                found: v.to_string(),
                            });
                        }
                        Some(v as u32)
                    }
                    None => None,
                };
                Ok(match kind {
                    ScalarKind::Bit => ClassicalType::Bit { size },
                    ScalarKind::Int => ClassicalType::Int {
                        size: size.unwrap_or(DEFAULT_INT_WIDTH),
                    },
                    ScalarKind::Uint => ClassicalType::Uint {
                        size: size.unwrap_or(DEFAULT_INT_WIDTH),
                    },
                    ScalarKind::Float => ClassicalType::Float {
                        size: size.unwrap_or(DEFAULT_FLOAT_WIDTH),
                    },
                    ScalarKind::Angle => ClassicalType::Angle {
                        size: size.unwrap_or(DEFAULT_FLOAT_WIDTH),
                    },
                    ScalarKind::Complex => ClassicalType::Complex {
                        size: size.unwrap_or(DEFAULT_FLOAT_WIDTH),
                    },
                    ScalarKind::Bool => ClassicalType::Bool,
                })
            }
            TypeSpec::Array { elem, dims } => {
                let elem = Box::new(self.resolve_type(elem)?);
                let dims: ElabResult<Vec<u32>> = dims
                    .iter()
                    .map(|d| {
                        let v = self.eval(d)?.as_int()?;
                        u32::try_from(v).map_err(|_| ElabError::TypeMismatch {
                            expected: "non-negative array dimension".into(),
                            found: v.to_string(),
                        })
                    })
                    .collect();
                Ok(ClassicalType::Array { elem, dims: dims? })
            }
            // Reference arguments accept whatever shape the caller passes.
            TypeSpec::ArrayRef { elem, .. } => Ok(ClassicalType::Array {
                elem: Box::new(self.resolve_type(elem)?),
                dims: vec![],
            }),
        }
    }
}

fn single_dim(name: &str, indices: &[Expression]) -> ElabResult<()> {
    if indices.len() == 1 {
        Ok(())
    } else {
        Err(ElabError::TypeMismatch {
            expected: format!("single index on '{name}'"),
            found: format!("{} indices", indices.len()),
        })
    }
}

fn normalize_index(index: i64, size: usize) -> i64 {
    if index < 0 {
        index + size as i64
    } else {
        index
    }
}

fn check_bounds(name: &str, index: i64, size: usize) -> ElabResult<usize> {
    if index >= 0 && (index as usize) < size {
        Ok(index as usize)
    } else {
        Err(ElabError::IndexOutOfRange {
            name: name.to_string(),
            index,
            size,
        })
    }
}

fn element_type(ty: &ClassicalType) -> ClassicalType {
    match ty {
        ClassicalType::Array { elem, dims } if dims.len() > 1 => ClassicalType::Array {
            elem: elem.clone(),
            dims: dims[1..].to_vec(),
        },
        ClassicalType::Array { elem, .. } => (**elem).clone(),
        other => other.clone(),
    }
}

fn write_bit_positions(bits: &mut [bool], positions: &[usize], value: &Value) -> ElabResult<()> {
    match value {
        Value::Bits(src) if src.len() == positions.len() => {
            for (&i, &b) in positions.iter().zip(src) {
                bits[i] = b;
            }
            Ok(())
        }
        scalar => {
            let b = scalar.is_truthy()?;
            for &i in positions {
                bits[i] = b;
            }
            Ok(())
        }
    }
}

/// Apply a unary operator.
fn apply_unary(op: UnaryOp, value: Value) -> ElabResult<Value> {
    match op {
        UnaryOp::Neg => match value {
            Value::Int(v) => Ok(Value::Int(-v)),
            Value::Float(v) => Ok(Value::Float(-v)),
            Value::Complex(v) => Ok(Value::Complex(-v)),
            Value::Param(p) => Ok(Value::Param((-p).simplify())),
            other => Err(ElabError::TypeMismatch {
                expected: "numeric operand".into(),
                found: other.kind().into(),
            }),
        },
        // `!` on a bit vector asks whether no bit is set.
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy()?)),
        UnaryOp::BitNot => match value {
            Value::Int(v) => Ok(Value::Int(!v)),
            Value::Bits(bits) => Ok(Value::Bits(bits.into_iter().map(|b| !b).collect())),
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ElabError::TypeMismatch {
                expected: "integer or bit vector".into(),
                found: other.kind().into(),
            }),
        },
    }
}

/// Apply a binary operator. Division is always floating, arithmetic over
/// free parameters stays symbolic, bit-vector operators act element-wise.
pub(crate) fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> ElabResult<Value> {
    use BinaryOp::*;

    if matches!(lhs, Value::Param(_)) || matches!(rhs, Value::Param(_)) {
        return symbolic_binary(op, lhs, rhs);
    }

    match op {
        And => Ok(Value::Bool(lhs.is_truthy()? && rhs.is_truthy()?)),
        Or => Ok(Value::Bool(lhs.is_truthy()? || rhs.is_truthy()?)),
        Eq | NotEq | Lt | LtEq | Gt | GtEq => compare(op, &lhs, &rhs),
        BitAnd | BitOr | BitXor => bitwise(op, lhs, rhs),
        Shl | Shr => shift(op, lhs, rhs),
        Add | Sub | Mul | Div | Mod | Pow => arithmetic(op, lhs, rhs),
    }
}

fn symbolic_binary(op: BinaryOp, lhs: Value, rhs: Value) -> ElabResult<Value> {
    let bin_op = match op {
        BinaryOp::Add => ParamBinOp::Add,
        BinaryOp::Sub => ParamBinOp::Sub,
        BinaryOp::Mul => ParamBinOp::Mul,
        BinaryOp::Div => ParamBinOp::Div,
        BinaryOp::Pow => ParamBinOp::Pow,
        other => {
            return Err(ElabError::TypeMismatch {
                expected: "arithmetic over free parameters".into(),
                found: format!("{other:?}"),
            });
        }
    };
    let lhs = param_of(lhs)?;
    let rhs = param_of(rhs)?;
    Ok(Value::Param(
        Parameter::Bin(bin_op, Box::new(lhs), Box::new(rhs)).simplify(),
    ))
}

fn param_of(value: Value) -> ElabResult<Parameter> {
    match value {
        Value::Param(p) => Ok(p),
        Value::Int(v) => Ok(Parameter::constant(v as f64)),
        Value::Float(v) => Ok(Parameter::constant(v)),
        Value::Bool(b) => Ok(Parameter::constant(f64::from(u8::from(b)))),
        other => Err(ElabError::TypeMismatch {
            expected: "numeric parameter".into(),
            found: other.kind().into(),
        }),
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> ElabResult<Value> {
    use BinaryOp::*;

    if matches!(lhs, Value::Complex(_)) || matches!(rhs, Value::Complex(_)) {
        let (a, b) = (lhs.as_complex()?, rhs.as_complex()?);
        return Ok(Value::Complex(match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div => a / b,
            Pow => a.powc(b),
            _ => {
                return Err(ElabError::TypeMismatch {
                    expected: "real operands".into(),
                    found: "complex".into(),
                });
            }
        }));
    }

    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        match op {
            Add => return Ok(Value::Int(a + b)),
            Sub => return Ok(Value::Int(a - b)),
            Mul => return Ok(Value::Int(a * b)),
            Mod => {
                if b == 0 {
                    return Err(ElabError::TypeMismatch {
                        expected: "non-zero divisor".into(),
                        found: "0".into(),
                    });
                }
                return Ok(Value::Int(a % b));
            }
            Pow if b >= 0 => {
                if let Some(v) = u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)) {
                    return Ok(Value::Int(v));
                }
            }
            // Integer division promotes to float.
            Div | Pow => {}
            _ => unreachable!("non-arithmetic operator"),
        }
    }

    let (a, b) = (lhs.as_float()?, rhs.as_float()?);
    Ok(Value::Float(match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => a / b,
        Mod => a % b,
        Pow => a.powf(b),
        _ => unreachable!("non-arithmetic operator"),
    }))
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> ElabResult<Value> {
    use BinaryOp::*;

    if let (Value::Bits(a), Value::Bits(b)) = (lhs, rhs) {
        return match op {
            Eq => Ok(Value::Bool(a == b)),
            NotEq => Ok(Value::Bool(a != b)),
            _ => {
                let (a, b) = (crate::types::bits_to_u64(a), crate::types::bits_to_u64(b));
                ordering(op, a as f64, b as f64)
            }
        };
    }
    if matches!(lhs, Value::Complex(_)) || matches!(rhs, Value::Complex(_)) {
        let (a, b) = (lhs.as_complex()?, rhs.as_complex()?);
        return match op {
            Eq => Ok(Value::Bool(a == b)),
            NotEq => Ok(Value::Bool(a != b)),
            _ => Err(ElabError::TypeMismatch {
                expected: "ordered operands".into(),
                found: "complex".into(),
            }),
        };
    }
    ordering(op, lhs.as_float()?, rhs.as_float()?)
}

fn ordering(op: BinaryOp, a: f64, b: f64) -> ElabResult<Value> {
    use BinaryOp::*;
    Ok(Value::Bool(match op {
        Eq => a == b,
        NotEq => a != b,
        Lt => a < b,
        LtEq => a <= b,
        Gt => a > b,
        GtEq => a >= b,
        _ => unreachable!("non-comparison operator"),
    }))
}

fn bitwise(op: BinaryOp, lhs: Value, rhs: Value) -> ElabResult<Value> {
    use BinaryOp::*;

    match (lhs, rhs) {
        (Value::Bits(a), Value::Bits(b)) => {
            if a.len() != b.len() {
                return Err(ElabError::TypeMismatch {
                    expected: format!("bit vector of length {}", a.len()),
                    found: format!("bit vector of length {}", b.len()),
                });
            }
            let f = |(x, y): (&bool, &bool)| match op {
                BitAnd => *x && *y,
                BitOr => *x || *y,
                BitXor => *x != *y,
                _ => unreachable!("non-bitwise operator"),
            };
            Ok(Value::Bits(a.iter().zip(b.iter()).map(f).collect()))
        }
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BitAnd => a && b,
            BitOr => a || b,
            BitXor => a != b,
            _ => unreachable!("non-bitwise operator"),
        })),
        (lhs, rhs) => {
            let (a, b) = (lhs.as_int()?, rhs.as_int()?);
            Ok(Value::Int(i128::from(match op {
                BitAnd => a & b,
                BitOr => a | b,
                BitXor => a ^ b,
                _ => unreachable!("non-bitwise operator"),
            })))
        }
    }
}

fn shift(op: BinaryOp, lhs: Value, rhs: Value) -> ElabResult<Value> {
    let by = rhs.as_int()?;
    let by = usize::try_from(by).map_err(|_| ElabError::TypeMismatch {
        expected: "non-negative shift amount".into(),
        found: by.to_string(),
    })?;
    match lhs {
        Value::Int(v) => Ok(Value::Int(match op {
            BinaryOp::Shl => v << by,
            _ => v >> by,
        })),
        Value::Bits(mut bits) => {
            // Element 0 is the most significant bit.
            for _ in 0..by.min(bits.len()) {
                match op {
                    BinaryOp::Shl => {
                        bits.remove(0);
                        bits.push(false);
                    }
                    _ => {
                        bits.pop();
                        bits.insert(0, false);
                    }
                }
            }
            Ok(Value::Bits(bits))
        }
        other => Err(ElabError::TypeMismatch {
            expected: "integer or bit vector".into(),
            found: other.kind().into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_division_is_floating() {
        let v = apply_binary(BinaryOp::Div, Value::Int(1), Value::Int(2)).unwrap();
        assert_eq!(v, Value::Float(0.5));
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        assert_eq!(
            apply_binary(BinaryOp::Mul, Value::Int(3), Value::Int(4)).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            apply_binary(BinaryOp::Pow, Value::Int(2), Value::Int(8)).unwrap(),
            Value::Int(256)
        );
    }

    #[test]
    fn test_symbolic_arithmetic() {
        let theta = Value::Param(Parameter::free("theta"));
        match apply_binary(BinaryOp::Div, theta, Value::Int(2)).unwrap() {
            Value::Param(p) => assert!(p.is_symbolic()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_bitvector_elementwise() {
        let a = Value::Bits(vec![true, true, false]);
        let b = Value::Bits(vec![true, false, false]);
        assert_eq!(
            apply_binary(BinaryOp::BitXor, a, b).unwrap(),
            Value::Bits(vec![false, true, false])
        );
    }

    #[test]
    fn test_bitvector_shift() {
        let a = Value::Bits(vec![true, false, true]);
        assert_eq!(
            apply_binary(BinaryOp::Shl, a.clone(), Value::Int(1)).unwrap(),
            Value::Bits(vec![false, true, false])
        );
        assert_eq!(
            apply_binary(BinaryOp::Shr, a, Value::Int(1)).unwrap(),
            Value::Bits(vec![false, true, false])
        );
    }

    #[test]
    fn test_not_on_bits_means_none_set() {
        assert_eq!(
            apply_unary(UnaryOp::Not, Value::Bits(vec![false, false])).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_unary(UnaryOp::Not, Value::Bits(vec![true, false])).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_complex_arithmetic() {
        let a = Value::Complex(Complex64::new(0.0, 1.0));
        let v = apply_binary(BinaryOp::Mul, a.clone(), a).unwrap();
        assert_eq!(v, Value::Complex(Complex64::new(-1.0, 0.0)));
    }
}
