//! Sized classical types and their value storage.
//!
//! Widths are concrete by the time a type reaches this module; the parser
//! keeps designators as expressions and the visitor resolves them. Bit
//! width matters for slice semantics: indexing an `int[n]`/`uint[n]` reads
//! the i-th most-significant bit, while bit vectors and arrays are plain
//! element access.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ElabError, ElabResult};
use alsvid_ir::Parameter;

/// Platform default widths for unsized declarations.
pub const DEFAULT_INT_WIDTH: u32 = 32;
pub const DEFAULT_FLOAT_WIDTH: u32 = 64;

/// A fully-resolved classical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassicalType {
    /// A single bit (`None`) or a bit vector of the given width.
    Bit { size: Option<u32> },
    /// Signed integer of the given bit width.
    Int { size: u32 },
    /// Unsigned integer of the given bit width.
    Uint { size: u32 },
    /// IEEE float of the given bit width.
    Float { size: u32 },
    /// Angle of the given bit width, stored as a float.
    Angle { size: u32 },
    /// Complex number; the size is the component float width.
    Complex { size: u32 },
    /// Boolean.
    Bool,
    /// Row-major array with a fixed shape.
    Array {
        elem: Box<ClassicalType>,
        dims: Vec<u32>,
    },
}

impl ClassicalType {
    /// Bit width for the types that have one.
    pub fn width(&self) -> Option<u32> {
        match self {
            ClassicalType::Bit { size } => *size,
            ClassicalType::Int { size }
            | ClassicalType::Uint { size }
            | ClassicalType::Float { size }
            | ClassicalType::Angle { size }
            | ClassicalType::Complex { size } => Some(*size),
            ClassicalType::Bool | ClassicalType::Array { .. } => None,
        }
    }

    /// Default-initialized value, `None` for scalars that must be written
    /// before first use.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            ClassicalType::Bit { size: None } => Some(Value::Bool(false)),
            ClassicalType::Bit { size: Some(n) } => Some(Value::Bits(vec![false; *n as usize])),
            ClassicalType::Array { elem, dims } => Some(build_array(elem, dims)),
            _ => None,
        }
    }
}

fn build_array(elem: &ClassicalType, dims: &[u32]) -> Value {
    match dims.split_first() {
        None => elem.default_value().unwrap_or(Value::Int(0)),
        Some((first, rest)) => {
            Value::Array((0..*first).map(|_| build_array(elem, rest)).collect())
        }
    }
}

impl fmt::Display for ClassicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassicalType::Bit { size: None } => write!(f, "bit"),
            ClassicalType::Bit { size: Some(n) } => write!(f, "bit[{n}]"),
            ClassicalType::Int { size } => write!(f, "int[{size}]"),
            ClassicalType::Uint { size } => write!(f, "uint[{size}]"),
            ClassicalType::Float { size } => write!(f, "float[{size}]"),
            ClassicalType::Angle { size } => write!(f, "angle[{size}]"),
            ClassicalType::Complex { size } => write!(f, "complex[float[{size}]]"),
            ClassicalType::Bool => write!(f, "bool"),
            ClassicalType::Array { elem, dims } => {
                write!(f, "array[{elem}")?;
                for d in dims {
                    write!(f, ", {d}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    /// Signed and unsigned integers; the declared type tracks the width.
    Int(i128),
    Float(f64),
    Complex(Complex64),
    /// Bit vector, element 0 first.
    Bits(Vec<bool>),
    /// Nested row-major array.
    Array(Vec<Value>),
    /// A range with inclusive bounds, not yet flattened.
    Range { start: i64, step: i64, stop: i64 },
    /// A list of resolved qubit indices.
    Qubits(Vec<u32>),
    /// A symbolic angle inside a gate definition body.
    Param(Parameter),
    /// A string (amplitude basis states).
    Str(String),
}

impl Value {
    /// Kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Bits(_) => "bit vector",
            Value::Array(_) => "array",
            Value::Range { .. } => "range",
            Value::Qubits(_) => "qubit register",
            Value::Param(_) => "free parameter",
            Value::Str(_) => "string",
        }
    }

    /// Coerce to an integer; floats are accepted when exact.
    pub fn as_int(&self) -> ElabResult<i64> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Int(v) => Ok(*v as i64),
            Value::Float(v) if v.fract() == 0.0 => Ok(*v as i64),
            Value::Bits(bits) => Ok(bits_to_u64(bits) as i64),
            other => Err(ElabError::TypeMismatch {
                expected: "integer".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Coerce to a float.
    pub fn as_float(&self) -> ElabResult<f64> {
        match self {
            Value::Bool(b) => Ok(f64::from(u8::from(*b))),
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            other => Err(ElabError::TypeMismatch {
                expected: "float".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Coerce to a complex number.
    pub fn as_complex(&self) -> ElabResult<Complex64> {
        match self {
            Value::Complex(c) => Ok(*c),
            other => Ok(Complex64::new(other.as_float()?, 0.0)),
        }
    }

    /// Truthiness: positive numbers, `true`, and bit vectors with any bit
    /// set are truthy.
    pub fn is_truthy(&self) -> ElabResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(v) => Ok(*v > 0),
            Value::Float(v) => Ok(*v > 0.0),
            Value::Bits(bits) => Ok(bits.iter().any(|b| *b)),
            other => Err(ElabError::TypeMismatch {
                expected: "boolean".into(),
                found: other.kind().into(),
            }),
        }
    }

    /// Flatten a range to the integers it denotes (inclusive bounds).
    pub fn collect_range(&self) -> ElabResult<Vec<i64>> {
        match self {
            Value::Range { start, step, stop } => {
                if *step == 0 {
                    return Err(ElabError::TypeMismatch {
                        expected: "non-zero range step".into(),
                        found: "0".into(),
                    });
                }
                let mut out = Vec::new();
                let mut v = *start;
                while (*step > 0 && v <= *stop) || (*step < 0 && v >= *stop) {
                    out.push(v);
                    v += *step;
                }
                Ok(out)
            }
            other => Err(ElabError::TypeMismatch {
                expected: "range".into(),
                found: other.kind().into(),
            }),
        }
    }
}

/// Pack a bit vector (element 0 = most significant) into an integer.
pub fn bits_to_u64(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, b| (acc << 1) | u64::from(*b))
}

/// Unpack the low `width` bits of an integer, most significant first.
pub fn u64_to_bits(value: u64, width: u32) -> Vec<bool> {
    (0..width).rev().map(|i| (value >> i) & 1 == 1).collect()
}

/// Mask an integer value to `width` bits, sign-extending when `signed`.
pub fn truncate_width(value: i128, width: u32, signed: bool) -> i128 {
    if width >= 128 {
        return value;
    }
    let mask = (1i128 << width) - 1;
    let low = value & mask;
    if signed && width > 0 && (low >> (width - 1)) & 1 == 1 {
        low - (1i128 << width)
    } else {
        low
    }
}

/// Coerce a value to a declared type, narrowing integers and filling bit
/// vectors. The returned value is what gets stored.
pub fn coerce(value: Value, ty: &ClassicalType) -> ElabResult<Value> {
    let mismatch = |found: &Value| ElabError::TypeMismatch {
        expected: ty.to_string(),
        found: found.kind().into(),
    };
    match ty {
        ClassicalType::Bool => Ok(Value::Bool(value.is_truthy()?)),
        ClassicalType::Int { size } => {
            let v = value.as_int()?;
            Ok(Value::Int(truncate_width(i128::from(v), *size, true)))
        }
        ClassicalType::Uint { size } => {
            let v = value.as_int()?;
            Ok(Value::Int(truncate_width(i128::from(v), *size, false)))
        }
        ClassicalType::Float { size: _ } | ClassicalType::Angle { size: _ } => match value {
            Value::Param(p) => Ok(Value::Param(p)),
            other => Ok(Value::Float(other.as_float()?)),
        },
        ClassicalType::Complex { size: _ } => Ok(Value::Complex(value.as_complex()?)),
        ClassicalType::Bit { size: None } => match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(v) => Ok(Value::Bool(v != 0)),
            Value::Bits(bits) if bits.len() == 1 => Ok(Value::Bool(bits[0])),
            other => Err(mismatch(&other)),
        },
        ClassicalType::Bit { size: Some(n) } => {
            let n = *n as usize;
            match value {
                Value::Bits(bits) if bits.len() == n => Ok(Value::Bits(bits)),
                Value::Int(v) => Ok(Value::Bits(u64_to_bits(v as u64, n as u32))),
                // Scalar-to-slice broadcast.
                Value::Bool(b) => Ok(Value::Bits(vec![b; n])),
                other => Err(mismatch(&other)),
            }
        }
        ClassicalType::Array { elem, dims } => match value {
            Value::Array(items) => {
                if let Some((first, rest)) = dims.split_first() {
                    if items.len() != *first as usize {
                        return Err(ElabError::TypeMismatch {
                            expected: ty.to_string(),
                            found: format!("array of {} elements", items.len()),
                        });
                    }
                    let inner = if rest.is_empty() {
                        (**elem).clone()
                    } else {
                        ClassicalType::Array {
                            elem: elem.clone(),
                            dims: rest.to_vec(),
                        }
                    };
                    let coerced: ElabResult<Vec<Value>> =
                        items.into_iter().map(|v| coerce(v, &inner)).collect();
                    Ok(Value::Array(coerced?))
                } else {
                    Ok(Value::Array(items))
                }
            }
            other => Err(mismatch(&other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bit_vector() {
        let ty = ClassicalType::Bit { size: Some(4) };
        assert_eq!(ty.default_value(), Some(Value::Bits(vec![false; 4])));
        // Numerics stay uninitialized.
        assert_eq!(ClassicalType::Int { size: 8 }.default_value(), None);
    }

    #[test]
    fn test_bit_packing_msb_first() {
        assert_eq!(bits_to_u64(&[true, false, true]), 0b101);
        assert_eq!(u64_to_bits(0b101, 3), vec![true, false, true]);
    }

    #[test]
    fn test_width_truncation() {
        // 200 wraps to -56 in int[8], stays 200 in uint[8].
        assert_eq!(truncate_width(200, 8, true), -56);
        assert_eq!(truncate_width(200, 8, false), 200);
        assert_eq!(truncate_width(-1, 4, false), 15);
    }

    #[test]
    fn test_coerce_narrowing() {
        let ty = ClassicalType::Uint { size: 4 };
        assert_eq!(coerce(Value::Int(19), &ty).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_coerce_bitstring() {
        let ty = ClassicalType::Bit { size: Some(4) };
        let v = coerce(Value::Int(0b0110), &ty).unwrap();
        assert_eq!(v, Value::Bits(vec![false, true, true, false]));
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Int(2).is_truthy().unwrap());
        assert!(!Value::Int(-3).is_truthy().unwrap());
        assert!(Value::Bits(vec![false, true]).is_truthy().unwrap());
        assert!(!Value::Bits(vec![false, false]).is_truthy().unwrap());
    }

    #[test]
    fn test_range_collection() {
        let r = Value::Range {
            start: 0,
            step: 2,
            stop: 6,
        };
        assert_eq!(r.collect_range().unwrap(), vec![0, 2, 4, 6]);

        let down = Value::Range {
            start: 3,
            step: -1,
            stop: 1,
        };
        assert_eq!(down.collect_range().unwrap(), vec![3, 2, 1]);
    }
}
