//! Builtin classical functions.
//!
//! Numeric builtins take their scalar arity and broadcast element-wise over
//! array arguments; `sizeof` is the one builtin that inspects its argument
//! unflattened.

use crate::error::{ElabError, ElabResult};
use crate::types::Value;

/// Dispatch a builtin call. Returns `None` for names that are not builtins
/// so the caller can try user-defined functions.
pub(crate) fn call_builtin(name: &str, args: &[Value]) -> Option<ElabResult<Value>> {
    let result = match name {
        "arccos" => unary(name, args, f64::acos),
        "arcsin" => unary(name, args, f64::asin),
        "arctan" => unary(name, args, f64::atan),
        "ceiling" => unary(name, args, f64::ceil),
        "floor" => unary(name, args, f64::floor),
        "cos" => unary(name, args, f64::cos),
        "sin" => unary(name, args, f64::sin),
        "tan" => unary(name, args, f64::tan),
        "exp" => unary(name, args, f64::exp),
        "log" => unary(name, args, f64::ln),
        "sqrt" => unary(name, args, f64::sqrt),
        "mod" => binary_mod(name, args),
        "pow" => binary_pow(name, args),
        "popcount" => popcount(name, args),
        "sizeof" => sizeof(name, args),
        _ => return None,
    };
    Some(result)
}

fn arity(name: &str, args: &[Value], expected: usize) -> ElabResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ElabError::FunctionArgCount {
            function: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> ElabResult<Value> {
    arity(name, args, 1)?;
    map_elementwise(&args[0], &f)
}

fn map_elementwise(value: &Value, f: &fn(f64) -> f64) -> ElabResult<Value> {
    match value {
        Value::Array(items) => {
            let mapped: ElabResult<Vec<Value>> =
                items.iter().map(|v| map_elementwise(v, f)).collect();
            Ok(Value::Array(mapped?))
        }
        scalar => Ok(Value::Float(f(scalar.as_float()?))),
    }
}

/// Floored modulus: `mod(-7, 3) == 2`.
fn binary_mod(name: &str, args: &[Value]) -> ElabResult<Value> {
    arity(name, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(ElabError::TypeMismatch {
                    expected: "non-zero modulus".into(),
                    found: "0".into(),
                });
            }
            Ok(Value::Int(a.rem_euclid(*b)))
        }
        (a, b) => {
            let (a, b) = (a.as_float()?, b.as_float()?);
            Ok(Value::Float(a - b * (a / b).floor()))
        }
    }
}

fn binary_pow(name: &str, args: &[Value]) -> ElabResult<Value> {
    arity(name, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => {
            let exp = u32::try_from(*b).map_err(|_| ElabError::TypeMismatch {
                expected: "small integer exponent".into(),
                found: b.to_string(),
            })?;
            Ok(Value::Int(a.pow(exp)))
        }
        (a, b) => Ok(Value::Float(a.as_float()?.powf(b.as_float()?))),
    }
}

fn popcount(name: &str, args: &[Value]) -> ElabResult<Value> {
    arity(name, args, 1)?;
    match &args[0] {
        Value::Bits(bits) => Ok(Value::Int(i128::from(
            bits.iter().filter(|b| **b).count() as u32,
        ))),
        Value::Int(v) => Ok(Value::Int(i128::from((*v as u128).count_ones()))),
        other => Err(ElabError::TypeMismatch {
            expected: "bit vector or integer".into(),
            found: other.kind().into(),
        }),
    }
}

/// `sizeof(array)` or `sizeof(array, dim)`.
fn sizeof(name: &str, args: &[Value]) -> ElabResult<Value> {
    if args.is_empty() || args.len() > 2 {
        return Err(ElabError::FunctionArgCount {
            function: name.to_string(),
            expected: 1,
            got: args.len(),
        });
    }
    let dim = match args.get(1) {
        Some(v) => v.as_int()?,
        None => 0,
    };
    let mut current = &args[0];
    for _ in 0..dim {
        match current {
            Value::Array(items) => {
                current = items.first().ok_or_else(|| ElabError::IndexOutOfRange {
                    name: name.to_string(),
                    index: dim,
                    size: 0,
                })?;
            }
            other => {
                return Err(ElabError::TypeMismatch {
                    expected: "array".into(),
                    found: other.kind().into(),
                });
            }
        }
    }
    match current {
        Value::Array(items) => Ok(Value::Int(items.len() as i128)),
        Value::Bits(bits) => Ok(Value::Int(bits.len() as i128)),
        other => Err(ElabError::TypeMismatch {
            expected: "array".into(),
            found: other.kind().into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn call(name: &str, args: &[Value]) -> Value {
        call_builtin(name, args).expect("builtin").expect("ok")
    }

    #[test]
    fn test_trig() {
        assert_eq!(call("cos", &[Value::Float(0.0)]), Value::Float(1.0));
        let v = call("arccos", &[Value::Float(-1.0)]);
        assert!(matches!(v, Value::Float(x) if (x - PI).abs() < 1e-12));
    }

    #[test]
    fn test_broadcast_over_array() {
        let arr = Value::Array(vec![Value::Float(0.0), Value::Float(1.0)]);
        match call("exp", &[arr]) {
            Value::Array(items) => {
                assert!(matches!(items[0], Value::Float(x) if (x - 1.0).abs() < 1e-12));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_mod_floored() {
        assert_eq!(
            call("mod", &[Value::Int(-7), Value::Int(3)]),
            Value::Int(2)
        );
    }

    #[test]
    fn test_pow_integer() {
        assert_eq!(
            call("pow", &[Value::Int(2), Value::Int(10)]),
            Value::Int(1024)
        );
        assert!(matches!(
            call("pow", &[Value::Int(2), Value::Float(0.5)]),
            Value::Float(x) if (x - std::f64::consts::SQRT_2).abs() < 1e-12
        ));
    }

    #[test]
    fn test_popcount() {
        assert_eq!(call("popcount", &[Value::Int(0b1011)]), Value::Int(3));
        assert_eq!(
            call("popcount", &[Value::Bits(vec![true, false, true])]),
            Value::Int(2)
        );
    }

    #[test]
    fn test_sizeof_dimensions() {
        let inner = Value::Array(vec![Value::Int(0); 3]);
        let outer = Value::Array(vec![inner; 2]);
        assert_eq!(call("sizeof", &[outer.clone()]), Value::Int(2));
        assert_eq!(call("sizeof", &[outer, Value::Int(1)]), Value::Int(3));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(call_builtin("frobnicate", &[]).is_none());
    }

    #[test]
    fn test_arity_error() {
        let err = call_builtin("cos", &[]).unwrap().unwrap_err();
        assert!(matches!(err, ElabError::FunctionArgCount { .. }));
    }
}
