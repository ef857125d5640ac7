//! Symbolic parameter expressions.
//!
//! Gate templates captured from `gate` definitions carry angles that are
//! arithmetic over free parameters; call sites bind the parameters and the
//! expression collapses to a constant. Anything still symbolic when an
//! instruction is emitted is a front-end bug surfaced as
//! [`IrError::UnboundParameter`](crate::error::IrError::UnboundParameter).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::{E, PI, TAU};
use std::fmt;

use crate::error::{IrError, IrResult};

/// Binary operations allowed inside a parameter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// The irrational constants OpenQASM exposes as single lexemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Irrational {
    /// π
    Pi,
    /// τ = 2π
    Tau,
    /// Euler's number ℯ
    Euler,
}

impl Irrational {
    /// Numeric value of the constant.
    pub fn value(self) -> f64 {
        match self {
            Irrational::Pi => PI,
            Irrational::Tau => TAU,
            Irrational::Euler => E,
        }
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// A concrete numeric value.
    Constant(f64),
    /// A free parameter, keyed by name.
    Free(String),
    /// An irrational constant.
    Irrational(Irrational),
    /// Arithmetic negation.
    Neg(Box<Parameter>),
    /// A binary operation over two sub-expressions.
    Bin(ParamBinOp, Box<Parameter>, Box<Parameter>),
}

impl Parameter {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        Parameter::Constant(value)
    }

    /// Create a free parameter.
    pub fn free(name: impl Into<String>) -> Self {
        Parameter::Free(name.into())
    }

    /// π as a parameter expression.
    pub fn pi() -> Self {
        Parameter::Irrational(Irrational::Pi)
    }

    /// Check whether any free parameter remains in this expression.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Parameter::Free(_) => true,
            Parameter::Constant(_) | Parameter::Irrational(_) => false,
            Parameter::Neg(e) => e.is_symbolic(),
            Parameter::Bin(_, a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Evaluate to a concrete value if no free parameter remains.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::Constant(v) => Some(*v),
            Parameter::Free(_) => None,
            Parameter::Irrational(i) => Some(i.value()),
            Parameter::Neg(e) => e.as_f64().map(|v| -v),
            Parameter::Bin(op, a, b) => {
                let (a, b) = (a.as_f64()?, b.as_f64()?);
                Some(match op {
                    ParamBinOp::Add => a + b,
                    ParamBinOp::Sub => a - b,
                    ParamBinOp::Mul => a * b,
                    ParamBinOp::Div => a / b,
                    ParamBinOp::Pow => a.powf(b),
                })
            }
        }
    }

    /// Evaluate to a concrete value, or fail naming the first unbound symbol.
    pub fn resolved(&self) -> IrResult<f64> {
        self.as_f64().ok_or_else(|| {
            let name = self
                .free_names()
                .into_iter()
                .next()
                .unwrap_or_else(|| "?".into());
            IrError::UnboundParameter(name)
        })
    }

    /// Names of all free parameters in this expression.
    pub fn free_names(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        self.collect_free(&mut set);
        set
    }

    fn collect_free(&self, set: &mut HashSet<String>) {
        match self {
            Parameter::Constant(_) | Parameter::Irrational(_) => {}
            Parameter::Free(name) => {
                set.insert(name.clone());
            }
            Parameter::Neg(e) => e.collect_free(set),
            Parameter::Bin(_, a, b) => {
                a.collect_free(set);
                b.collect_free(set);
            }
        }
    }

    /// Substitute every free parameter found in `bindings`, folding
    /// constant sub-expressions as it goes.
    pub fn bind_all(&self, bindings: &dyn Fn(&str) -> Option<Parameter>) -> Self {
        let bound = match self {
            Parameter::Free(name) => match bindings(name) {
                Some(value) => value,
                None => self.clone(),
            },
            Parameter::Constant(_) | Parameter::Irrational(_) => self.clone(),
            Parameter::Neg(e) => Parameter::Neg(Box::new(e.bind_all(bindings))),
            Parameter::Bin(op, a, b) => Parameter::Bin(
                *op,
                Box::new(a.bind_all(bindings)),
                Box::new(b.bind_all(bindings)),
            ),
        };
        bound.simplify()
    }

    /// Bind a single free parameter by name.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        self.bind_all(&|n| (n == name).then_some(Parameter::Constant(value)))
    }

    /// Fold constant sub-expressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return Parameter::Constant(v);
        }
        match self {
            Parameter::Neg(e) => Parameter::Neg(Box::new(e.simplify())),
            Parameter::Bin(op, a, b) => {
                Parameter::Bin(*op, Box::new(a.simplify()), Box::new(b.simplify()))
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Constant(v) => write!(f, "{v}"),
            Parameter::Free(name) => write!(f, "{name}"),
            Parameter::Irrational(Irrational::Pi) => write!(f, "π"),
            Parameter::Irrational(Irrational::Tau) => write!(f, "τ"),
            Parameter::Irrational(Irrational::Euler) => write!(f, "ℯ"),
            Parameter::Neg(e) => write!(f, "-({e})"),
            Parameter::Bin(op, a, b) => {
                let sym = match op {
                    ParamBinOp::Add => "+",
                    ParamBinOp::Sub => "-",
                    ParamBinOp::Mul => "*",
                    ParamBinOp::Div => "/",
                    ParamBinOp::Pow => "**",
                };
                write!(f, "({a} {sym} {b})")
            }
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Constant(value)
    }
}

impl std::ops::Add for Parameter {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Parameter::Bin(ParamBinOp::Add, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Parameter {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Parameter::Bin(ParamBinOp::Sub, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Parameter {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Parameter::Bin(ParamBinOp::Mul, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for Parameter {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Parameter::Bin(ParamBinOp::Div, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for Parameter {
    type Output = Self;

    fn neg(self) -> Self {
        Parameter::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_eval() {
        let p = Parameter::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
        assert_eq!(p.resolved().unwrap(), 1.5);
    }

    #[test]
    fn test_free_parameter() {
        let p = Parameter::free("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert!(p.free_names().contains("theta"));
        assert!(matches!(p.resolved(), Err(IrError::UnboundParameter(n)) if n == "theta"));
    }

    #[test]
    fn test_bind_through_arithmetic() {
        let half_theta = Parameter::free("theta") / Parameter::constant(2.0);
        let bound = half_theta.bind("theta", PI);
        assert_eq!(bound, Parameter::Constant(PI / 2.0));
    }

    #[test]
    fn test_irrationals() {
        assert_eq!(Parameter::pi().as_f64(), Some(PI));
        assert_eq!(Parameter::Irrational(Irrational::Tau).as_f64(), Some(TAU));
        assert_eq!(Parameter::Irrational(Irrational::Euler).as_f64(), Some(E));
    }

    #[test]
    fn test_pow_op() {
        let p = Parameter::Bin(
            ParamBinOp::Pow,
            Box::new(Parameter::constant(2.0)),
            Box::new(Parameter::constant(10.0)),
        );
        assert_eq!(p.as_f64(), Some(1024.0));
    }

    #[test]
    fn test_simplify_partial() {
        // (2 * 3) + theta folds the left side only.
        let p = (Parameter::constant(2.0) * Parameter::constant(3.0)) + Parameter::free("theta");
        let s = p.simplify();
        match s {
            Parameter::Bin(ParamBinOp::Add, a, b) => {
                assert_eq!(*a, Parameter::Constant(6.0));
                assert_eq!(*b, Parameter::Free("theta".into()));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
