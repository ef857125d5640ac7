//! Abstract syntax tree for `OpenQASM` 3.
//!
//! The tree is fully structural: definitions reference names, never other
//! nodes, so ownership is strictly parent-to-child. Sizes and designators
//! stay as expressions until elaboration makes them concrete.

use serde::{Deserialize, Serialize};

use alsvid_ir::Irrational;

/// A complete QASM3 program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Declared version, e.g. "3.0", if a version statement was present.
    pub version: Option<String>,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// Scalar type keywords, sized by an optional designator expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Bit,
    Int,
    Uint,
    Float,
    Angle,
    Complex,
    Bool,
}

/// A classical type as written in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeSpec {
    /// `int[32]`, `bit`, `complex[float[64]]`, ... The designator is `None`
    /// for the platform default width.
    Scalar {
        kind: ScalarKind,
        designator: Option<Box<Expression>>,
    },
    /// `array[T, d0, d1, ...]`.
    Array {
        elem: Box<TypeSpec>,
        dims: Vec<Expression>,
    },
    /// `readonly`/`mutable` `array[T, #dim = n]` in a `def` signature.
    ArrayRef {
        elem: Box<TypeSpec>,
        ndims: u32,
        mutable: bool,
    },
}

/// Direction of an I/O declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoDirection {
    Input,
    Output,
}

/// Assignment operators, compound forms decoded by the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

/// Left-hand side of an assignment: a name plus optional index chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LValue {
    pub name: String,
    pub indices: Vec<Expression>,
}

/// A gate modifier, composed left-to-right with `@`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateModifier {
    /// `pow(x) @`
    Pow(Expression),
    /// `inv @`
    Inv,
    /// `ctrl @` or `ctrl(k) @`
    Ctrl(Option<Expression>),
    /// `negctrl @` or `negctrl(k) @`
    NegCtrl(Option<Expression>),
}

/// A gate call with its modifier chain (outermost modifier first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    pub name: String,
    pub modifiers: Vec<GateModifier>,
    pub params: Vec<Expression>,
    pub targets: Vec<Expression>,
}

/// One arm of a `switch` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub labels: Vec<Expression>,
    pub body: Vec<Statement>,
}

/// A formal argument of a `def`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionArg {
    /// A classical value argument (scalars and arrays by value,
    /// `readonly`/`mutable` arrays by reference with write-back).
    Classical { ty: TypeSpec, name: String },
    /// A qubit or qubit register argument.
    Qubit {
        name: String,
        size: Option<Expression>,
    },
}

impl FunctionArg {
    /// The declared argument name.
    pub fn name(&self) -> &str {
        match self {
            FunctionArg::Classical { name, .. } | FunctionArg::Qubit { name, .. } => name,
        }
    }
}

/// A `def` definition, body re-elaborated per call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub args: Vec<FunctionArg>,
    pub return_type: Option<TypeSpec>,
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `include "...";`
    Include(String),

    /// `qubit q;` or `qubit[n] q;`
    QubitDecl {
        name: String,
        size: Option<Expression>,
    },

    /// Classical declaration, `const` or not, with optional initializer.
    ClassicalDecl {
        ty: TypeSpec,
        name: String,
        init: Option<Expression>,
        is_const: bool,
    },

    /// `input`/`output` declaration.
    IoDecl {
        direction: IoDirection,
        ty: TypeSpec,
        name: String,
    },

    /// Assignment, possibly compound, possibly indexed.
    Assignment {
        target: LValue,
        op: AssignOp,
        value: Expression,
    },

    /// `gate name(params) q0, q1 { ... }`
    GateDef {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
        body: Vec<Statement>,
    },

    /// `def name(args) -> T { ... }`
    FunctionDef(FunctionDef),

    /// A gate application, including its modifier chain.
    GateCall(GateCall),

    /// An expression evaluated for side effects (function call statement).
    Expr(Expression),

    /// `measure q;`, `measure q -> c;`, or the target side of
    /// `c = measure q;`.
    Measure {
        targets: Vec<Expression>,
        destination: Option<LValue>,
    },

    /// `for T x in E { ... }`
    For {
        ty: TypeSpec,
        variable: String,
        iterable: Expression,
        body: Vec<Statement>,
    },

    /// `while (E) { ... }`
    While {
        condition: Expression,
        body: Vec<Statement>,
    },

    /// `if (E) ... else ...`
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },

    /// `switch (E) { case ... default ... }`
    Switch {
        target: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
    },

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `return;` or `return E;`
    Return(Option<Expression>),

    /// `box { ... }`: timing hints ignored, body walked.
    Box { body: Vec<Statement> },

    /// `#pragma braket ...`
    Pragma(Pragma),

    /// `end;`
    End,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    IntLiteral(i64),
    FloatLiteral(f64),
    /// Imaginary part of a complex literal, e.g. `0.5im`.
    ImagLiteral(f64),
    BoolLiteral(bool),
    /// `"0101"`, kept as bits, most significant first.
    BitStringLiteral(Vec<bool>),
    StringLiteral(String),
    Irrational(Irrational),
    Identifier(String),
    /// `$3`
    HardwareQubit(u32),

    /// `name[i]`, `name[a:b]`, `name[{1, 3}]`, possibly multi-dimensional.
    Index {
        name: String,
        indices: Vec<Expression>,
    },

    /// `a : b` or `a : step : b`; a missing bound is `None` and resolves
    /// against the indexed variable's declared size.
    Range {
        start: Option<Box<Expression>>,
        step: Option<Box<Expression>>,
        stop: Option<Box<Expression>>,
    },

    /// `{1, 2, 3}`, a discrete set.
    Set(Vec<Expression>),

    /// `[a, b, c]` (rows of matrices nest).
    ArrayLiteral(Vec<Expression>),

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// `bool(x)`, `int[8](x)`, ...
    Cast {
        ty: TypeSpec,
        operand: Box<Expression>,
    },

    /// Builtin or user function call.
    Call {
        name: String,
        args: Vec<Expression>,
    },

    /// `measure q` in expression position.
    Measure(Vec<Expression>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

/// A parsed `#pragma braket ...` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pragma {
    /// `result ...`
    Result(ResultPragma),
    /// `unitary(MATRIX) targets`
    Unitary {
        matrix: Vec<Vec<Expression>>,
        targets: Vec<Expression>,
    },
    /// `noise <channel>(args) targets`
    Noise {
        channel: String,
        args: Vec<Expression>,
        targets: Vec<Expression>,
    },
    /// `noise kraus([M], [M], ...) targets`
    Kraus {
        matrices: Vec<Vec<Vec<Expression>>>,
        targets: Vec<Expression>,
    },
    /// `verbatim`
    Verbatim,
}

/// The result subtypes of a result pragma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultPragma {
    StateVector,
    /// Basis-state bitstrings.
    Amplitude(Vec<String>),
    /// Empty targets = all qubits.
    Probability(Vec<Expression>),
    DensityMatrix(Vec<Expression>),
    Expectation(ObservableSpec),
    Variance(ObservableSpec),
    Sample(ObservableSpec),
}

/// An observable with its targets, as written in a result pragma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableSpec {
    /// Tensor factors joined by `@`, outermost first.
    pub factors: Vec<ObservableFactor>,
    /// Trailing target list; empty = all qubits.
    pub targets: Vec<Expression>,
}

/// One tensor factor of an observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservableFactor {
    /// `x`, `y`, `z`, `i`, `h`, optionally with a parenthesized target.
    Named {
        name: String,
        target: Option<Expression>,
    },
    /// `hermitian(MATRIX)`, optionally with a parenthesized target list.
    Hermitian {
        matrix: Vec<Vec<Expression>>,
        targets: Vec<Expression>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Expression::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(Expression::Irrational(Irrational::Pi)),
            rhs: Box::new(Expression::IntLiteral(2)),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_function_arg_names() {
        let arg = FunctionArg::Qubit {
            name: "q".into(),
            size: None,
        };
        assert_eq!(arg.name(), "q");
    }
}
