//! Error types for the QASM3 front-end.
//!
//! Two kinds, matching the two halves of the pipeline: [`ParseError`]
//! carries a byte offset into the source, [`ElabError`] carries a message
//! about the construct that failed. Nothing is retried and no partial
//! circuit is ever returned.

use thiserror::Error;

/// Errors raised by the lexer and parser. Offsets are byte positions into
/// the original source string.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid byte sequence in the source.
    #[error("Lexer error at offset {offset}: {message}")]
    Lexer { offset: usize, message: String },

    /// A token other than the expected one.
    #[error("Unexpected token at offset {offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: String,
        found: String,
    },

    /// Ran out of tokens mid-statement.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// Malformed `OPENQASM` version statement.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// A `{`, `(` or `[` without its closing partner.
    #[error("Unmatched '{delimiter}' at offset {offset}")]
    UnmatchedDelimiter { offset: usize, delimiter: char },

    /// A keyword the front-end recognizes but refuses.
    #[error("Reserved keyword '{keyword}' is not supported (offset {offset})")]
    ReservedKeyword { offset: usize, keyword: String },

    /// A numeric literal that does not scan.
    #[error("Malformed literal '{text}' at offset {offset}")]
    MalformedLiteral { offset: usize, text: String },

    /// A pragma of unknown shape.
    #[error("Unknown pragma at offset {offset}: {text}")]
    UnknownPragma { offset: usize, text: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised during static elaboration (the visitor/evaluator).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ElabError {
    /// Identifier not found in any scope.
    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    /// Variable read before its first assignment.
    #[error("Variable '{0}' used before initialization")]
    Uninitialized(String),

    /// Gate name not found in the gate registry.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// Function name not found.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Gate call with the wrong number of qubit targets.
    #[error("Gate '{gate}' expects {expected} qubit(s), got {got}")]
    GateQubitCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Gate call with the wrong number of classical arguments.
    #[error("Gate '{gate}' expects {expected} parameter(s), got {got}")]
    GateParamCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Function call with the wrong number of arguments.
    #[error("Function '{function}' expects {expected} argument(s), got {got}")]
    FunctionArgCount {
        function: String,
        expected: usize,
        got: usize,
    },

    /// Assignment to a `const` or `input` variable.
    #[error("Cannot assign to const variable '{0}'")]
    ConstAssignment(String),

    /// `ctrl`/`negctrl` count or integer-context `pow` that is not a
    /// positive integer.
    #[error("Modifier '{modifier}' requires a positive integer, got {got}")]
    NonIntegerModifier { modifier: String, got: String },

    /// Index outside a register or array.
    #[error("Index {index} out of range for '{name}' of size {size}")]
    IndexOutOfRange {
        name: String,
        index: i64,
        size: usize,
    },

    /// Declared `input` variable missing from the binding map.
    #[error("No input value supplied for '{0}'")]
    MissingInput(String),

    /// Input value that cannot be coerced to the declared type.
    #[error("Input '{name}' cannot be coerced to {ty}: {value}")]
    InputCoercion {
        name: String,
        ty: String,
        value: String,
    },

    /// Operand of the wrong kind for an operation.
    #[error("Type error: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A construct the front-end deliberately rejects.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// `break`/`continue` outside a loop.
    #[error("'{0}' outside of a loop")]
    StrayLoopControl(&'static str),

    /// Broadcast over targets of incompatible lengths.
    #[error("Cannot broadcast gate '{gate}' over target lengths {lengths:?}")]
    BroadcastMismatch { gate: String, lengths: Vec<usize> },

    /// Noise channel invoked with the wrong number of parameters.
    #[error("Noise channel '{channel}' expects {expected} parameter(s), got {got}")]
    ChannelParamCount {
        channel: String,
        expected: usize,
        got: usize,
    },

    /// Noise channel with out-of-range or inconsistent parameters.
    #[error("Invalid noise channel: {0}")]
    InvalidChannel(String),

    /// Operand (noise channel, observable, qubit argument) applied to the
    /// wrong number of targets.
    #[error("{kind} expects {expected} target(s), got {got}")]
    TargetCount {
        kind: String,
        expected: usize,
        got: usize,
    },

    /// IR-level validation failure.
    #[error(transparent)]
    Ir(#[from] alsvid_ir::IrError),
}

/// Result type for elaboration.
pub type ElabResult<T> = Result<T, ElabError>;

/// Unified front-end error.
#[derive(Debug, Error)]
pub enum QasmError {
    /// Lexing or parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Elaboration failed.
    #[error(transparent)]
    Elab(#[from] ElabError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_offsets() {
        let err = ParseError::UnexpectedToken {
            offset: 12,
            expected: ";".into(),
            found: "}".into(),
        };
        assert!(err.to_string().contains("offset 12"));
    }

    #[test]
    fn test_unified_conversion() {
        let err: QasmError = ElabError::UndefinedIdentifier("n".into()).into();
        assert!(matches!(err, QasmError::Elab(_)));
        assert!(err.to_string().contains('n'));
    }
}
