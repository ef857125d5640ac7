//! `OpenQASM` 3 front-end for Alsvid
//!
//! This crate turns OpenQASM 3 source text plus input bindings into a
//! validated [`Circuit`](alsvid_ir::Circuit): a flat, ordered instruction
//! stream over integer-indexed qubits plus the result requests collected
//! from `#pragma braket` directives. The numerical simulation of that
//! circuit lives downstream in the state-vector and density-matrix
//! backends.
//!
//! # Pipeline
//!
//! Source text flows strictly left to right:
//!
//! 1. **Lexer**: `logos`-driven tokenizer
//! 2. **Parser**: recursive descent with precedence climbing ([`syntax`])
//! 3. **Visitor**: static elaboration ([`Visitor`]) covering type checking,
//!    constant folding, loop and conditional unrolling, gate-definition
//!    expansion, modifier lowering, qubit allocation and pragma handling
//!
//! # Example
//!
//! ```rust
//! use alsvid_qasm3::elaborate;
//!
//! let qasm = r#"
//!     OPENQASM 3.0;
//!     qubit[2] q;
//!     h q[0];
//!     cnot q[0], q[1];
//!     #pragma braket result state_vector
//! "#;
//!
//! let circuit = elaborate(qasm).unwrap();
//! assert_eq!(circuit.qubit_count(), 2);
//! assert_eq!(circuit.instructions().len(), 2);
//! assert_eq!(circuit.results().len(), 1);
//! ```
//!
//! # Example: input bindings
//!
//! ```rust
//! use alsvid_qasm3::elaborate_with_inputs;
//! use rustc_hash::FxHashMap;
//!
//! let qasm = r#"
//!     input uint[4] which;
//!     qubit[4] q;
//!     x q[which];
//! "#;
//!
//! let mut inputs = FxHashMap::default();
//! inputs.insert("which".to_string(), serde_json::json!(2));
//! let circuit = elaborate_with_inputs(qasm, &inputs).unwrap();
//! assert_eq!(circuit.instructions()[0].targets, vec![alsvid_ir::QubitId(2)]);
//! ```
//!
//! # Supported language subset
//!
//! Classical declarations (`bit`/`int`/`uint`/`float`/`angle`/`complex`/
//! `bool`/`array`), `const` and `input` declarations, qubit registers,
//! hardware qubits, `gate` and `def` definitions, gate modifiers
//! (`pow`/`inv`/`ctrl`/`negctrl`), `for`/`while`/`if`/`else`/`switch`,
//! `measure` as terminal annotation, and the `braket` pragma family
//! (results, `unitary`, `noise`, `verbatim`). `reset`, `delay`, `barrier`
//! and the calibration grammar are rejected at parse time; `output` is
//! rejected at elaboration time.

mod ast;
mod builtins;
mod error;
mod evaluator;
mod gate_call;
mod lexer;
mod parser;
mod scope;
mod types;
mod visitor;

pub use error::{ElabError, ParseError, ParseResult, QasmError};
pub use parser::parse;
pub use types::{ClassicalType, Value};
pub use visitor::Visitor;

// Re-export syntax types for advanced users.
pub mod syntax {
    pub use crate::ast::*;
}

// The token stream is occasionally useful on its own (tooling, tests).
pub use lexer::{SpannedToken, Token, tokenize};

use rustc_hash::FxHashMap;

/// Parse and elaborate a source string with no input bindings.
pub fn elaborate(source: &str) -> Result<alsvid_ir::Circuit, QasmError> {
    let program = parse(source)?;
    Ok(Visitor::new(FxHashMap::default()).run(&program)?)
}

/// Parse and elaborate a source string against caller-supplied input
/// bindings; every `input` declaration must be bound.
pub fn elaborate_with_inputs(
    source: &str,
    inputs: &FxHashMap<String, serde_json::Value>,
) -> Result<alsvid_ir::Circuit, QasmError> {
    let program = parse(source)?;
    Ok(Visitor::new(inputs.clone()).run(&program)?)
}
