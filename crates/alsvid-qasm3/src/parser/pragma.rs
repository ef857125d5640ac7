//! `#pragma braket ...` parsing.
//!
//! The lexer hands over the whole pragma line; the body after `#pragma` is
//! re-lexed here (spans shifted back to source offsets) and parsed with the
//! same expression machinery, so matrix entries may contain `im` literals
//! and arithmetic.

use super::Parser;
use crate::ast::{Expression, ObservableFactor, ObservableSpec, Pragma, ResultPragma};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Token, tokenize};

/// Observable names accepted as tensor factors.
const NAMED_OBSERVABLES: [&str; 5] = ["x", "y", "z", "i", "h"];

impl Parser {
    /// Parse a captured pragma line. `base` is the byte offset of the
    /// `#pragma` token in the original source.
    pub(crate) fn parse_pragma_line(&mut self, text: &str, base: usize) -> ParseResult<Pragma> {
        let body = &text["#pragma".len()..];
        let body_base = base + "#pragma".len();

        let mut tokens = Vec::new();
        for result in tokenize(body) {
            match result {
                Ok(mut t) => {
                    t.span = t.span.start + body_base..t.span.end + body_base;
                    tokens.push(t);
                }
                Err((span, message)) => {
                    return Err(ParseError::Lexer {
                        offset: span.start + body_base,
                        message,
                    });
                }
            }
        }

        let mut sub = Parser::from_tokens(tokens);
        sub.parse_pragma_body(text, base)
    }

    fn parse_pragma_body(&mut self, text: &str, base: usize) -> ParseResult<Pragma> {
        let unknown = || ParseError::UnknownPragma {
            offset: base,
            text: text.to_string(),
        };

        match self.advance() {
            Some(Token::Identifier(ns)) if ns == "braket" => {}
            _ => return Err(unknown()),
        }

        match self.advance() {
            Some(Token::Identifier(kind)) => match kind.as_str() {
                "result" => self.parse_result_pragma(text, base),
                "unitary" => {
                    self.expect(&Token::LParen)?;
                    let matrix = self.parse_matrix()?;
                    self.expect(&Token::RParen)?;
                    let targets = self.parse_pragma_targets()?;
                    Ok(Pragma::Unitary { matrix, targets })
                }
                "noise" => self.parse_noise_pragma(),
                "verbatim" => Ok(Pragma::Verbatim),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }

    fn parse_result_pragma(&mut self, text: &str, base: usize) -> ParseResult<Pragma> {
        let unknown = || ParseError::UnknownPragma {
            offset: base,
            text: text.to_string(),
        };

        let kind = match self.advance() {
            Some(Token::Identifier(s)) => s,
            _ => return Err(unknown()),
        };

        let result = match kind.as_str() {
            "state_vector" => ResultPragma::StateVector,
            "amplitude" => {
                let mut states = Vec::new();
                loop {
                    match self.advance() {
                        Some(Token::BitString(s) | Token::StringLiteral(s)) => states.push(s),
                        _ => return Err(unknown()),
                    }
                    if !self.consume(&Token::Comma) {
                        break;
                    }
                }
                ResultPragma::Amplitude(states)
            }
            "probability" => ResultPragma::Probability(self.parse_pragma_targets()?),
            "density_matrix" => ResultPragma::DensityMatrix(self.parse_pragma_targets()?),
            "expectation" => ResultPragma::Expectation(self.parse_observable_spec(text, base)?),
            "variance" => ResultPragma::Variance(self.parse_observable_spec(text, base)?),
            "sample" => ResultPragma::Sample(self.parse_observable_spec(text, base)?),
            _ => return Err(unknown()),
        };
        Ok(Pragma::Result(result))
    }

    fn parse_noise_pragma(&mut self) -> ParseResult<Pragma> {
        let channel = self.parse_identifier()?;
        self.expect(&Token::LParen)?;

        if channel == "kraus" {
            let mut matrices = Vec::new();
            loop {
                matrices.push(self.parse_matrix()?);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
            let targets = self.parse_pragma_targets()?;
            return Ok(Pragma::Kraus { matrices, targets });
        }

        let args = self.parse_expression_list(&Token::RParen)?;
        self.expect(&Token::RParen)?;
        let targets = self.parse_pragma_targets()?;
        Ok(Pragma::Noise {
            channel,
            args,
            targets,
        })
    }

    /// An observable chain `OBS [@ OBS ...]` with optional trailing targets.
    fn parse_observable_spec(&mut self, text: &str, base: usize) -> ParseResult<ObservableSpec> {
        let unknown = || ParseError::UnknownPragma {
            offset: base,
            text: text.to_string(),
        };

        let mut factors = Vec::new();
        loop {
            let name = match self.peek() {
                Some(Token::Identifier(s)) => s.clone(),
                _ => return Err(unknown()),
            };

            if name == "hermitian" {
                self.advance();
                self.expect(&Token::LParen)?;
                let matrix = self.parse_matrix()?;
                self.expect(&Token::RParen)?;
                factors.push(ObservableFactor::Hermitian {
                    matrix,
                    targets: vec![],
                });
            } else if NAMED_OBSERVABLES.contains(&name.as_str()) {
                self.advance();
                let target = if self.consume(&Token::LParen) {
                    let t = self.parse_qubit_target()?;
                    self.expect(&Token::RParen)?;
                    Some(t)
                } else {
                    None
                };
                factors.push(ObservableFactor::Named { name, target });
            } else {
                return Err(unknown());
            }

            if !self.consume(&Token::At) {
                break;
            }
        }

        let targets = self.parse_pragma_targets()?;
        Ok(ObservableSpec { factors, targets })
    }

    /// Trailing targets of a pragma; `all` and an empty tail both mean
    /// "all qubits" and come back as an empty list.
    fn parse_pragma_targets(&mut self) -> ParseResult<Vec<Expression>> {
        if self.is_eof() {
            return Ok(vec![]);
        }
        if let Some(Token::Identifier(s)) = self.peek() {
            if s == "all" {
                self.advance();
                return Ok(vec![]);
            }
        }
        self.parse_qubit_targets()
    }

    /// A matrix literal: rows of bracketed comma lists.
    fn parse_matrix(&mut self) -> ParseResult<Vec<Vec<Expression>>> {
        let offset = self.offset();
        let expr = self.parse_expression()?;
        expr_to_matrix(expr).ok_or(ParseError::MalformedLiteral {
            offset,
            text: "matrix".into(),
        })
    }
}

fn expr_to_matrix(expr: Expression) -> Option<Vec<Vec<Expression>>> {
    match expr {
        Expression::ArrayLiteral(rows) => rows
            .into_iter()
            .map(|row| match row {
                Expression::ArrayLiteral(items) => Some(items),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::parse;

    fn pragma(source: &str) -> Pragma {
        let program = parse(source).unwrap();
        match program.statements.into_iter().next().unwrap() {
            Statement::Pragma(p) => p,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_state_vector() {
        assert_eq!(
            pragma("#pragma braket result state_vector"),
            Pragma::Result(ResultPragma::StateVector)
        );
    }

    #[test]
    fn test_amplitude_states() {
        match pragma(r#"#pragma braket result amplitude "01", "10""#) {
            Pragma::Result(ResultPragma::Amplitude(states)) => {
                assert_eq!(states, vec!["01", "10"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_probability_targets() {
        match pragma("#pragma braket result probability cout, b") {
            Pragma::Result(ResultPragma::Probability(targets)) => {
                assert_eq!(targets.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
        // Omitted and `all` both mean every qubit.
        assert!(matches!(
            pragma("#pragma braket result probability"),
            Pragma::Result(ResultPragma::Probability(t)) if t.is_empty()
        ));
        assert!(matches!(
            pragma("#pragma braket result probability all"),
            Pragma::Result(ResultPragma::Probability(t)) if t.is_empty()
        ));
    }

    #[test]
    fn test_expectation_tensor() {
        match pragma("#pragma braket result expectation x(q[0]) @ z(q[1])") {
            Pragma::Result(ResultPragma::Expectation(spec)) => {
                assert_eq!(spec.factors.len(), 2);
                assert!(spec.targets.is_empty());
                assert!(matches!(
                    &spec.factors[0],
                    ObservableFactor::Named { name, target: Some(_) } if name == "x"
                ));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_hermitian_observable() {
        let p = pragma(
            "#pragma braket result variance hermitian([[1, 0], [0, -1]]) q[0]",
        );
        match p {
            Pragma::Result(ResultPragma::Variance(spec)) => {
                assert!(matches!(
                    &spec.factors[0],
                    ObservableFactor::Hermitian { matrix, .. } if matrix.len() == 2
                ));
                assert_eq!(spec.targets.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_noise_channel() {
        match pragma("#pragma braket noise bit_flip(.5) qs[1]") {
            Pragma::Noise {
                channel,
                args,
                targets,
            } => {
                assert_eq!(channel, "bit_flip");
                assert_eq!(args.len(), 1);
                assert_eq!(targets.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_kraus_channel() {
        let p = pragma(
            "#pragma braket noise kraus([[0.9486832980505138, 0], [0, 0.9486832980505138]], [[0, 0.31622776601683794], [0.31622776601683794, 0]]) q[0]",
        );
        match p {
            Pragma::Kraus { matrices, targets } => {
                assert_eq!(matrices.len(), 2);
                assert_eq!(matrices[0].len(), 2);
                assert_eq!(targets.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unitary_with_imaginary_entries() {
        let p = pragma(
            "#pragma braket unitary([[1, 0], [0, 0.70710678 + 0.70710678im]]) q[0]",
        );
        match p {
            Pragma::Unitary { matrix, targets } => {
                assert_eq!(matrix.len(), 2);
                assert_eq!(targets.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_verbatim() {
        assert_eq!(pragma("#pragma braket verbatim"), Pragma::Verbatim);
    }

    #[test]
    fn test_unknown_pragma_kind() {
        assert!(matches!(
            parse("#pragma braket frobnicate q"),
            Err(ParseError::UnknownPragma { .. })
        ));
        assert!(matches!(
            parse("#pragma openqasm result"),
            Err(ParseError::UnknownPragma { .. })
        ));
    }
}
