//! Parser for `OpenQASM` 3.
//!
//! Hand-written recursive descent over the token stream. Expressions go
//! through a precedence climber (see `expression.rs`), statements and
//! pragma lines through dedicated routines (`statement.rs`, `pragma.rs`).

mod expression;
mod pragma;
mod statement;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a QASM3 source string into an AST program.
pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(crate) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// Lex a source string, failing fast on the first bad byte.
    pub(crate) fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    return Err(ParseError::Lexer {
                        offset: span.start,
                        message,
                    });
                }
            }
        }
        Ok(Self::from_tokens(tokens))
    }

    /// Wrap an existing token stream (used for pragma bodies).
    pub(crate) fn from_tokens(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Check if we've reached the end.
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token (end of input if exhausted).
    pub(crate) fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.start)
    }

    /// Peek at the current token.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a token of the same kind as `expected`.
    pub(crate) fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let offset = self.offset();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(expected.to_string()))?;
        if std::mem::discriminant(&found) != std::mem::discriminant(expected) {
            return Err(ParseError::UnexpectedToken {
                offset,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if the current token matches the kind of `token`.
    pub(crate) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume the current token if it matches.
    pub(crate) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Error constructor for an unexpected current token.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                offset: self.offset(),
                expected: expected.to_string(),
                found: token.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.to_string()),
        }
    }

    /// Parse an identifier.
    pub(crate) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(_)) => match self.advance() {
                Some(Token::Identifier(s)) => Ok(s),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse the entire program.
    pub(crate) fn parse_program(&mut self) -> ParseResult<Program> {
        let version = if self.check(&Token::OpenQasm) {
            self.advance();
            let version = self.parse_version()?;
            self.expect(&Token::Semicolon)?;
            Some(version)
        } else {
            None
        };

        let mut statements = Vec::new();
        while !self.is_eof() {
            // Stray semicolons are empty statements.
            if self.consume(&Token::Semicolon) {
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse the version number of an `OPENQASM` statement.
    fn parse_version(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::FloatLiteral(v)) => Ok(format!("{v}")),
            Some(Token::IntLiteral(v)) => Ok(format!("{v}.0")),
            Some(other) => Err(ParseError::InvalidVersion(other.to_string())),
            None => Err(ParseError::UnexpectedEof("version number".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    #[test]
    fn test_version_parsing() {
        let program = parse("OPENQASM 3.0; qubit q;").unwrap();
        assert_eq!(program.version.as_deref(), Some("3"));
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_version_optional() {
        let program = parse("qubit q;").unwrap();
        assert!(program.version.is_none());
    }

    #[test]
    fn test_invalid_version() {
        assert!(matches!(
            parse("OPENQASM banana;"),
            Err(ParseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_stray_semicolons() {
        let program = parse(";; qubit q; ;").unwrap();
        assert!(matches!(
            program.statements.as_slice(),
            [Statement::QubitDecl { .. }]
        ));
    }

    #[test]
    fn test_lexer_failure_surfaces_offset() {
        let err = parse("qubit ?;").unwrap_err();
        assert!(matches!(err, ParseError::Lexer { offset: 6, .. }));
    }
}
