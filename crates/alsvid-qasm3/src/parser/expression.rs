//! Expression parsing: precedence climbing over the token stream.

use super::Parser;
use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::error::ParseResult;
use crate::lexer::Token;
use alsvid_ir::Irrational;

/// Binding power of a binary operator (C-family table).
fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::BitOr => 3,
        BinaryOp::BitXor => 4,
        BinaryOp::BitAnd => 5,
        BinaryOp::Eq | BinaryOp::NotEq => 6,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 7,
        BinaryOp::Shl | BinaryOp::Shr => 8,
        BinaryOp::Add | BinaryOp::Sub => 9,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        BinaryOp::Pow => 11,
    }
}

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut lhs = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            // `**` is right-associative; everything else binds left.
            let next_min = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let rhs = self.parse_binary_expr(next_min)?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek()? {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,
            Token::DoubleStar => BinaryOp::Pow,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::AndAnd => BinaryOp::And,
            Token::OrOr => BinaryOp::Or,
            Token::Amp => BinaryOp::BitAnd,
            Token::Pipe => BinaryOp::BitOr,
            Token::Caret => BinaryOp::BitXor,
            Token::Shl => BinaryOp::Shl,
            Token::Shr => BinaryOp::Shr,
            _ => return None,
        })
    }

    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Not) => Some(UnaryOp::Not),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expression::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self.peek().cloned().ok_or_else(|| {
            crate::error::ParseError::UnexpectedEof("expression".into())
        })?;

        match token {
            Token::IntLiteral(v) => {
                self.advance();
                Ok(Expression::IntLiteral(v))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(Expression::FloatLiteral(v))
            }
            Token::ImagLiteral(v) => {
                self.advance();
                Ok(Expression::ImagLiteral(v))
            }
            Token::HexLiteral(v) | Token::OctalLiteral(v) | Token::BinaryLiteral(v) => {
                self.advance();
                Ok(Expression::IntLiteral(v as i64))
            }
            Token::True => {
                self.advance();
                Ok(Expression::BoolLiteral(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::BoolLiteral(false))
            }
            Token::Pi => {
                self.advance();
                Ok(Expression::Irrational(Irrational::Pi))
            }
            Token::Tau => {
                self.advance();
                Ok(Expression::Irrational(Irrational::Tau))
            }
            Token::Euler => {
                self.advance();
                Ok(Expression::Irrational(Irrational::Euler))
            }
            Token::BitString(bits) => {
                self.advance();
                Ok(Expression::BitStringLiteral(
                    bits.chars().map(|c| c == '1').collect(),
                ))
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Expression::StringLiteral(s))
            }
            Token::HardwareQubit(n) => {
                self.advance();
                Ok(Expression::HardwareQubit(n))
            }
            Token::Measure => {
                self.advance();
                let targets = self.parse_qubit_targets()?;
                Ok(Expression::Measure(targets))
            }
            Token::Identifier(name) => {
                self.advance();
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list(&Token::RParen)?;
                    self.expect(&Token::RParen)?;
                    Ok(Expression::Call { name, args })
                } else if self.check(&Token::LBracket) {
                    let indices = self.parse_index_chain()?;
                    Ok(Expression::Index { name, indices })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let items = self.parse_expression_list(&Token::RBracket)?;
                self.expect(&Token::RBracket)?;
                Ok(Expression::ArrayLiteral(items))
            }
            Token::LBrace => {
                self.advance();
                let items = self.parse_expression_list(&Token::RBrace)?;
                self.expect(&Token::RBrace)?;
                Ok(Expression::Set(items))
            }
            Token::Bit
            | Token::Int
            | Token::Uint
            | Token::Float
            | Token::Angle
            | Token::Complex
            | Token::Bool
            | Token::Array => {
                let ty = self.parse_type_spec()?;
                self.expect(&Token::LParen)?;
                let operand = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(Expression::Cast {
                    ty,
                    operand: Box::new(operand),
                })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse a comma-separated expression list terminated by `closing`
    /// (which is not consumed).
    pub(crate) fn parse_expression_list(&mut self, closing: &Token) -> ParseResult<Vec<Expression>> {
        if self.check(closing) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Parse one or more bracketed index groups: `[i]`, `[a:b]`, `[i, j]`,
    /// `[i][j]`. Returns the flattened index list.
    pub(crate) fn parse_index_chain(&mut self) -> ParseResult<Vec<Expression>> {
        let mut indices = Vec::new();
        while self.consume(&Token::LBracket) {
            indices.push(self.parse_index_item()?);
            while self.consume(&Token::Comma) {
                indices.push(self.parse_index_item()?);
            }
            self.expect(&Token::RBracket)?;
        }
        Ok(indices)
    }

    /// A single index item: an expression, a range, or a set.
    fn parse_index_item(&mut self) -> ParseResult<Expression> {
        if self.check(&Token::LBrace) {
            return self.parse_primary_expr();
        }
        // A leading `:` means an open start.
        let start = if self.check(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        if !self.consume(&Token::Colon) {
            // Plain expression index.
            return Ok(*start.expect("expression index"));
        }
        self.parse_range_tail(start)
    }

    /// Parse `step? : stop?` after the first colon of a range whose start
    /// was already read.
    pub(crate) fn parse_range_tail(
        &mut self,
        start: Option<Box<Expression>>,
    ) -> ParseResult<Expression> {
        let at_end = |p: &Self| {
            p.check(&Token::RBracket) || p.check(&Token::Comma) || p.is_eof()
        };
        if at_end(self) {
            return Ok(Expression::Range {
                start,
                step: None,
                stop: None,
            });
        }
        let first = Box::new(self.parse_expression()?);
        if self.consume(&Token::Colon) {
            let stop = if at_end(self) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            Ok(Expression::Range {
                start,
                step: Some(first),
                stop,
            })
        } else {
            Ok(Expression::Range {
                start,
                step: None,
                stop: Some(first),
            })
        }
    }

    /// Parse a comma-separated list of qubit target expressions.
    pub(crate) fn parse_qubit_targets(&mut self) -> ParseResult<Vec<Expression>> {
        let mut targets = vec![self.parse_qubit_target()?];
        while self.consume(&Token::Comma) {
            targets.push(self.parse_qubit_target()?);
        }
        Ok(targets)
    }

    /// A single qubit target: `q`, `q[i]`, `q[a:b]`, or `$n`.
    pub(crate) fn parse_qubit_target(&mut self) -> ParseResult<Expression> {
        match self.peek() {
            Some(Token::HardwareQubit(n)) => {
                let n = *n;
                self.advance();
                Ok(Expression::HardwareQubit(n))
            }
            Some(Token::Identifier(_)) => {
                let name = self.parse_identifier()?;
                if self.check(&Token::LBracket) {
                    let indices = self.parse_index_chain()?;
                    Ok(Expression::Index { name, indices })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            _ => Err(self.unexpected("qubit target")),
        }
    }
}
