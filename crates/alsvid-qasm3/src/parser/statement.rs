//! Statement parsing.

use super::Parser;
use crate::ast::{
    AssignOp, Expression, FunctionArg, FunctionDef, GateCall, GateModifier, IoDirection, LValue,
    ScalarKind, Statement, SwitchCase, TypeSpec,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        if token.is_reserved() {
            return Err(ParseError::ReservedKeyword {
                offset: self.offset(),
                keyword: token.to_string(),
            });
        }

        match token {
            Token::Include => self.parse_include(),
            Token::Qubit => self.parse_qubit_decl(),
            Token::Const => self.parse_classical_decl(true),
            Token::Bit
            | Token::Int
            | Token::Uint
            | Token::Float
            | Token::Angle
            | Token::Complex
            | Token::Bool
            | Token::Array => self.parse_classical_decl(false),
            Token::Input | Token::Output => self.parse_io_decl(),
            Token::Gate => self.parse_gate_def(),
            Token::Def => self.parse_function_def(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Switch => self.parse_switch(),
            Token::Box => self.parse_box(),
            Token::Break => {
                self.advance();
                self.expect(&Token::Semicolon)?;
                Ok(Statement::Break)
            }
            Token::Continue => {
                self.advance();
                self.expect(&Token::Semicolon)?;
                Ok(Statement::Continue)
            }
            Token::End => {
                self.advance();
                self.expect(&Token::Semicolon)?;
                Ok(Statement::End)
            }
            Token::Return => self.parse_return(),
            Token::Measure => self.parse_measure(),
            Token::GPhase => {
                let call = self.parse_gate_call_named("gphase".into(), vec![])?;
                Ok(Statement::GateCall(call))
            }
            Token::Ctrl | Token::NegCtrl | Token::Inv | Token::Pow => {
                let modifiers = self.parse_modifier_chain()?;
                let name = match self.peek() {
                    Some(Token::GPhase) => {
                        self.advance();
                        "gphase".to_string()
                    }
                    _ => self.parse_identifier()?,
                };
                let call = self.parse_gate_call_named(name, modifiers)?;
                Ok(Statement::GateCall(call))
            }
            Token::Pragma(text) => {
                let offset = self.offset();
                self.advance();
                let pragma = self.parse_pragma_line(&text, offset)?;
                Ok(Statement::Pragma(pragma))
            }
            Token::Identifier(_) => self.parse_identifier_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s) | Token::BitString(s)) => s,
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    offset: self.offset(),
                    expected: "string literal".into(),
                    found: other.to_string(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    fn parse_qubit_decl(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Qubit)?;
        let size = if self.consume(&Token::LBracket) {
            let size = self.parse_expression()?;
            self.expect(&Token::RBracket)?;
            Some(size)
        } else {
            None
        };
        let name = self.parse_identifier()?;
        self.expect(&Token::Semicolon)?;
        Ok(Statement::QubitDecl { name, size })
    }

    /// Parse a classical type as written in source.
    pub(crate) fn parse_type_spec(&mut self) -> ParseResult<TypeSpec> {
        let kind = match self.peek() {
            Some(Token::Bit) => ScalarKind::Bit,
            Some(Token::Int) => ScalarKind::Int,
            Some(Token::Uint) => ScalarKind::Uint,
            Some(Token::Float) => ScalarKind::Float,
            Some(Token::Angle) => ScalarKind::Angle,
            Some(Token::Complex) => ScalarKind::Complex,
            Some(Token::Bool) => {
                self.advance();
                return Ok(TypeSpec::Scalar {
                    kind: ScalarKind::Bool,
                    designator: None,
                });
            }
            Some(Token::Array) => return self.parse_array_type(false, false),
            Some(Token::Readonly) => {
                self.advance();
                return self.parse_array_type(true, false);
            }
            Some(Token::Mutable) => {
                self.advance();
                return self.parse_array_type(true, true);
            }
            _ => return Err(self.unexpected("type")),
        };
        self.advance();

        let designator = if self.consume(&Token::LBracket) {
            // `complex[float[64]]` carries the component width inside an
            // inner float designator.
            let expr = if kind == ScalarKind::Complex && self.check(&Token::Float) {
                self.advance();
                let inner = if self.consume(&Token::LBracket) {
                    let e = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    e
                } else {
                    Expression::IntLiteral(i64::from(crate::types::DEFAULT_FLOAT_WIDTH))
                };
                inner
            } else {
                self.parse_expression()?
            };
            self.expect(&Token::RBracket)?;
            Some(Box::new(expr))
        } else {
            None
        };

        Ok(TypeSpec::Scalar { kind, designator })
    }

    /// `array[T, d0, d1]` or (in def signatures) `array[T, #dim = n]`.
    fn parse_array_type(&mut self, is_ref: bool, mutable: bool) -> ParseResult<TypeSpec> {
        self.expect(&Token::Array)?;
        self.expect(&Token::LBracket)?;
        let elem = Box::new(self.parse_type_spec()?);
        let mut dims = Vec::new();
        let mut ndims = None;
        while self.consume(&Token::Comma) {
            if self.consume(&Token::Dim) {
                self.expect(&Token::Eq)?;
                let offset = self.offset();
                match self.advance() {
                    Some(Token::IntLiteral(n)) if n > 0 => ndims = Some(n as u32),
                    Some(other) => {
                        return Err(ParseError::MalformedLiteral {
                            offset,
                            text: other.to_string(),
                        });
                    }
                    None => return Err(ParseError::UnexpectedEof("#dim value".into())),
                }
                break;
            }
            dims.push(self.parse_expression()?);
        }
        self.expect(&Token::RBracket)?;

        match ndims {
            Some(ndims) => Ok(TypeSpec::ArrayRef {
                elem,
                ndims,
                mutable,
            }),
            None if is_ref => Ok(TypeSpec::ArrayRef {
                elem,
                ndims: dims.len().max(1) as u32,
                mutable,
            }),
            None => Ok(TypeSpec::Array { elem, dims }),
        }
    }

    fn parse_classical_decl(&mut self, is_const: bool) -> ParseResult<Statement> {
        if is_const {
            self.expect(&Token::Const)?;
        }
        let ty = self.parse_type_spec()?;
        let name = self.parse_identifier()?;
        let init = if self.consume(&Token::Eq) {
            if self.check(&Token::Measure) {
                // `bit b = measure q;`: the initializer is a measurement.
                self.advance();
                Some(Expression::Measure(self.parse_qubit_targets()?))
            } else {
                Some(self.parse_expression()?)
            }
        } else {
            None
        };
        self.expect(&Token::Semicolon)?;
        Ok(Statement::ClassicalDecl {
            ty,
            name,
            init,
            is_const,
        })
    }

    fn parse_io_decl(&mut self) -> ParseResult<Statement> {
        let direction = if self.consume(&Token::Input) {
            IoDirection::Input
        } else {
            self.expect(&Token::Output)?;
            IoDirection::Output
        };
        let ty = self.parse_type_spec()?;
        let name = self.parse_identifier()?;
        self.expect(&Token::Semicolon)?;
        Ok(Statement::IoDecl {
            direction,
            ty,
            name,
        })
    }

    fn parse_gate_def(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Gate)?;
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;
        let body = self.parse_block()?;

        Ok(Statement::GateDef {
            name,
            params,
            qubits,
            body,
        })
    }

    fn parse_function_def(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Def)?;
        let name = self.parse_identifier()?;
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_function_arg()?);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        let return_type = if self.consume(&Token::Arrow) {
            Some(self.parse_type_spec()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        Ok(Statement::FunctionDef(FunctionDef {
            name,
            args,
            return_type,
            body,
        }))
    }

    fn parse_function_arg(&mut self) -> ParseResult<FunctionArg> {
        if self.consume(&Token::Qubit) {
            let size = if self.consume(&Token::LBracket) {
                let e = self.parse_expression()?;
                self.expect(&Token::RBracket)?;
                Some(e)
            } else {
                None
            };
            let name = self.parse_identifier()?;
            Ok(FunctionArg::Qubit { name, size })
        } else {
            let ty = self.parse_type_spec()?;
            let name = self.parse_identifier()?;
            Ok(FunctionArg::Classical { ty, name })
        }
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen)?;

        let then_body = self.parse_block_or_statement()?;
        let else_body = if self.consume(&Token::Else) {
            Some(self.parse_block_or_statement()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::While)?;
        self.expect(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen)?;
        let body = self.parse_block_or_statement()?;
        Ok(Statement::While { condition, body })
    }

    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::For)?;
        let ty = self.parse_type_spec()?;
        let variable = self.parse_identifier()?;
        self.expect(&Token::In)?;

        let iterable = if self.consume(&Token::LBracket) {
            // `[a:b]` or `[a:s:b]`: a bracketed range.
            let start = if self.check(&Token::Colon) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            self.expect(&Token::Colon)?;
            let range = self.parse_range_tail(start)?;
            self.expect(&Token::RBracket)?;
            range
        } else {
            self.parse_expression()?
        };

        let body = self.parse_block_or_statement()?;

        Ok(Statement::For {
            ty,
            variable,
            iterable,
            body,
        })
    }

    fn parse_switch(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Switch)?;
        self.expect(&Token::LParen)?;
        let target = self.parse_expression()?;
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.consume(&Token::Case) {
                let labels = self.parse_expression_list(&Token::LBrace)?;
                let body = self.parse_block()?;
                cases.push(SwitchCase { labels, body });
            } else if self.consume(&Token::Default) {
                default = Some(self.parse_block()?);
            } else {
                break;
            }
        }
        self.expect(&Token::RBrace)?;

        Ok(Statement::Switch {
            target,
            cases,
            default,
        })
    }

    fn parse_box(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Box)?;
        // Timing designators are parsed and dropped.
        if self.consume(&Token::LBracket) {
            self.parse_expression()?;
            self.expect(&Token::RBracket)?;
        }
        let body = self.parse_block()?;
        Ok(Statement::Box { body })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Return)?;
        if self.consume(&Token::Semicolon) {
            return Ok(Statement::Return(None));
        }
        let value = if self.check(&Token::Measure) {
            self.advance();
            Expression::Measure(self.parse_qubit_targets()?)
        } else {
            self.parse_expression()?
        };
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Return(Some(value)))
    }

    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(&Token::Measure)?;
        let targets = self.parse_qubit_targets()?;
        let destination = if self.consume(&Token::Arrow) {
            Some(self.parse_lvalue()?)
        } else {
            None
        };
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Measure {
            targets,
            destination,
        })
    }

    fn parse_lvalue(&mut self) -> ParseResult<LValue> {
        let name = self.parse_identifier()?;
        let indices = if self.check(&Token::LBracket) {
            self.parse_index_chain()?
        } else {
            vec![]
        };
        Ok(LValue { name, indices })
    }

    /// A statement starting with an identifier: an assignment, a function
    /// call for side effects, or a gate call.
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let name = self.parse_identifier()?;

        // Assignment forms: `x = ...`, `x += ...`, `x[i] = ...`.
        if self.check(&Token::LBracket) || self.peek_assign_op().is_some() {
            let indices = if self.check(&Token::LBracket) {
                self.parse_index_chain()?
            } else {
                vec![]
            };
            let op = self
                .peek_assign_op()
                .ok_or_else(|| self.unexpected("assignment operator"))?;
            self.advance();

            let value = if self.check(&Token::Measure) {
                self.advance();
                Expression::Measure(self.parse_qubit_targets()?)
            } else {
                self.parse_expression()?
            };
            self.expect(&Token::Semicolon)?;
            return Ok(Statement::Assignment {
                target: LValue { name, indices },
                op,
                value,
            });
        }

        // Call forms: `f(...)` is a function-call statement when followed
        // by `;`, otherwise a parameterized gate call.
        if self.consume(&Token::LParen) {
            let params = self.parse_expression_list(&Token::RParen)?;
            self.expect(&Token::RParen)?;
            if self.consume(&Token::Semicolon) {
                return Ok(Statement::Expr(Expression::Call { name, args: params }));
            }
            let targets = self.parse_qubit_targets()?;
            self.expect(&Token::Semicolon)?;
            return Ok(Statement::GateCall(GateCall {
                name,
                modifiers: vec![],
                params,
                targets,
            }));
        }

        // Plain gate call.
        let call = self.parse_gate_call_tail(name, vec![], vec![])?;
        Ok(Statement::GateCall(call))
    }

    fn peek_assign_op(&self) -> Option<AssignOp> {
        Some(match self.peek()? {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::Add,
            Token::MinusEq => AssignOp::Sub,
            Token::StarEq => AssignOp::Mul,
            Token::SlashEq => AssignOp::Div,
            Token::AmpEq => AssignOp::BitAnd,
            Token::PipeEq => AssignOp::BitOr,
            Token::CaretEq => AssignOp::BitXor,
            Token::ShlEq => AssignOp::Shl,
            Token::ShrEq => AssignOp::Shr,
            _ => return None,
        })
    }

    /// Parse `pow(x) @ inv @ ctrl(2) @ ...`, leaving the gate name
    /// unconsumed. Modifiers are kept outermost-first.
    fn parse_modifier_chain(&mut self) -> ParseResult<Vec<GateModifier>> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek() {
                Some(Token::Inv) => {
                    self.advance();
                    GateModifier::Inv
                }
                Some(Token::Pow) => {
                    self.advance();
                    self.expect(&Token::LParen)?;
                    let e = self.parse_expression()?;
                    self.expect(&Token::RParen)?;
                    GateModifier::Pow(e)
                }
                Some(Token::Ctrl) => {
                    self.advance();
                    GateModifier::Ctrl(self.parse_modifier_count()?)
                }
                Some(Token::NegCtrl) => {
                    self.advance();
                    GateModifier::NegCtrl(self.parse_modifier_count()?)
                }
                _ => break,
            };
            self.expect(&Token::At)?;
            modifiers.push(modifier);
        }
        Ok(modifiers)
    }

    fn parse_modifier_count(&mut self) -> ParseResult<Option<Expression>> {
        if self.consume(&Token::LParen) {
            let e = self.parse_expression()?;
            self.expect(&Token::RParen)?;
            Ok(Some(e))
        } else {
            Ok(None)
        }
    }

    /// Parse the remainder of a gate call whose name (and modifiers) are
    /// known: optional `(params)`, then targets.
    fn parse_gate_call_named(
        &mut self,
        name: String,
        modifiers: Vec<GateModifier>,
    ) -> ParseResult<GateCall> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list(&Token::RParen)?;
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };
        self.parse_gate_call_tail(name, modifiers, params)
    }

    fn parse_gate_call_tail(
        &mut self,
        name: String,
        modifiers: Vec<GateModifier>,
        params: Vec<Expression>,
    ) -> ParseResult<GateCall> {
        // `gphase(θ);` may omit targets entirely.
        let targets = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_qubit_targets()?
        };
        self.expect(&Token::Semicolon)?;
        Ok(GateCall {
            name,
            modifiers,
            params,
            targets,
        })
    }

    /// Parse `{ statements }`.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let open_offset = self.offset();
        self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnmatchedDelimiter {
                    offset: open_offset,
                    delimiter: '{',
                });
            }
            if self.consume(&Token::Semicolon) {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(statements)
    }

    /// Parse a block or a single statement (for `if`/`for`/`while` bodies).
    fn parse_block_or_statement(&mut self) -> ParseResult<Vec<Statement>> {
        if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn stmts(source: &str) -> Vec<Statement> {
        parse(source).unwrap().statements
    }

    #[test]
    fn test_qubit_declarations() {
        let s = stmts("qubit q; qubit[4] r;");
        assert!(matches!(&s[0], Statement::QubitDecl { name, size: None } if name == "q"));
        assert!(matches!(&s[1], Statement::QubitDecl { name, size: Some(_) } if name == "r"));
    }

    #[test]
    fn test_classical_declaration_with_init() {
        let s = stmts("int[8] two = 2;");
        match &s[0] {
            Statement::ClassicalDecl {
                ty, name, init, is_const,
            } => {
                assert!(matches!(
                    ty,
                    TypeSpec::Scalar {
                        kind: ScalarKind::Int,
                        designator: Some(_)
                    }
                ));
                assert_eq!(name, "two");
                assert!(init.is_some());
                assert!(!is_const);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_const_declaration() {
        let s = stmts("const float[64] theta = pi / 4;");
        assert!(matches!(&s[0], Statement::ClassicalDecl { is_const: true, .. }));
    }

    #[test]
    fn test_input_declaration() {
        let s = stmts("input uint[4] a_in;");
        assert!(matches!(
            &s[0],
            Statement::IoDecl {
                direction: IoDirection::Input,
                ..
            }
        ));
    }

    #[test]
    fn test_gate_definition() {
        let s = stmts("gate majority a, b, c { cnot c, b; cnot c, a; ccnot a, b, c; }");
        match &s[0] {
            Statement::GateDef {
                name, params, qubits, body,
            } => {
                assert_eq!(name, "majority");
                assert!(params.is_empty());
                assert_eq!(qubits, &["a", "b", "c"]);
                assert_eq!(body.len(), 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_modifier_chain() {
        let s = stmts("pow(1/2) @ inv @ ctrl @ x q1, q2;");
        match &s[0] {
            Statement::GateCall(call) => {
                assert_eq!(call.name, "x");
                assert_eq!(call.modifiers.len(), 3);
                assert!(matches!(call.modifiers[0], GateModifier::Pow(_)));
                assert!(matches!(call.modifiers[1], GateModifier::Inv));
                assert!(matches!(call.modifiers[2], GateModifier::Ctrl(None)));
                assert_eq!(call.targets.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_gphase_without_targets() {
        let s = stmts("gphase(-pi/2);");
        match &s[0] {
            Statement::GateCall(call) => {
                assert_eq!(call.name, "gphase");
                assert_eq!(call.params.len(), 1);
                assert!(call.targets.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_for_over_range() {
        let s = stmts("for uint i in [0:3] { x q[i]; }");
        match &s[0] {
            Statement::For { variable, iterable, body, .. } => {
                assert_eq!(variable, "i");
                assert!(matches!(iterable, Expression::Range { .. }));
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_measure_arrow() {
        let s = stmts("measure q -> c;");
        assert!(matches!(
            &s[0],
            Statement::Measure { destination: Some(_), .. }
        ));
    }

    #[test]
    fn test_measure_assignment() {
        let s = stmts("c = measure q;");
        match &s[0] {
            Statement::Assignment { value, .. } => {
                assert!(matches!(value, Expression::Measure(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_switch_statement() {
        let s = stmts("switch (x) { case 0, 1 { h q; } default { x q; } }");
        match &s[0] {
            Statement::Switch { cases, default, .. } => {
                assert_eq!(cases.len(), 1);
                assert_eq!(cases[0].labels.len(), 2);
                assert!(default.is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_reserved_keyword_rejected() {
        assert!(matches!(
            parse("reset q;"),
            Err(ParseError::ReservedKeyword { keyword, .. }) if keyword == "reset"
        ));
        assert!(matches!(
            parse("barrier q;"),
            Err(ParseError::ReservedKeyword { .. })
        ));
    }

    #[test]
    fn test_missing_semicolon() {
        assert!(parse("qubit q").is_err());
    }

    #[test]
    fn test_unmatched_brace() {
        assert!(matches!(
            parse("gate g a { x a;"),
            Err(ParseError::UnmatchedDelimiter { delimiter: '{', .. })
        ));
    }

    #[test]
    fn test_function_definition() {
        let s = stmts("def parity(qubit[4] q) -> bit { return measure q[0]; }");
        match &s[0] {
            Statement::FunctionDef(def) => {
                assert_eq!(def.name, "parity");
                assert_eq!(def.args.len(), 1);
                assert!(def.return_type.is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_function_call_statement() {
        let s = stmts("flip(1);");
        assert!(matches!(&s[0], Statement::Expr(Expression::Call { .. })));
    }

    #[test]
    fn test_box_walks_body() {
        let s = stmts("box { h q; }");
        assert!(matches!(&s[0], Statement::Box { body } if body.len() == 1));
    }
}
