use std::mem;

use crate::path::ast::{BinOp, Expr, NameTest, PathExpr, PathStart, Step};
use crate::path::lexer::{Lexer, Token};
use crate::query::QueryError;

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, QueryError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, QueryError> {
        let expr = self.parse_expression()?;
        if self.current_token != Token::Eof {
            return Err(self.error(format!(
                "unexpected {:?} after the expression",
                self.current_token
            )));
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Result<(), QueryError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), QueryError> {
        if !self.check(&expected) {
            return Err(self.error(format!(
                "expected {:?}, got {:?}",
                expected, self.current_token
            )));
        }
        self.advance()
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Syntax {
            message: message.into(),
            position: self.lexer.position(),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, QueryError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;

            left = Expr::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_comparison()?;

            left = Expr::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_additive()?;

        if let Some(op) = match &self.current_token {
            Token::Eq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::NotEq),
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::LtEq),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::GtEq),
            _ => None,
        } {
            self.advance()?;
            let right = self.parse_additive()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Div => BinOp::Divide,
                Token::Mod => BinOp::Modulo,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, QueryError> {
        if self.check(&Token::Minus) {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_primary()
    }

    /// Primary expressions: literals, variables, paths, function calls,
    /// parenthesized expressions.
    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Literal(s))
            }
            Token::Variable(name) => {
                self.advance()?;
                if self.check(&Token::Slash) {
                    self.parse_relative_path(PathStart::Variable(name), Vec::new())
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Dot => {
                self.advance()?;
                if self.check(&Token::Slash) {
                    self.parse_relative_path(PathStart::Context, Vec::new())
                } else {
                    Ok(Expr::Path(PathExpr {
                        start: PathStart::Context,
                        steps: Vec::new(),
                    }))
                }
            }
            Token::Identifier(name) => {
                self.advance()?;
                if self.check(&Token::LParen) {
                    return self.parse_function_call(name);
                }
                let first = self.parse_predicates(NameTest::Name(name))?;
                if self.check(&Token::Slash) {
                    self.parse_relative_path(PathStart::Context, vec![first])
                } else {
                    Ok(Expr::Path(PathExpr {
                        start: PathStart::Context,
                        steps: vec![first],
                    }))
                }
            }
            Token::Star => {
                self.advance()?;
                let first = self.parse_predicates(NameTest::Any)?;
                if self.check(&Token::Slash) {
                    self.parse_relative_path(PathStart::Context, vec![first])
                } else {
                    Ok(Expr::Path(PathExpr {
                        start: PathStart::Context,
                        steps: vec![first],
                    }))
                }
            }
            token => {
                self.current_token = token;
                Err(self.error(format!(
                    "unexpected {:?} in expression",
                    self.current_token
                )))
            }
        }
    }

    /// Remaining `/step` segments of a path whose first steps are already
    /// parsed. The current token is the `/`.
    fn parse_relative_path(
        &mut self,
        start: PathStart,
        mut steps: Vec<Step>,
    ) -> Result<Expr, QueryError> {
        while self.check(&Token::Slash) {
            self.advance()?;
            let test = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Identifier(name) => {
                    self.advance()?;
                    NameTest::Name(name)
                }
                Token::Star => {
                    self.advance()?;
                    NameTest::Any
                }
                token => {
                    self.current_token = token;
                    return Err(self.error(format!(
                        "expected a step name after '/', got {:?}",
                        self.current_token
                    )));
                }
            };
            steps.push(self.parse_predicates(test)?);
        }
        Ok(Expr::Path(PathExpr { start, steps }))
    }

    /// `[expr]` predicates following a step name.
    fn parse_predicates(&mut self, test: NameTest) -> Result<Step, QueryError> {
        let mut predicates = Vec::new();
        while self.check(&Token::LBracket) {
            self.advance()?;
            predicates.push(self.parse_expression()?);
            self.expect(Token::RBracket)?;
        }
        Ok(Step { test, predicates })
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr, QueryError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(&Token::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        Ok(Expr::FunctionCall { name, args })
    }
}
