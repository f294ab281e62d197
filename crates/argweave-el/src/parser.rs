//! Recursive-descent parser
//!
//! Precedence, loosest first: ternary/elvis, `or`, `and`, equality,
//! relational, additive, multiplicative, unary, postfix (`.`, `?.`, `[]`).

use argweave_core::Value;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{ElError, ElResult};
use crate::lexer::{tokenize, Span, Token};

/// Maximum nesting of parenthesized, indexed, argument and unary
/// subexpressions before a snippet is rejected
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse an expression string
pub fn parse(source: &str) -> ElResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((token, span)) => Err(ElError::Parse {
            message: format!("unexpected trailing {:?}", token),
            offset: span.start,
        }),
    }
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, s)| s.start)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> ElResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn error(&self, message: String) -> ElError {
        ElError::Parse {
            message,
            offset: self.offset(),
        }
    }

    /// Run `parse` one nesting level deeper, failing past the limit
    fn nested<T>(&mut self, name: &str, parse: impl FnOnce(&mut Self) -> ElResult<T>) -> ElResult<T> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.depth -= 1;
            return Err(self.error(format!(
                "Maximum nesting depth ({}) exceeded in {}",
                MAX_NESTING_DEPTH, name
            )));
        }
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> ElResult<Expr> {
        self.nested("expression", Self::expression_inner)
    }

    fn expression_inner(&mut self) -> ElResult<Expr> {
        let condition = self.or()?;
        if self.eat(&Token::Question) {
            let then = self.expression()?;
            self.expect(Token::Colon, "':' in ternary")?;
            let otherwise = self.expression()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        if self.eat(&Token::Elvis) {
            let fallback = self.expression()?;
            return Ok(Expr::Elvis {
                value: Box::new(condition),
                fallback: Box::new(fallback),
            });
        }
        Ok(condition)
    }

    fn or(&mut self) -> ElResult<Expr> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> ElResult<Expr> {
        let mut left = self.equality()?;
        while self.eat(&Token::And) {
            let right = self.equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> ElResult<Expr> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.relational()?;
            left = binary(op, left, right);
        }
    }

    fn relational(&mut self) -> ElResult<Expr> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::LtEq) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::GtEq) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        Ok(binary(op, left, right))
    }

    fn additive(&mut self) -> ElResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn multiplicative(&mut self) -> ElResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> ElResult<Expr> {
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.nested("unary operand", Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ElResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            let safe = match self.peek() {
                Some(Token::Dot) => false,
                Some(Token::SafeDot) => true,
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                    continue;
                }
                _ => return Ok(expr),
            };
            self.pos += 1;
            let name = self.identifier()?;
            expr = self.member(expr, name, safe)?;
        }
    }

    /// Property read or method call on `target`, depending on a following `(`
    fn member(&mut self, target: Expr, name: String, safe: bool) -> ElResult<Expr> {
        if self.eat(&Token::LParen) {
            let args = self.arguments()?;
            Ok(Expr::MethodCall {
                target: Box::new(target),
                name,
                args,
                safe,
            })
        } else {
            Ok(Expr::Property {
                target: Box::new(target),
                name,
                safe,
            })
        }
    }

    fn arguments(&mut self) -> ElResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma, "',' or ')'")?;
        }
    }

    fn identifier(&mut self) -> ElResult<String> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some(Token::Ident(name)) => Ok(name),
                _ => Err(self.error("expected identifier".to_string())),
            },
            _ => Err(self.error("expected identifier".to_string())),
        }
    }

    fn primary(&mut self) -> ElResult<Expr> {
        let offset = self.offset();
        let token = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of expression".to_string()))?;
        match token {
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Int(i) => Ok(Expr::Literal(
                i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i)),
            )),
            Token::Float(f) => Ok(Expr::Literal(Value::Double(f))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Variable(name) => Ok(Expr::Variable(name)),
            Token::Bean(name) => Ok(Expr::Bean(name)),
            Token::TypeStart => {
                let mut name = self.identifier()?;
                while self.eat(&Token::Dot) {
                    name.push('.');
                    name.push_str(&self.identifier()?);
                }
                self.expect(Token::RParen, "')' closing type reference")?;
                Ok(Expr::Type(name))
            }
            Token::Ident(name) => self.member(Expr::This, name, false),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ElError::Parse {
                message: format!("unexpected {:?}", other),
                offset,
            }),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
