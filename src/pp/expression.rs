//! Integer expressions of `#if` and `#elif`.
//!
//! The expression has already been macro-expanded and `defined` has been
//! folded into integer constants when it reaches the parser.

use crate::pp::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    LShift,
    RShift,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicOr,
}

#[derive(Debug)]
pub enum PPExpr {
    Number(i64),
    /// Identifier left after expansion; evaluates to 0
    Identifier,
    Binary(BinaryOp, Box<PPExpr>, Box<PPExpr>),
    Unary(UnaryOp, Box<PPExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("invalid expression near '{0}'")]
    Invalid(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{0}'")]
    IntegerOverflow(String),
}

impl PPExpr {
    pub fn evaluate(&self) -> Result<i64, ExprError> {
        match self {
            PPExpr::Number(n) => Ok(*n),
            PPExpr::Identifier => Ok(0),
            PPExpr::Unary(op, operand) => {
                let o = operand.evaluate()?;
                Ok(match op {
                    UnaryOp::Plus => o,
                    UnaryOp::Minus => o.wrapping_neg(),
                    UnaryOp::BitNot => !o,
                    UnaryOp::LogicNot => (o == 0) as i64,
                })
            }
            PPExpr::Binary(BinaryOp::LogicAnd, left, right) => {
                // right side is not evaluated once the result is known
                if left.evaluate()? == 0 {
                    return Ok(0);
                }
                Ok((right.evaluate()? != 0) as i64)
            }
            PPExpr::Binary(BinaryOp::LogicOr, left, right) => {
                if left.evaluate()? != 0 {
                    return Ok(1);
                }
                Ok((right.evaluate()? != 0) as i64)
            }
            PPExpr::Binary(op, left, right) => {
                let l = left.evaluate()?;
                let r = right.evaluate()?;
                Ok(match op {
                    BinaryOp::Mul => l.wrapping_mul(r),
                    BinaryOp::Div if r == 0 => return Err(ExprError::DivisionByZero),
                    BinaryOp::Div => l.wrapping_div(r),
                    BinaryOp::Mod if r == 0 => return Err(ExprError::DivisionByZero),
                    BinaryOp::Mod => l.wrapping_rem(r),
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Sub => l.wrapping_sub(r),
                    BinaryOp::LShift => l.wrapping_shl(r as u32),
                    BinaryOp::RShift => l.wrapping_shr(r as u32),
                    BinaryOp::Less => (l < r) as i64,
                    BinaryOp::Greater => (l > r) as i64,
                    BinaryOp::LessEqual => (l <= r) as i64,
                    BinaryOp::GreaterEqual => (l >= r) as i64,
                    BinaryOp::Equal => (l == r) as i64,
                    BinaryOp::NotEqual => (l != r) as i64,
                    BinaryOp::BitAnd => l & r,
                    BinaryOp::BitXor => l ^ r,
                    BinaryOp::BitOr => l | r,
                    BinaryOp::LogicAnd | BinaryOp::LogicOr => unreachable!("handled above"),
                })
            }
        }
    }
}

/// Binding power of each binary operator, loosest first
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let op = match kind {
        TokenKind::LogicOr => (BinaryOp::LogicOr, 1),
        TokenKind::LogicAnd => (BinaryOp::LogicAnd, 2),
        TokenKind::Or => (BinaryOp::BitOr, 3),
        TokenKind::Xor => (BinaryOp::BitXor, 4),
        TokenKind::And => (BinaryOp::BitAnd, 5),
        TokenKind::Equal => (BinaryOp::Equal, 6),
        TokenKind::NotEqual => (BinaryOp::NotEqual, 6),
        TokenKind::Less => (BinaryOp::Less, 7),
        TokenKind::Greater => (BinaryOp::Greater, 7),
        TokenKind::LessEqual => (BinaryOp::LessEqual, 7),
        TokenKind::GreaterEqual => (BinaryOp::GreaterEqual, 7),
        TokenKind::LeftShift => (BinaryOp::LShift, 8),
        TokenKind::RightShift => (BinaryOp::RShift, 8),
        TokenKind::Plus => (BinaryOp::Add, 9),
        TokenKind::Minus => (BinaryOp::Sub, 9),
        TokenKind::Star => (BinaryOp::Mul, 10),
        TokenKind::Slash => (BinaryOp::Div, 10),
        TokenKind::Percent => (BinaryOp::Mod, 10),
        _ => return None,
    };
    Some(op)
}

/// Precedence-climbing parser over one directive line
pub struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        ExprParser { tokens, pos: 0 }
    }

    /// Parse one complete expression; trailing tokens are left for the caller
    pub fn parse_expression(&mut self) -> Result<PPExpr, ExprError> {
        self.parse_binary(1)
    }

    /// Tokens following the parsed expression
    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.pos..]
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn error_here(&self) -> ExprError {
        match self.peek() {
            Some(token) => ExprError::Invalid(token.text().to_string()),
            None => ExprError::Invalid(String::new()),
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<PPExpr, ExprError> {
        let mut left = self.parse_unary()?;
        while let Some(token) = self.peek() {
            let Some((op, prec)) = binary_op(token.kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(prec + 1)?;
            left = PPExpr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<PPExpr, ExprError> {
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            Some(TokenKind::Not) => UnaryOp::LogicNot,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(PPExpr::Unary(op, Box::new(operand)))
    }

    fn parse_primary(&mut self) -> Result<PPExpr, ExprError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here());
        };
        match token.kind {
            TokenKind::IntConstant(_) => {
                self.pos += 1;
                match token.int_value() {
                    Some(value) => Ok(PPExpr::Number(value)),
                    None => Err(ExprError::IntegerOverflow(token.text().to_string())),
                }
            }
            TokenKind::Identifier(_) => {
                self.pos += 1;
                Ok(PPExpr::Identifier)
            }
            TokenKind::LeftParen => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                match self.peek() {
                    Some(t) if t.kind == TokenKind::RightParen => {
                        self.pos += 1;
                        Ok(expr)
                    }
                    _ => Err(self.error_here()),
                }
            }
            _ => Err(self.error_here()),
        }
    }
}
