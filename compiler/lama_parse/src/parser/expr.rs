//! Expression parsing: assignment, binary operators, unary, calls, fields.

use lama_ir::{BinaryOp, Expr, ExprKind, UnaryOp};

use lama_stack::ensure_sufficient_stack;

use super::Parser;
use crate::lexer::TokenKind;
use crate::SyntaxError;

impl Parser {
    /// Parse any expression.
    pub(super) fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.enter()?;
        let result = ensure_sufficient_stack(|| self.assignment());
        self.leave();
        result
    }

    fn assignment(&mut self) -> Result<Expr, SyntaxError> {
        let target = self.binary(0)?;
        if !self.check(&TokenKind::Eq) {
            return Ok(target);
        }
        let eq_span = self.advance().span;
        // Right-associative: `a = b = c`
        let value = self.expression()?;
        let span = target.span.merge(value.span);
        match target.kind {
            ExprKind::Ident(name) => Ok(Expr::new(
                ExprKind::Assign {
                    target: name,
                    value: Box::new(value),
                },
                span,
            )),
            ExprKind::Field { receiver, field } => Ok(Expr::new(
                ExprKind::FieldAssign {
                    receiver,
                    field,
                    value: Box::new(value),
                },
                span,
            )),
            _ => Err(SyntaxError::at("invalid assignment target", eq_span)),
        }
    }

    /// Precedence climbing over left-associative binary operators.
    fn binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        let mut levels = 0;

        while let Some((op, prec)) = self.binary_op() {
            if prec < min_prec {
                break;
            }
            // Each operator of a left-associative chain deepens the tree.
            self.enter()?;
            levels += 1;
            self.advance();
            let right = ensure_sufficient_stack(|| self.binary(prec + 1))?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        self.leave_levels(levels);
        Ok(left)
    }

    /// Operator at the cursor and its precedence (higher binds tighter).
    fn binary_op(&self) -> Option<(BinaryOp, u8)> {
        let entry = match self.current_kind() {
            TokenKind::PipePipe => (BinaryOp::Or, 1),
            TokenKind::AmpAmp => (BinaryOp::And, 2),
            TokenKind::EqEq => (BinaryOp::Eq, 3),
            TokenKind::NotEq => (BinaryOp::NotEq, 3),
            TokenKind::Lt => (BinaryOp::Lt, 4),
            TokenKind::LtEq => (BinaryOp::LtEq, 4),
            TokenKind::Gt => (BinaryOp::Gt, 4),
            TokenKind::GtEq => (BinaryOp::GtEq, 4),
            TokenKind::Plus => (BinaryOp::Add, 5),
            TokenKind::Minus => (BinaryOp::Sub, 5),
            TokenKind::Star => (BinaryOp::Mul, 6),
            TokenKind::Slash => (BinaryOp::Div, 6),
            TokenKind::Percent => (BinaryOp::Rem, 6),
            _ => return None,
        };
        Some(entry)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        let start = self.advance().span;
        self.enter()?;
        let operand = self.unary()?;
        self.leave();

        // Fold negative integer literals.
        if op == UnaryOp::Neg {
            if let ExprKind::Int(n) = operand.kind {
                return Ok(Expr::new(ExprKind::Int(-n), start.merge(operand.span)));
            }
        }

        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        let mut levels = 0;
        loop {
            if matches!(self.current_kind(), TokenKind::LParen | TokenKind::Dot) {
                self.enter()?;
                levels += 1;
            }
            if self.eat(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(&TokenKind::RParen, "`)`")?.span;
                let span = expr.span.merge(end);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat(&TokenKind::Dot) {
                let (field, end) = self.expect_ident("property name")?;
                let span = expr.span.merge(end);
                expr = Expr::new(
                    ExprKind::Field {
                        receiver: Box::new(expr),
                        field,
                    },
                    span,
                );
            } else {
                self.leave_levels(levels);
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::LParen => {
                let inner = self.expression()?;
                let end = self.expect(&TokenKind::RParen, "`)`")?.span;
                return Ok(Expr::new(inner.kind, token.span.merge(end)));
            }
            other => {
                return Err(SyntaxError::at(
                    format!("expected expression, found {}", other.describe()),
                    token.span,
                ))
            }
        };
        Ok(Expr::new(kind, token.span))
    }
}
