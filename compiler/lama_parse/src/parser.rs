//! Parser state, token access and item/statement parsing.
//!
//! Expressions live in `parser/expr.rs`.

mod expr;

use lama_ir::{Block, FunctionDef, FunctionTable, Name, Span, Stmt, StmtKind};
use lama_stack::ensure_sufficient_stack;

use crate::lexer::{Token, TokenKind};
use crate::SyntaxError;

/// Deepest syntax tree accepted before reporting an error.
///
/// Brackets, blocks, unary operators, every operator of a binary chain,
/// every call or field access of a postfix chain and every `else if` count
/// as one level. The bound keeps the depth of the trees handed to lowering,
/// evaluation and drop proportional to it.
const MAX_NESTING_DEPTH: usize = 1024;

/// Parser state.
pub(crate) struct Parser {
    /// Token list from the lexer, terminated by `Eof`.
    tokens: Vec<Token>,
    /// Current token index.
    pos: usize,
    /// Current nesting depth.
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a complete module: a sequence of function definitions.
    pub(crate) fn parse_module(mut self) -> Result<FunctionTable, SyntaxError> {
        let mut table = FunctionTable::new();
        while !self.at_end() {
            let def = self.function()?;
            if !table.insert(def) {
                tracing::debug!("duplicate function definition ignored");
            }
        }
        Ok(table)
    }

    // ===== Token access =====

    fn current(&self) -> &Token {
        // The lexer always appends Eof, so the list is never empty.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consume the current token if it matches `kind`.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {what}, found {}",
                self.current_kind().describe()
            )))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(Name, Span), SyntaxError> {
        if let TokenKind::Ident(name) = *self.current_kind() {
            let span = self.advance().span;
            Ok((name, span))
        } else {
            Err(self.error(format!(
                "expected {what}, found {}",
                self.current_kind().describe()
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(message, self.current_span())
    }

    /// Enter one nesting level, failing past `MAX_NESTING_DEPTH`.
    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.leave_levels(1);
    }

    fn leave_levels(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ===== Items =====

    fn function(&mut self) -> Result<FunctionDef, SyntaxError> {
        let start = self.expect(&TokenKind::Function, "`function`")?.span;
        let (name, _) = self.expect_ident("function name")?;
        self.expect(&TokenKind::LParen, "`(`")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (param, span) = self.expect_ident("parameter name")?;
                if params.contains(&param) {
                    return Err(SyntaxError::at("duplicate parameter name", span));
                }
                params.push(param);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;

        let body = self.block()?;
        let span = start.merge(body.span);
        Ok(FunctionDef {
            name,
            params,
            body,
            span,
        })
    }

    // ===== Statements =====

    fn block(&mut self) -> Result<Block, SyntaxError> {
        self.enter()?;
        let start = self.expect(&TokenKind::LBrace, "`{`")?.span;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.error("expected `}`, found end of input"));
            }
            stmts.push(self.statement()?);
        }
        let end = self.advance().span;
        self.leave();
        Ok(Block {
            stmts,
            span: start.merge(end),
        })
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::LBrace => {
                let block = self.block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                let end = self.expect(&TokenKind::Semicolon, "`;`")?.span;
                Ok(Stmt::new(StmtKind::Return(value), start.merge(end)))
            }
            TokenKind::Break => {
                self.advance();
                let end = self.expect(&TokenKind::Semicolon, "`;`")?.span;
                Ok(Stmt::new(StmtKind::Break, start.merge(end)))
            }
            TokenKind::Continue => {
                self.advance();
                let end = self.expect(&TokenKind::Semicolon, "`;`")?.span;
                Ok(Stmt::new(StmtKind::Continue, start.merge(end)))
            }
            TokenKind::If => self.if_statement(),
            TokenKind::While => {
                self.advance();
                let cond = self.condition()?;
                let body = self.block()?;
                let span = start.merge(body.span);
                Ok(Stmt::new(StmtKind::While { cond, body }, span))
            }
            _ => {
                let expr = self.expression()?;
                let end = self.expect(&TokenKind::Semicolon, "`;`")?.span;
                Ok(Stmt::new(StmtKind::Expr(expr), start.merge(end)))
            }
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.expect(&TokenKind::If, "`if`")?.span;
        let cond = self.condition()?;
        let then_branch = self.block()?;
        let mut span = start.merge(then_branch.span);

        let else_branch = if self.eat(&TokenKind::Else) {
            let block = if self.check(&TokenKind::If) {
                // `else if` desugars to an else block holding one if statement
                self.enter()?;
                let nested = ensure_sufficient_stack(|| self.if_statement())?;
                self.leave();
                let nested_span = nested.span;
                Block {
                    stmts: vec![nested],
                    span: nested_span,
                }
            } else {
                self.block()?
            };
            span = span.merge(block.span);
            Some(block)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    /// `'(' expr ')'` as used by `if` and `while`.
    fn condition(&mut self) -> Result<lama_ir::Expr, SyntaxError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let cond = self.expression()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(cond)
    }
}
