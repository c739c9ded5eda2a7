//! Lama Parse - lexer and recursive-descent parser.
//!
//! The single entry point is [`parse_source`], which turns source text into a
//! [`FunctionTable`]. The grammar is deliberately small:
//!
//! ```text
//! module   := function*
//! function := 'function' IDENT '(' (IDENT (',' IDENT)*)? ')' block
//! block    := '{' stmt* '}'
//! stmt     := 'return' expr? ';' | 'if' '(' expr ')' block ('else' (block | if))?
//!           | 'while' '(' expr ')' block | 'break' ';' | 'continue' ';'
//!           | block | expr ';'
//! expr     := assignment with precedence || < && < ==,!= < <,<=,>,>= < +,- < *,/,%
//! ```

mod error;
mod lexer;
mod parser;

pub use error::SyntaxError;
pub use lexer::{is_identifier, lex, Token, TokenKind};

use lama_ir::{FunctionTable, Span, StringInterner};

/// Parse a whole source unit into its function table.
///
/// # Errors
/// Returns the first `SyntaxError` encountered, with line and column
/// resolved against `source`.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse_source(source: &str, interner: &StringInterner) -> Result<FunctionTable, SyntaxError> {
    let result = lexer::lex(source, interner)
        .and_then(|tokens| parser::Parser::new(tokens).parse_module());
    match result {
        Ok(table) => {
            tracing::debug!(functions = table.len(), "parsed source");
            Ok(table)
        }
        Err(err) => Err(err.locate(source)),
    }
}

/// Reject argument names that are not plain identifiers.
///
/// Names are spliced into generated source, so anything else would surface
/// as a confusing error inside the generated text.
///
/// # Errors
/// Returns a `SyntaxError` at 1:1 naming the first invalid name.
pub fn check_argument_names(names: &[&str]) -> Result<(), SyntaxError> {
    match names.iter().find(|name| !is_identifier(name)) {
        Some(name) => Err(SyntaxError::at(
            format!("invalid argument name `{name}`"),
            Span::new(0, 0),
        )
        .locate("")),
        None => Ok(()),
    }
}

/// Parse `body` embedded between generated `prefix` and `suffix` text.
///
/// Errors are reported against `body` alone: spans are shifted back by the
/// prefix length and clamped to the body, so a mistake in user text points
/// at the user text rather than at the generated wrapper.
///
/// # Errors
/// Returns the first `SyntaxError` of the combined text.
#[tracing::instrument(level = "debug", skip_all, fields(len = body.len()))]
pub fn parse_wrapped(
    prefix: &str,
    body: &str,
    suffix: &str,
    interner: &StringInterner,
) -> Result<FunctionTable, SyntaxError> {
    let text = format!("{prefix}{body}{suffix}");
    let result =
        lexer::lex(&text, interner).and_then(|tokens| parser::Parser::new(tokens).parse_module());
    result.map_err(|mut err| {
        let shift = |offset: u32| {
            let local = (offset as usize).saturating_sub(prefix.len()).min(body.len());
            u32::try_from(local).unwrap_or(u32::MAX)
        };
        err.span = Span::new(shift(err.span.start), shift(err.span.end));
        err.locate(body)
    })
}
