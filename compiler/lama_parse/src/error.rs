//! Syntax errors.

use lama_ir::{LineIndex, Span};

/// A malformed-source error with its position.
///
/// Fatal to the parse attempt that produced it and to nothing else: the
/// language and any live execution contexts are unaffected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    /// 1-based line, 0 until `locate` runs.
    pub line: usize,
    /// 1-based column, 0 until `locate` runs.
    pub column: usize,
}

impl SyntaxError {
    /// Error at `span`; line/column are resolved later against the source.
    pub(crate) fn at(message: impl Into<String>, span: Span) -> Self {
        SyntaxError {
            message: message.into(),
            span,
            line: 0,
            column: 0,
        }
    }

    /// Fill in line and column from the source the span points into.
    #[must_use]
    pub(crate) fn locate(mut self, source: &str) -> Self {
        let (line, column) = LineIndex::new(source).line_col(source, self.span.start);
        self.line = line;
        self.column = column;
        self
    }
}
