//! Lexer for Lama using logos with string interning.
//!
//! Identifiers are interned while lexing so the parser only ever sees
//! `Name`s. Whitespace and `//` comments are skipped.

use lama_ir::{Name, Span, StringInterner};
use logos::Logos;

use crate::SyntaxError;

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
enum RawToken {
    // === Keywords ===
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Symbols ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // === Operators ===
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
}

/// Token kinds seen by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Function,
    Return,
    If,
    Else,
    While,
    Break,
    Continue,
    True,
    False,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Dot,
    EqEq,
    Eq,
    NotEq,
    LtEq,
    Lt,
    GtEq,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AmpAmp,
    PipePipe,
    Int(i64),
    Str(String),
    Ident(Name),
    /// End of input; always the last token.
    Eof,
}

impl TokenKind {
    /// Human-readable description for "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Int(n) => format!("integer `{n}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(_) => "identifier".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Function => "function",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::EqEq => "==",
            TokenKind::Eq => "=",
            TokenKind::NotEq => "!=",
            TokenKind::LtEq => "<=",
            TokenKind::Lt => "<",
            TokenKind::GtEq => ">=",
            TokenKind::Gt => ">",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Int(_) | TokenKind::Str(_) | TokenKind::Ident(_) | TokenKind::Eof => "",
        }
    }
}

/// A lexed token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Whether `text` is exactly one identifier (keywords excluded).
pub fn is_identifier(text: &str) -> bool {
    let mut logos = RawToken::lexer(text);
    matches!(logos.next(), Some(Ok(RawToken::Ident)))
        && logos.span() == (0..text.len())
        && logos.next().is_none()
}

/// Lex `source` into tokens terminated by `TokenKind::Eof`.
///
/// Errors carry only a span; `parse_source` fills in line and column.
pub fn lex(source: &str, interner: &StringInterner) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();
        let Ok(raw) = result else {
            let message = if slice.starts_with(|c: char| c.is_ascii_digit()) {
                format!("integer literal `{slice}` is out of range")
            } else if slice.starts_with('"') {
                "unterminated string literal".to_string()
            } else {
                format!("unexpected character `{slice}`")
            };
            return Err(SyntaxError::at(message, span));
        };
        let kind = match raw {
            RawToken::Function => TokenKind::Function,
            RawToken::Return => TokenKind::Return,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::While => TokenKind::While,
            RawToken::Break => TokenKind::Break,
            RawToken::Continue => TokenKind::Continue,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::Eq => TokenKind::Eq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Bang => TokenKind::Bang,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::Int(n) => TokenKind::Int(n),
            RawToken::String => TokenKind::Str(unescape(&slice[1..slice.len() - 1], span)?),
            RawToken::Ident => TokenKind::Ident(interner.intern(slice)),
        };
        tokens.push(Token { kind, span });
    }

    let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });
    Ok(tokens)
}

/// Process backslash escapes inside a string literal body.
fn unescape(body: &str, span: Span) -> Result<String, SyntaxError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(SyntaxError::at(
                    format!("unknown escape sequence `\\{other}`"),
                    span,
                ))
            }
            None => return Err(SyntaxError::at("unterminated escape sequence", span)),
        }
    }
    Ok(out)
}
