//! Lama IR - shared front-end types for the Lama runtime.
//!
//! This crate contains the data structures every other Lama crate agrees on:
//! - `Name`: interned identifiers (function names, locals, property keys)
//! - `StringInterner` / `SharedInterner`: the process-wide name table
//! - `Span` / `LineIndex`: source positions for diagnostics
//! - `ast`: the parsed syntax tree handed from the parser to the evaluator
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers become `Name(u32)` so that registry
//!   and shape lookups compare integers, not strings.
//! - **Parse once, build many**: the parsed tree is immutable; the evaluator
//!   builds its own self-specializing node tree from it.

pub mod ast;
mod interner;
mod name;
mod span;

pub use ast::{
    BinaryOp, Block, Expr, ExprKind, FunctionDef, FunctionTable, Stmt, StmtKind, UnaryOp,
};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::{LineIndex, Span};
