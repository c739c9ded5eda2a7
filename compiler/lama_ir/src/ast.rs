//! Parsed syntax tree.
//!
//! This is the immutable output of `lama_parse`. The evaluator never executes
//! it directly: `lama_eval` builds a fresh, self-specializing node tree for
//! each function root, so nodes are never shared between roots.

use crate::{Name, Span};

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// Short-circuit `&&`.
    And,
    /// Short-circuit `||`.
    Or,
}

impl BinaryOp {
    /// Source symbol, for diagnostics.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Whether the right operand is only evaluated depending on the left one.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation `-x`.
    Neg,
    /// Logical negation `!x`.
    Not,
}

impl UnaryOp {
    /// Source symbol, for diagnostics.
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Integer literal.
    Int(i64),
    /// String literal (escapes already processed).
    Str(String),
    /// `true` / `false`.
    Bool(bool),
    /// Identifier: a local if one is in scope, otherwise a function name.
    Ident(Name),
    /// `name = value`; assigning an unknown name declares a local.
    Assign { target: Name, value: Box<Expr> },
    /// `left op right`.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `op operand`.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `callee(args...)`.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `receiver.field`.
    Field { receiver: Box<Expr>, field: Name },
    /// `receiver.field = value`.
    FieldAssign {
        receiver: Box<Expr>,
        field: Name,
        value: Box<Expr>,
    },
}

/// Statement node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// Expression evaluated for its effect.
    Expr(Expr),
    /// `return expr?;`
    Return(Option<Expr>),
    /// `if (cond) { .. } else { .. }`
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    /// `while (cond) { .. }`
    While { cond: Expr, body: Block },
    Break,
    Continue,
    /// Nested `{ .. }`.
    Block(Block),
}

/// A braced statement sequence.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// `function name(params) { body }`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Name,
    pub params: Vec<Name>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDef {
    /// Declared parameter count.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Parser output: function name to definition, in source order.
///
/// A name defined twice keeps its first definition, matching the
/// first-registration-wins rule of the function registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionTable {
    functions: Vec<FunctionDef>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Returns `false` (and drops it) if the name is taken.
    pub fn insert(&mut self, def: FunctionDef) -> bool {
        if self.get(def.name).is_some() {
            return false;
        }
        self.functions.push(def);
        true
    }

    /// Look up a definition by name.
    pub fn get(&self, name: Name) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Declared arity of a function, if defined.
    pub fn arity(&self, name: Name) -> Option<usize> {
        self.get(name).map(FunctionDef::arity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl IntoIterator for FunctionTable {
    type Item = FunctionDef;
    type IntoIter = std::vec::IntoIter<FunctionDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.into_iter()
    }
}
