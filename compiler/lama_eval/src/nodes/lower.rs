//! Lowering of parsed functions into executable node trees.

use lama_ir::{BinaryOp, Block, Expr, ExprKind, FunctionDef, Name, Stmt, StmtKind, StringInterner};
use rustc_hash::FxHashMap;

use crate::stack::ensure_sufficient_stack;

use super::{BinaryNode, CallNode, FunctionLiteralNode, Node, ReadPropertyNode, WritePropertyNode};
use crate::{CallTarget, Value};

/// Build the call target of one parsed function.
///
/// Parameters take local slots `0..arity` and are copied in from the
/// argument vector by a prologue. Every other name assigned anywhere in the
/// body gets the next slot, so an identifier is a local if the function
/// assigns it and a function name otherwise.
pub(crate) fn lower_function(def: &FunctionDef, interner: &StringInterner) -> CallTarget {
    let arity = def.arity();
    let mut lowerer = Lowerer::default();
    for &param in &def.params {
        lowerer.slot(param);
    }
    lowerer.declare_block(&def.body);

    let mut body: Vec<Node> = (0..arity)
        .map(|index| Node::WriteLocal {
            slot: index,
            value: Box::new(Node::read_argument(index, arity)),
        })
        .collect();
    body.extend(def.body.stmts.iter().map(|stmt| lowerer.stmt(stmt)));

    CallTarget::function(
        def.name,
        interner.lookup(def.name),
        arity,
        lowerer.locals.len(),
        Node::Block(body),
    )
}

#[derive(Default)]
struct Lowerer {
    locals: FxHashMap<Name, usize>,
}

impl Lowerer {
    fn slot(&mut self, name: Name) -> usize {
        let next = self.locals.len();
        *self.locals.entry(name).or_insert(next)
    }

    // ===== Local discovery =====

    fn declare_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.declare_stmt(stmt);
        }
    }

    fn declare_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.declare_stmt_inner(stmt));
    }

    fn declare_stmt_inner(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Return(Some(expr)) => self.declare_expr(expr),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.declare_expr(cond);
                self.declare_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.declare_block(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.declare_expr(cond);
                self.declare_block(body);
            }
            StmtKind::Block(block) => self.declare_block(block),
            StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
        }
    }

    fn declare_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.declare_expr_inner(expr));
    }

    fn declare_expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                self.slot(*target);
                self.declare_expr(value);
            }
            ExprKind::Binary { left, right, .. } => {
                self.declare_expr(left);
                self.declare_expr(right);
            }
            ExprKind::Unary { operand, .. } => self.declare_expr(operand),
            ExprKind::Call { callee, args } => {
                self.declare_expr(callee);
                for arg in args {
                    self.declare_expr(arg);
                }
            }
            ExprKind::Field { receiver, .. } => self.declare_expr(receiver),
            ExprKind::FieldAssign {
                receiver, value, ..
            } => {
                self.declare_expr(receiver);
                self.declare_expr(value);
            }
            ExprKind::Int(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Ident(_) => {}
        }
    }

    // ===== Node construction =====

    fn block(&mut self, block: &Block) -> Node {
        Node::Block(block.stmts.iter().map(|stmt| self.stmt(stmt)).collect())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Node {
        ensure_sufficient_stack(|| self.stmt_inner(stmt))
    }

    fn stmt_inner(&mut self, stmt: &Stmt) -> Node {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::Return(value) => {
                Node::Return(value.as_ref().map(|expr| Box::new(self.expr(expr))))
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => Node::If {
                cond: Box::new(self.expr(cond)),
                then_branch: Box::new(self.block(then_branch)),
                else_branch: else_branch.as_ref().map(|b| Box::new(self.block(b))),
            },
            StmtKind::While { cond, body } => Node::While {
                cond: Box::new(self.expr(cond)),
                body: Box::new(self.block(body)),
            },
            StmtKind::Break => Node::Break,
            StmtKind::Continue => Node::Continue,
            StmtKind::Block(block) => self.block(block),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Node {
        ensure_sufficient_stack(|| self.expr_inner(expr))
    }

    fn expr_inner(&mut self, expr: &Expr) -> Node {
        match &expr.kind {
            ExprKind::Int(n) => Node::Literal(Value::Int(*n)),
            ExprKind::Str(s) => Node::Literal(Value::string(s)),
            ExprKind::Bool(b) => Node::Literal(Value::Bool(*b)),
            ExprKind::Ident(name) => match self.locals.get(name) {
                Some(&slot) => Node::ReadLocal(slot),
                None => Node::FunctionLiteral(FunctionLiteralNode::new(*name)),
            },
            ExprKind::Assign { target, value } => Node::WriteLocal {
                slot: self.slot(*target),
                value: Box::new(self.expr(value)),
            },
            ExprKind::Binary { op, left, right } => {
                let left = self.expr(left);
                let right = self.expr(right);
                match op {
                    BinaryOp::And | BinaryOp::Or => Node::Logical {
                        and: *op == BinaryOp::And,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    _ => Node::Binary(BinaryNode::new(*op, left, right)),
                }
            }
            ExprKind::Unary { op, operand } => Node::Unary {
                op: *op,
                operand: Box::new(self.expr(operand)),
            },
            ExprKind::Call { callee, args } => {
                let callee = self.expr(callee);
                let args = args.iter().map(|arg| self.expr(arg)).collect();
                Node::Call(CallNode::new(callee, args))
            }
            ExprKind::Field { receiver, field } => {
                Node::ReadProperty(ReadPropertyNode::new(self.expr(receiver), *field))
            }
            ExprKind::FieldAssign {
                receiver,
                field,
                value,
            } => {
                let receiver = self.expr(receiver);
                let value = self.expr(value);
                Node::WriteProperty(WritePropertyNode::new(receiver, *field, value))
            }
        }
    }
}
