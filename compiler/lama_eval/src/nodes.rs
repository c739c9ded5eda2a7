//! Self-specializing executable node tree.
//!
//! Every function body is lowered from the parsed AST into a tree of
//! [`Node`]s owned by exactly one root. Nodes that benefit from type
//! feedback carry an explicit state machine:
//!
//! | Node | States |
//! |------|--------|
//! | [`BinaryNode`] | `Uninitialized -> Int / Str / Bool -> Generic` |
//! | [`ReadPropertyNode`] / [`WritePropertyNode`] | `Uninitialized -> Monomorphic -> Generic` |
//! | [`CallNode`] | `Uninitialized -> Direct -> Indirect` |
//! | [`FunctionLiteralNode`] | cached target while the single-context assumption holds |
//!
//! A specialized state is a guess. When its guard fails the node runs the
//! generic path for that execution and moves to the generic state for good;
//! the two paths compute the same result.
//!
//! State lives in atomics and `parking_lot` locks so call targets, and the
//! node trees behind them, can be shared between threads.

mod binary;
mod call;
mod lower;
mod property;

use lama_ir::UnaryOp;
use smallvec::SmallVec;

use crate::builtins::BuiltinFn;
use crate::errors::{integer_overflow, type_mismatch, EvalError};
use crate::stack::ensure_sufficient_stack;
use crate::{ExecutionContext, Value};

pub(crate) use binary::BinaryNode;
pub(crate) use call::{CallNode, FunctionLiteralNode};
pub(crate) use lower::lower_function;
pub(crate) use property::{ReadPropertyNode, WritePropertyNode};

/// Non-local exits threaded through `execute`.
///
/// `Return`, `Break` and `Continue` are ordinary control flow and are
/// consumed by the enclosing function or loop; only `Error` reaches the host.
#[derive(Debug)]
pub(crate) enum ControlAction {
    Error(EvalError),
    Return(Value),
    Break,
    Continue,
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Error(err)
    }
}

pub(crate) type ExecResult = Result<Value, ControlAction>;

/// Activation record of one call.
pub(crate) struct Frame<'a> {
    arguments: &'a [Value],
    locals: Vec<Value>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(arguments: &'a [Value], local_count: usize) -> Self {
        Frame {
            arguments,
            locals: vec![Value::Unit; local_count],
        }
    }
}

/// Executable node.
pub(crate) enum Node {
    Literal(Value),
    ReadLocal(usize),
    WriteLocal {
        slot: usize,
        value: Box<Node>,
    },
    /// Positional argument of the current frame; missing arguments read as
    /// `Unit`.
    ReadArgument(usize),
    Binary(BinaryNode),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    /// Short-circuit `&&` (`and == true`) or `||`.
    Logical {
        and: bool,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call(CallNode),
    FunctionLiteral(FunctionLiteralNode),
    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    Break,
    Continue,
    Return(Option<Box<Node>>),
    Block(Vec<Node>),
    ReadProperty(ReadPropertyNode),
    WriteProperty(WritePropertyNode),
    /// Body of a builtin: evaluates its argument reads, then the native
    /// function.
    Builtin {
        body: BuiltinFn,
        arguments: Vec<Node>,
    },
}

impl Node {
    /// Argument read for a callee of `arity` parameters.
    ///
    /// # Panics
    /// Panics if `index >= arity`; argument reads are created by the runtime
    /// itself, so a bad index is a bug, not a user error.
    pub(crate) fn read_argument(index: usize, arity: usize) -> Self {
        assert!(
            index < arity,
            "argument read {index} out of range for arity {arity}"
        );
        Node::ReadArgument(index)
    }

    pub(crate) fn execute(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        ensure_sufficient_stack(|| self.execute_inner(frame, ctx))
    }

    fn execute_inner(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        match self {
            Node::Literal(value) => Ok(value.clone()),
            Node::ReadLocal(slot) => Ok(frame.locals[*slot].clone()),
            Node::WriteLocal { slot, value } => {
                let value = value.execute(frame, ctx)?;
                frame.locals[*slot] = value.clone();
                Ok(value)
            }
            Node::ReadArgument(index) => {
                Ok(frame.arguments.get(*index).cloned().unwrap_or_default())
            }
            Node::Binary(node) => node.execute(frame, ctx),
            Node::Unary { op, operand } => {
                let value = operand.execute(frame, ctx)?;
                Ok(unary(*op, &value)?)
            }
            Node::Logical { and, left, right } => {
                let left = condition(left.execute(frame, ctx)?)?;
                // `&&` stops on false, `||` stops on true.
                if left != *and {
                    return Ok(Value::Bool(left));
                }
                let right = condition(right.execute(frame, ctx)?)?;
                Ok(Value::Bool(right))
            }
            Node::Call(node) => node.execute(frame, ctx),
            Node::FunctionLiteral(node) => Ok(Value::Function(node.resolve(ctx))),
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if condition(cond.execute(frame, ctx)?)? {
                    then_branch.execute(frame, ctx)?;
                } else if let Some(else_branch) = else_branch {
                    else_branch.execute(frame, ctx)?;
                }
                Ok(Value::Unit)
            }
            Node::While { cond, body } => {
                while condition(cond.execute(frame, ctx)?)? {
                    match body.execute(frame, ctx) {
                        Ok(_) | Err(ControlAction::Continue) => {}
                        Err(ControlAction::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Unit)
            }
            Node::Break => Err(ControlAction::Break),
            Node::Continue => Err(ControlAction::Continue),
            Node::Return(value) => {
                let value = match value {
                    Some(node) => node.execute(frame, ctx)?,
                    None => Value::Unit,
                };
                Err(ControlAction::Return(value))
            }
            Node::Block(nodes) => {
                for node in nodes {
                    node.execute(frame, ctx)?;
                }
                Ok(Value::Unit)
            }
            Node::ReadProperty(node) => node.execute(frame, ctx),
            Node::WriteProperty(node) => node.execute(frame, ctx),
            Node::Builtin { body, arguments } => {
                let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(argument.execute(frame, ctx)?);
                }
                Ok(body(ctx, &values)?)
            }
        }
    }
}

/// Require a boolean for a condition or logical operand.
fn condition(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(type_mismatch("Boolean", other.type_name())),
    }
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("negation")),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(type_mismatch("Number", other.type_name())),
        (UnaryOp::Not, other) => Err(type_mismatch("Boolean", other.type_name())),
    }
}

#[cfg(test)]
mod tests;
