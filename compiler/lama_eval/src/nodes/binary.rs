//! Binary operators with operand-type specialization.

use std::sync::atomic::{AtomicU8, Ordering};

use lama_ir::BinaryOp;

use super::{ExecResult, Frame, Node};
use crate::errors::{division_by_zero, integer_overflow, invalid_operands, EvalError};
use crate::{ExecutionContext, Value};

/// Observed operand kinds of a [`BinaryNode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum BinaryState {
    Uninitialized = 0,
    Int = 1,
    Str = 2,
    Bool = 3,
    Generic = 4,
}

impl BinaryState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => BinaryState::Uninitialized,
            1 => BinaryState::Int,
            2 => BinaryState::Str,
            3 => BinaryState::Bool,
            _ => BinaryState::Generic,
        }
    }

    /// State to specialize to after first seeing `left` and `right`.
    fn observe(left: &Value, right: &Value) -> Self {
        match (left, right) {
            (Value::Int(_), Value::Int(_)) => BinaryState::Int,
            (Value::Str(_), Value::Str(_)) => BinaryState::Str,
            (Value::Bool(_), Value::Bool(_)) => BinaryState::Bool,
            _ => BinaryState::Generic,
        }
    }
}

/// Operands did not match the specialized state.
struct SpecializationMiss;

/// Arithmetic, comparison or equality operator (never `&&` / `||`).
pub(crate) struct BinaryNode {
    op: BinaryOp,
    left: Box<Node>,
    right: Box<Node>,
    state: AtomicU8,
}

impl BinaryNode {
    pub(crate) fn new(op: BinaryOp, left: Node, right: Node) -> Self {
        debug_assert!(!op.is_short_circuit());
        BinaryNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
            state: AtomicU8::new(BinaryState::Uninitialized as u8),
        }
    }

    pub(crate) fn state(&self) -> BinaryState {
        BinaryState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn execute(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        let left = self.left.execute(frame, ctx)?;
        let right = self.right.execute(frame, ctx)?;
        Ok(self.apply(&left, &right)?)
    }

    fn apply(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let state = self.state();
        match state {
            BinaryState::Uninitialized => {
                let next = BinaryState::observe(left, right);
                // Racing first executions may both specialize; either result is valid.
                let _ = self.state.compare_exchange(
                    BinaryState::Uninitialized as u8,
                    next as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                tracing::trace!(op = self.op.as_symbol(), state = ?next, "binary node specialized");
                generic(self.op, left, right)
            }
            BinaryState::Generic => generic(self.op, left, right),
            specialized => match specialized_apply(specialized, self.op, left, right) {
                Ok(result) => result,
                Err(SpecializationMiss) => {
                    self.state
                        .store(BinaryState::Generic as u8, Ordering::Release);
                    tracing::trace!(
                        op = self.op.as_symbol(),
                        from = ?specialized,
                        "binary node generalized"
                    );
                    generic(self.op, left, right)
                }
            },
        }
    }
}

/// Fast path for a specialized state, guarded on the operand kinds.
fn specialized_apply(
    state: BinaryState,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Result<Value, EvalError>, SpecializationMiss> {
    match (state, left, right) {
        (BinaryState::Int, Value::Int(a), Value::Int(b)) => Ok(int_op(op, *a, *b)),
        (BinaryState::Str, Value::Str(a), Value::Str(b)) => Ok(str_op(op, a, b)),
        (BinaryState::Bool, Value::Bool(a), Value::Bool(b)) => Ok(bool_op(op, *a, *b)),
        _ => Err(SpecializationMiss),
    }
}

/// Semantics for every operand combination.
pub(crate) fn generic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(op, *a, *b),
        (Value::Str(a), Value::Str(b)) => str_op(op, a, b),
        (Value::Bool(a), Value::Bool(b)) => bool_op(op, *a, *b),
        // `+` with a string on either side concatenates display forms.
        (Value::Str(_), _) | (_, Value::Str(_)) if op == BinaryOp::Add => {
            Ok(Value::string(&format!("{left}{right}")))
        }
        _ => match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::NotEq => Ok(Value::Bool(left != right)),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let checked = |result: Option<i64>, name: &str| {
        result.map(Value::Int).ok_or_else(|| integer_overflow(name))
    };
    match op {
        BinaryOp::Add => checked(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked(a.checked_mul(b), "multiplication"),
        BinaryOp::Div if b == 0 => Err(division_by_zero()),
        BinaryOp::Div => checked(a.checked_div(b), "division"),
        BinaryOp::Rem if b == 0 => Err(division_by_zero()),
        BinaryOp::Rem => checked(a.checked_rem(b), "remainder"),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        BinaryOp::And | BinaryOp::Or => {
            Err(invalid_operands(op.as_symbol(), "Number", "Number"))
        }
    }
}

fn str_op(op: BinaryOp, a: &str, b: &str) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(&joined))
        }
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        _ => Err(invalid_operands(op.as_symbol(), "String", "String")),
    }
}

fn bool_op(op: BinaryOp, a: bool, b: bool) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        _ => Err(invalid_operands(op.as_symbol(), "Boolean", "Boolean")),
    }
}

#[cold]
fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    invalid_operands(op.as_symbol(), left.type_name(), right.type_name())
}
