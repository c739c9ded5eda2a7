//! Runtime error types and their constructors.
//!
//! `EvalErrorKind` gives each failure a typed category; the factory functions
//! below are the way evaluator code creates errors, so messages stay in one
//! place.

use lama_parse::SyntaxError;

use crate::Value;

/// Result of evaluating a node or calling a target.
pub type EvalResult = Result<Value, EvalError>;

/// Typed category of a runtime failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Resolution
    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },
    #[error("{type_name} is not callable")]
    NotCallable { type_name: String },
    #[error("cannot access property `{property}` of {type_name}")]
    NotAnObject { property: String, type_name: String },

    // Types
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("operator `{op}` cannot be applied to {left} and {right}")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
    },

    // Arithmetic
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: String },

    // Control
    #[error("maximum recursion depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },
    #[error("`{keyword}` outside of a loop")]
    InvalidControlFlow { keyword: String },
    #[error("exit({code})")]
    Exit { code: i32 },

    #[error("{message}")]
    Custom { message: String },
}

/// A runtime failure propagated to the host.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
}

impl EvalError {
    /// Error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError { kind, message }
    }

    /// Exit code if this error is an `exit` request.
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            EvalErrorKind::Exit { code } => Some(code),
            _ => None,
        }
    }
}

/// Host-facing error of `parse_and_evaluate`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LamaError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

// Resolution Errors

/// Call of a name that has no definition.
#[cold]
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

/// Call of a value that is not a function.
#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

/// Property access on a value that is not an object.
#[cold]
pub fn not_an_object(property: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAnObject {
        property: property.to_string(),
        type_name: type_name.to_string(),
    })
}

// Type Errors

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// Binary operator applied to unsupported operand types.
#[cold]
pub fn invalid_operands(op: &str, left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidOperands {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    })
}

// Arithmetic Errors

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

// Control Errors

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

/// `break` or `continue` that escaped its function body.
#[cold]
pub fn invalid_control_flow(keyword: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidControlFlow {
        keyword: keyword.to_string(),
    })
}

/// Request to end the program with `code`.
#[cold]
pub fn exit(code: i32) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Exit { code })
}

/// Syntax error raised by source parsed at run time.
#[cold]
pub fn runtime_syntax_error(err: &SyntaxError) -> EvalError {
    EvalError::new(err.to_string())
}
