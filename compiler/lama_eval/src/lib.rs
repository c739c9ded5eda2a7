//! Lama Eval - self-specializing evaluator and runtime facade.
//!
//! # Architecture
//!
//! - [`Language`]: process-wide state (names, shapes, builtin targets,
//!   undefined-function stubs) and the single/multi-context assumption.
//! - [`ExecutionContext`]: one program instance with its own
//!   [`FunctionRegistry`], builtins and shutdown hooks.
//! - [`CallTarget`]: shareable handle to one root node; functions, builtins,
//!   stubs and parse evaluators are all call targets.
//! - `nodes`: the executable tree, whose operator, property and call nodes
//!   rewrite their own state from observed runtime types.
//!
//! # Example
//!
//! ```
//! use lama_eval::{Language, Value};
//!
//! let language = Language::new();
//! let context = language.create_context();
//! let sum = context
//!     .parse_and_evaluate("x + y", &["x", "y"], &[Value::Int(2), Value::Int(3)])
//!     .unwrap_or_default();
//! assert_eq!(sum, Value::Int(5));
//! ```

mod builtins;
mod call_target;
mod context;
pub mod errors;
mod language;
mod nodes;
mod output;
mod registry;
mod stack;
mod value;

pub use builtins::{BuiltinDescriptor, BuiltinFn, BuiltinRegistry};
pub use call_target::CallTarget;
pub use context::{ContextBuilder, ExecutionContext};
pub use errors::{EvalError, EvalErrorKind, EvalResult, LamaError};
pub use language::{
    Assumption, ExitMode, ExitReport, Language, LanguageBuilder, LanguageConfig, LifecycleState,
    DEFAULT_RECURSION_LIMIT, ID, MIME_TYPE, NAME,
};
pub use output::{buffer_output, silent_output, stdout_output, OutputSink, SharedOutput};
pub use registry::FunctionRegistry;
pub use stack::ensure_sufficient_stack;
pub use value::{ObjectRef, Value};
