//! Call targets: immutable, shareable handles to one root node.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lama_ir::Name;

use crate::errors::{invalid_control_flow, undefined_function, EvalResult};
use crate::nodes::{ControlAction, ExecResult, Frame, Node};
use crate::stack::ensure_sufficient_stack;
use crate::{ExecutionContext, Value};

/// A callable root: a user function, a builtin, an undefined-function stub
/// or the evaluator produced by `parse`.
///
/// Identity is pointer identity. Registries hand out clones of one target,
/// so call-site caches can compare targets cheaply.
#[derive(Clone)]
pub struct CallTarget(Arc<RootNode>);

pub(crate) struct RootNode {
    name: Name,
    label: Arc<str>,
    arity: usize,
    body: RootBody,
}

pub(crate) enum RootBody {
    Function { local_count: usize, body: Node },
    Builtin(Node),
    Undefined,
    Evaluator(Evaluator),
}

/// Root of a parsed unit.
pub(crate) struct Evaluator {
    functions: Vec<(Name, CallTarget)>,
    main: Option<CallTarget>,
    /// Registration already done; only trusted while a single context runs.
    registered: AtomicBool,
}

impl CallTarget {
    fn new(name: Name, label: &str, arity: usize, body: RootBody) -> Self {
        CallTarget(Arc::new(RootNode {
            name,
            label: Arc::from(label),
            arity,
            body,
        }))
    }

    pub(crate) fn function(
        name: Name,
        label: &str,
        arity: usize,
        local_count: usize,
        body: Node,
    ) -> Self {
        Self::new(name, label, arity, RootBody::Function { local_count, body })
    }

    pub(crate) fn builtin(name: Name, label: &str, arity: usize, body: Node) -> Self {
        Self::new(name, label, arity, RootBody::Builtin(body))
    }

    pub(crate) fn undefined(name: Name, label: &str) -> Self {
        Self::new(name, label, 0, RootBody::Undefined)
    }

    pub(crate) fn evaluator(
        name: Name,
        functions: Vec<(Name, CallTarget)>,
        main: Option<CallTarget>,
    ) -> Self {
        let arity = main.as_ref().map_or(0, CallTarget::arity);
        Self::new(
            name,
            "<eval>",
            arity,
            RootBody::Evaluator(Evaluator {
                functions,
                main,
                registered: AtomicBool::new(false),
            }),
        )
    }

    pub fn name(&self) -> Name {
        self.0.name
    }

    /// Display name: the function or builtin name.
    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    /// Whether calling this target can only fail with `UndefinedFunction`.
    pub fn is_undefined(&self) -> bool {
        matches!(self.0.body, RootBody::Undefined)
    }

    pub fn ptr_eq(a: &CallTarget, b: &CallTarget) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &RootNode {
        &self.0
    }

    /// Invoke with positional arguments.
    ///
    /// Missing arguments read as `Unit`; extra arguments are ignored.
    pub fn call(&self, context: &ExecutionContext, arguments: &[Value]) -> EvalResult {
        let _depth = context.enter_call()?;
        ensure_sufficient_stack(|| self.0.execute(context, arguments))
    }
}

impl RootNode {
    #[cfg(test)]
    pub(crate) fn body(&self) -> &RootBody {
        &self.body
    }

    fn execute(&self, context: &ExecutionContext, arguments: &[Value]) -> EvalResult {
        match &self.body {
            RootBody::Function { local_count, body } => {
                let mut frame = Frame::new(arguments, *local_count);
                finish(body.execute(&mut frame, context))
            }
            RootBody::Builtin(body) => {
                let mut frame = Frame::new(arguments, 0);
                finish_builtin(body.execute(&mut frame, context))
            }
            RootBody::Undefined => Err(undefined_function(&self.label)),
            RootBody::Evaluator(evaluator) => evaluator.execute(context, arguments),
        }
    }
}

/// Convert the outcome of a function body into the value of the call.
///
/// Function bodies are statement blocks: their value arrives through
/// `Return`, and falling off the end yields `Unit`.
fn finish(result: ExecResult) -> EvalResult {
    match result {
        Ok(_) => Ok(Value::Unit),
        Err(ControlAction::Return(value)) => Ok(value),
        Err(ControlAction::Error(err)) => Err(err),
        Err(ControlAction::Break) => Err(invalid_control_flow("break")),
        Err(ControlAction::Continue) => Err(invalid_control_flow("continue")),
    }
}

/// Builtin bodies are expressions: the body's value is the call's value.
fn finish_builtin(result: ExecResult) -> EvalResult {
    match result {
        Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
        Err(ControlAction::Error(err)) => Err(err),
        Err(ControlAction::Break) => Err(invalid_control_flow("break")),
        Err(ControlAction::Continue) => Err(invalid_control_flow("continue")),
    }
}

impl Evaluator {
    #[cfg(test)]
    pub(crate) fn main(&self) -> Option<&CallTarget> {
        self.main.as_ref()
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn execute(&self, context: &ExecutionContext, arguments: &[Value]) -> EvalResult {
        let single = context.language().single_context().is_valid();
        if !(single && self.is_registered()) {
            let added = context
                .registry()
                .register_all(self.functions.iter().map(|(name, target)| (*name, target.clone())));
            tracing::debug!(added, total = self.functions.len(), "registered parsed functions");
            if single {
                self.registered.store(true, Ordering::Release);
            }
        }

        match &self.main {
            Some(main) => main.call(context, arguments),
            None => Ok(Value::Unit),
        }
    }
}

impl PartialEq for CallTarget {
    fn eq(&self, other: &Self) -> bool {
        CallTarget::ptr_eq(self, other)
    }
}

impl Eq for CallTarget {}

impl fmt::Debug for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0.body {
            RootBody::Function { .. } => "function",
            RootBody::Builtin(_) => "builtin",
            RootBody::Undefined => "undefined",
            RootBody::Evaluator(_) => "evaluator",
        };
        write!(f, "CallTarget({kind} {}/{})", self.0.label, self.0.arity)
    }
}
