//! Calls and function-name resolution.

use lama_ir::Name;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::{ExecResult, Frame, Node};
use crate::errors::not_callable;
use crate::{CallTarget, ExecutionContext, Value};

/// Cache state of a [`CallNode`].
#[derive(Clone, Debug)]
pub(crate) enum CallState {
    Uninitialized,
    /// Every call so far went to this target.
    Direct(CallTarget),
    /// Seen more than one target.
    Indirect,
}

/// `callee(arguments..)`
///
/// A site whose callee is a function name and which has only ever called
/// one registered target skips resolution while the language runs a single
/// context: registration never replaces a name, so resolving again would
/// return the cached target.
pub(crate) struct CallNode {
    callee: Box<Node>,
    arguments: Vec<Node>,
    cache: RwLock<CallState>,
}

impl CallNode {
    pub(crate) fn new(callee: Node, arguments: Vec<Node>) -> Self {
        CallNode {
            callee: Box::new(callee),
            arguments,
            cache: RwLock::new(CallState::Uninitialized),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> CallState {
        self.cache.read().clone()
    }

    pub(crate) fn execute(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        let target = match self.direct_target(ctx) {
            Some(target) => target,
            None => {
                let target = match self.callee.execute(frame, ctx)? {
                    Value::Function(target) => target,
                    other => return Err(not_callable(other.type_name()).into()),
                };
                self.observe(&target);
                target
            }
        };

        let mut arguments: SmallVec<[Value; 4]> = SmallVec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            arguments.push(argument.execute(frame, ctx)?);
        }

        Ok(target.call(ctx, &arguments)?)
    }

    /// Cached target usable without evaluating the callee, if any.
    ///
    /// Stubs never qualify: a later registration must still be found.
    pub(crate) fn direct_target(&self, ctx: &ExecutionContext) -> Option<CallTarget> {
        if !matches!(*self.callee, Node::FunctionLiteral(_))
            || !ctx.language().single_context().is_valid()
        {
            return None;
        }
        match &*self.cache.read() {
            CallState::Direct(target) if !target.is_undefined() => Some(target.clone()),
            _ => None,
        }
    }

    /// Track whether this site is monomorphic.
    fn observe(&self, target: &CallTarget) {
        {
            let cache = self.cache.read();
            match &*cache {
                CallState::Direct(cached) if cached == target => return,
                CallState::Indirect => return,
                _ => {}
            }
        }
        let mut cache = self.cache.write();
        let next = match &*cache {
            CallState::Uninitialized => CallState::Direct(target.clone()),
            CallState::Direct(cached) if cached == target => return,
            CallState::Direct(_) | CallState::Indirect => CallState::Indirect,
        };
        tracing::trace!(callee = target.label(), state = ?next, "call site updated");
        *cache = next;
    }
}

/// Resolution of a free identifier to a function.
///
/// Looks the name up in the running context's function registry, falling
/// back to the undefined-function stub. A registered target is cached only
/// while the language runs a single context: with several contexts the same
/// node can run against different registries. Stubs are never cached, so a
/// definition registered after the first failed lookup is picked up.
pub(crate) struct FunctionLiteralNode {
    name: Name,
    cached: RwLock<Option<CallTarget>>,
}

impl FunctionLiteralNode {
    pub(crate) fn new(name: Name) -> Self {
        FunctionLiteralNode {
            name,
            cached: RwLock::new(None),
        }
    }

    pub(crate) fn resolve(&self, ctx: &ExecutionContext) -> CallTarget {
        let single = ctx.language().single_context().is_valid();
        if single {
            if let Some(target) = &*self.cached.read() {
                return target.clone();
            }
        }

        match ctx.registry().lookup(self.name) {
            Some(target) => {
                if single {
                    *self.cached.write() = Some(target.clone());
                }
                target
            }
            None => ctx.language().undefined_function(self.name),
        }
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> Option<CallTarget> {
        self.cached.read().clone()
    }
}
