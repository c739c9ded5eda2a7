//! Builtin functions and the process-wide builtin registry.
//!
//! A builtin is described by a [`BuiltinDescriptor`]. The first lookup of a
//! descriptor synthesizes its root: one argument-read node per declared
//! parameter feeding the native body. The resulting call target is cached per
//! descriptor and shared by every execution context of the language.

mod standard;

use dashmap::DashMap;
use lama_ir::StringInterner;

use crate::errors::EvalResult;
use crate::nodes::Node;
use crate::{CallTarget, ExecutionContext, Value};

pub(crate) use standard::STANDARD_BUILTINS;

/// Native body of a builtin.
pub type BuiltinFn = fn(&ExecutionContext, &[Value]) -> EvalResult;

/// Static description of a builtin: its name, parameter count and body.
#[derive(Copy, Clone)]
pub struct BuiltinDescriptor {
    pub name: &'static str,
    pub arity: usize,
    pub body: BuiltinFn,
}

impl BuiltinDescriptor {
    pub const fn new(name: &'static str, arity: usize, body: BuiltinFn) -> Self {
        BuiltinDescriptor { name, arity, body }
    }

    /// Identity of the descriptor: name, arity and body address.
    fn key(&self) -> BuiltinKey {
        BuiltinKey {
            name: self.name,
            arity: self.arity,
            body: self.body as usize,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct BuiltinKey {
    name: &'static str,
    arity: usize,
    body: usize,
}

impl std::fmt::Debug for BuiltinDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinDescriptor({}/{})", self.name, self.arity)
    }
}

/// Descriptor to call target, shared by all contexts.
///
/// Descriptors that share a name but differ in arity or body get distinct
/// targets.
#[derive(Default)]
pub struct BuiltinRegistry {
    targets: DashMap<BuiltinKey, CallTarget>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached target for `descriptor`, creating it on first request.
    ///
    /// Racing creators all receive the target that was inserted first.
    pub fn lookup_or_create(
        &self,
        descriptor: &BuiltinDescriptor,
        interner: &StringInterner,
    ) -> CallTarget {
        let key = descriptor.key();
        if let Some(target) = self.targets.get(&key) {
            return target.value().clone();
        }
        let candidate = create_target(descriptor, interner);
        let target = self
            .targets
            .entry(key)
            .or_insert(candidate)
            .value()
            .clone();
        tracing::debug!(builtin = descriptor.name, "builtin target created");
        target
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn create_target(descriptor: &BuiltinDescriptor, interner: &StringInterner) -> CallTarget {
    let arity = descriptor.arity;
    let arguments = (0..arity)
        .map(|index| Node::read_argument(index, arity))
        .collect();
    CallTarget::builtin(
        interner.intern(descriptor.name),
        descriptor.name,
        arity,
        Node::Builtin {
            body: descriptor.body,
            arguments,
        },
    )
}

#[cfg(test)]
mod tests;
