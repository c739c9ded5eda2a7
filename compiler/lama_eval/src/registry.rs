//! Per-context function registry.

use lama_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::CallTarget;

/// Function name to call target, owned by one execution context.
///
/// Registration never fails and never replaces: the first target registered
/// under a name stays for the life of the context.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<FxHashMap<Name, CallTarget>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: Name) -> Option<CallTarget> {
        self.functions.read().get(&name).cloned()
    }

    /// Register `target` under `name` unless the name is taken.
    ///
    /// Returns `true` if this call added the entry.
    pub fn register(&self, name: Name, target: CallTarget) -> bool {
        if self.functions.read().contains_key(&name) {
            return false;
        }
        let mut functions = self.functions.write();
        if functions.contains_key(&name) {
            return false;
        }
        functions.insert(name, target);
        true
    }

    /// Register every pair, keeping existing entries. Returns how many were
    /// added.
    pub fn register_all(&self, entries: impl IntoIterator<Item = (Name, CallTarget)>) -> usize {
        let mut functions = self.functions.write();
        let mut added = 0;
        for (name, target) in entries {
            if let std::collections::hash_map::Entry::Vacant(slot) = functions.entry(name) {
                slot.insert(target);
                added += 1;
            }
        }
        added
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> Vec<Name> {
        self.functions.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("len", &self.len())
            .finish()
    }
}
