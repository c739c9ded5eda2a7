//! Call-depth limit and native stack growth for evaluation.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{recursion_limit_exceeded, EvalError};

pub use lama_stack::ensure_sufficient_stack;

/// One level of call depth, released on drop.
pub(crate) struct DepthGuard<'a> {
    depth: &'a AtomicUsize,
}

impl<'a> DepthGuard<'a> {
    /// Enter a call, failing with `StackOverflow` past `limit`.
    pub(crate) fn enter(depth: &'a AtomicUsize, limit: usize) -> Result<Self, EvalError> {
        let previous = depth.fetch_add(1, Ordering::Relaxed);
        if previous >= limit {
            depth.fetch_sub(1, Ordering::Relaxed);
            return Err(recursion_limit_exceeded(limit));
        }
        Ok(DepthGuard { depth })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
    }
}
