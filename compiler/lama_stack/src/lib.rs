//! Native stack growth for deep recursion.
//!
//! The parser, the lowering pass and the evaluator all recurse once per
//! level of expression nesting. Each recursive entry point wraps its body in
//! [`ensure_sufficient_stack`], which moves onto a fresh stack segment when
//! the current one is nearly exhausted.
//!
//! On `wasm32` the function calls straight through.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const GROW_BY: usize = 2 * 1024 * 1024;

/// Run `f`, growing the native stack first if little of it is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
