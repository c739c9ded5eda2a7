//! Lama Object - hidden-class object model.
//!
//! - [`ShapeTable`]: process-wide arena of immutable shapes linked by
//!   property-addition transitions `(parent, name) -> child`.
//! - [`DynamicObject`]: a shape reference plus a growable slot vector.
//! - [`AllocationReporter`]: hook notified around every object allocation.
//!
//! # Shape identity
//!
//! Shapes are insertion-ordered: adding `x` then `y` reaches a different
//! shape than adding `y` then `x`, although both describe the same key set.
//! Objects built by the same sequence of additions always share one shape,
//! which is what property inline caches rely on.
//!
//! The value type stored in slots is a parameter so this crate does not
//! depend on the evaluator.

mod allocation;
mod object;
mod shape;

pub use allocation::{AllocationReporter, AllocationSize, CountingReporter, NoopReporter};
pub use object::DynamicObject;
pub use shape::{Shape, ShapeId, ShapeTable};
