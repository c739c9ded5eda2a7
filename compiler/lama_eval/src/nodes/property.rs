//! Property reads and writes with monomorphic shape caches.

use lama_ir::Name;
use lama_object::{ShapeId, ShapeTable};
use parking_lot::RwLock;

use super::{ExecResult, Frame, Node};
use crate::errors::{not_an_object, EvalError};
use crate::value::ObjectRef;
use crate::{ExecutionContext, Value};

/// Cache state of a property node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PropertyState {
    Uninitialized,
    /// Objects of `shape` hold the property at `slot`.
    Monomorphic { shape: ShapeId, slot: usize },
    /// Writing a new property moves objects of `from` to `to`.
    Transition { from: ShapeId, to: ShapeId },
    Generic,
}

impl PropertyState {
    /// Record an observation; a second, different observation goes generic.
    fn observe(self, seen: PropertyState) -> PropertyState {
        match self {
            PropertyState::Uninitialized => seen,
            current if current == seen => current,
            _ => PropertyState::Generic,
        }
    }
}

fn receiver_object(value: Value, name: Name, ctx: &ExecutionContext) -> Result<ObjectRef, EvalError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(not_an_object(
            ctx.language().interner().lookup(name),
            other.type_name(),
        )),
    }
}

/// `receiver.name`
pub(crate) struct ReadPropertyNode {
    receiver: Box<Node>,
    name: Name,
    cache: RwLock<PropertyState>,
}

impl ReadPropertyNode {
    pub(crate) fn new(receiver: Node, name: Name) -> Self {
        ReadPropertyNode {
            receiver: Box::new(receiver),
            name,
            cache: RwLock::new(PropertyState::Uninitialized),
        }
    }

    pub(crate) fn state(&self) -> PropertyState {
        *self.cache.read()
    }

    pub(crate) fn execute(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        let receiver = self.receiver.execute(frame, ctx)?;
        let object = receiver_object(receiver, self.name, ctx)?;
        let object = object.read();

        if let PropertyState::Monomorphic { shape, slot } = self.state() {
            if object.shape() == shape {
                return Ok(object.slot(slot).cloned().unwrap_or_default());
            }
        }

        Ok(self.read_generic(ctx.language().shapes(), object.shape(), |slot| {
            object.slot(slot).cloned()
        }))
    }

    /// Slow path through the shape table. Absent properties read as `Unit`.
    fn read_generic(
        &self,
        shapes: &ShapeTable,
        shape: ShapeId,
        read: impl FnOnce(usize) -> Option<Value>,
    ) -> Value {
        let Some(slot) = shapes.slot_of(shape, self.name) else {
            return Value::Unit;
        };
        self.record(PropertyState::Monomorphic { shape, slot });
        read(slot).unwrap_or_default()
    }

    fn record(&self, seen: PropertyState) {
        if self.state() == PropertyState::Generic {
            return;
        }
        let mut cache = self.cache.write();
        let next = cache.observe(seen);
        if next != *cache {
            tracing::trace!(from = ?*cache, to = ?next, "property read cache updated");
            *cache = next;
        }
    }
}

/// `receiver.name = value`
pub(crate) struct WritePropertyNode {
    receiver: Box<Node>,
    name: Name,
    value: Box<Node>,
    cache: RwLock<PropertyState>,
}

impl WritePropertyNode {
    pub(crate) fn new(receiver: Node, name: Name, value: Node) -> Self {
        WritePropertyNode {
            receiver: Box::new(receiver),
            name,
            value: Box::new(value),
            cache: RwLock::new(PropertyState::Uninitialized),
        }
    }

    pub(crate) fn state(&self) -> PropertyState {
        *self.cache.read()
    }

    pub(crate) fn execute(&self, frame: &mut Frame<'_>, ctx: &ExecutionContext) -> ExecResult {
        let receiver = self.receiver.execute(frame, ctx)?;
        let value = self.value.execute(frame, ctx)?;
        let object = receiver_object(receiver, self.name, ctx)?;
        let mut object = object.write();

        match self.state() {
            PropertyState::Monomorphic { shape, slot } if object.shape() == shape => {
                object.set_slot(slot, value.clone());
                return Ok(value);
            }
            PropertyState::Transition { from, to } if object.shape() == from => {
                object.push_with_shape(to, value.clone());
                return Ok(value);
            }
            _ => {}
        }

        let before = object.shape();
        let after = object.set(ctx.language().shapes(), self.name, value.clone());
        let seen = if before == after {
            // Present in `before`, so the lookup cannot miss.
            ctx.language()
                .shapes()
                .slot_of(before, self.name)
                .map_or(PropertyState::Generic, |slot| PropertyState::Monomorphic {
                    shape: before,
                    slot,
                })
        } else {
            PropertyState::Transition {
                from: before,
                to: after,
            }
        };

        if self.state() != PropertyState::Generic {
            let mut cache = self.cache.write();
            let next = cache.observe(seen);
            if next != *cache {
                tracing::trace!(from = ?*cache, to = ?next, "property write cache updated");
                *cache = next;
            }
        }
        Ok(value)
    }
}
