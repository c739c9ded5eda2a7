//! Dynamically shaped objects.

use lama_ir::Name;

use crate::allocation::{AllocationReporter, AllocationSize};
use crate::shape::{ShapeId, ShapeTable};

/// A property bag whose layout is described by a shape.
///
/// `slots[i]` holds the value of the shape's `i`-th key. Objects never
/// remove properties, so the slot vector only grows.
#[derive(Clone, Debug)]
pub struct DynamicObject<V> {
    shape: ShapeId,
    slots: Vec<V>,
}

impl<V> DynamicObject<V> {
    /// Allocate an empty object bound to the root shape.
    ///
    /// The reporter sees `on_enter` before the object exists and
    /// `on_return` once it is fully built. The size is reported as unknown
    /// because slots grow with each added property.
    pub fn allocate(reporter: &dyn AllocationReporter) -> Self {
        reporter.on_enter(AllocationSize::Unknown);
        let object = DynamicObject {
            shape: ShapeId::ROOT,
            slots: Vec::new(),
        };
        reporter.on_return(object.shape, AllocationSize::Unknown);
        object
    }

    #[inline]
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Number of properties currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value at a known slot.
    ///
    /// Callers holding a cached `(shape, slot)` pair must compare the shape
    /// first; a stale slot index reads an unrelated property.
    #[inline]
    pub fn slot(&self, index: usize) -> Option<&V> {
        self.slots.get(index)
    }

    /// Overwrite a known slot. Returns `false` if the slot does not exist.
    #[inline]
    pub fn set_slot(&mut self, index: usize, value: V) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Append a property through an already-resolved transition.
    ///
    /// `to` must be the successor of the current shape, whose new key
    /// occupies the slot right after the existing ones.
    #[inline]
    pub fn push_with_shape(&mut self, to: ShapeId, value: V) {
        self.slots.push(value);
        self.shape = to;
    }

    /// Read a property through the shape table.
    pub fn get(&self, shapes: &ShapeTable, name: Name) -> Option<&V> {
        shapes
            .slot_of(self.shape, name)
            .and_then(|slot| self.slots.get(slot))
    }

    /// Whether `name` is declared by this object's shape.
    pub fn contains(&self, shapes: &ShapeTable, name: Name) -> bool {
        shapes.slot_of(self.shape, name).is_some()
    }

    /// Write a property, transitioning to a new shape when `name` is new.
    ///
    /// Returns the object's shape after the write.
    pub fn set(&mut self, shapes: &ShapeTable, name: Name, value: V) -> ShapeId {
        if let Some(slot) = shapes.slot_of(self.shape, name) {
            self.slots[slot] = value;
            return self.shape;
        }
        let next = shapes.transition(self.shape, name);
        self.push_with_shape(next, value);
        next
    }

    /// Property names in insertion order.
    pub fn keys(&self, shapes: &ShapeTable) -> Vec<Name> {
        shapes.keys(self.shape)
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn entries<'a>(&'a self, shapes: &ShapeTable) -> impl Iterator<Item = (Name, &'a V)> + 'a {
        let keys = self.keys(shapes);
        keys.into_iter().zip(self.slots.iter())
    }
}
