//! Shapes (hidden classes) and the transition arena.
//!
//! ```text
//!        ROOT {}
//!        /      \
//!     +x          +y
//!   {x:0}       {y:0}
//!     |           |
//!     +y          +x
//!  {x:0,y:1}   {y:0,x:1}
//! ```
//!
//! Every shape except the root has exactly one parent and one added
//! property, so the arena is a tree and never contains cycles.

use lama_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Index of a shape in its `ShapeTable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ShapeId(u32);

impl ShapeId {
    /// The empty root shape every new object starts from.
    pub const ROOT: ShapeId = ShapeId(0);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable property layout.
///
/// A shape records only the property it adds to its parent. The full layout
/// is the chain of added properties up to the root, read through the
/// owning [`ShapeTable`].
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    parent: Option<ShapeId>,
    /// Property added to `parent` to produce this shape.
    added: Option<Name>,
    /// Number of properties; the added one sits in the last slot.
    property_count: usize,
}

impl Shape {
    fn root() -> Self {
        Shape {
            id: ShapeId::ROOT,
            parent: None,
            added: None,
            property_count: 0,
        }
    }

    fn child(&self, id: ShapeId, name: Name) -> Self {
        Shape {
            id,
            parent: Some(self.id),
            added: Some(name),
            property_count: self.property_count + 1,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn parent(&self) -> Option<ShapeId> {
        self.parent
    }

    pub fn added_property(&self) -> Option<Name> {
        self.added
    }

    pub fn property_count(&self) -> usize {
        self.property_count
    }
}

struct ShapeArena {
    shapes: Vec<Arc<Shape>>,
    transitions: FxHashMap<(ShapeId, Name), ShapeId>,
}

impl ShapeArena {
    fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }

    /// Walk from `shape` toward the root looking for the shape that added
    /// `name`.
    fn slot_of(&self, shape: ShapeId, name: Name) -> Option<usize> {
        let mut current = self.shape(shape);
        loop {
            if current.added == Some(name) {
                return Some(current.property_count - 1);
            }
            current = self.shape(current.parent?);
        }
    }

    fn keys(&self, shape: ShapeId) -> Vec<Name> {
        let mut current = self.shape(shape);
        let mut keys = Vec::with_capacity(current.property_count);
        while let (Some(name), Some(parent)) = (current.added, current.parent) {
            keys.push(name);
            current = self.shape(parent);
        }
        keys.reverse();
        keys
    }
}

/// Process-wide shape arena.
///
/// Shapes carry no per-context data, so one table serves every execution
/// context. `transition` is create-if-absent under the write lock: racing
/// callers adding the same property to the same shape all receive the one
/// shape that was inserted first.
pub struct ShapeTable {
    arena: RwLock<ShapeArena>,
}

impl ShapeTable {
    /// Create a table holding only the root shape.
    pub fn new() -> Self {
        ShapeTable {
            arena: RwLock::new(ShapeArena {
                shapes: vec![Arc::new(Shape::root())],
                transitions: FxHashMap::default(),
            }),
        }
    }

    /// The empty root shape.
    #[inline]
    pub fn root(&self) -> ShapeId {
        ShapeId::ROOT
    }

    /// Fetch a shape.
    ///
    /// # Panics
    /// Panics if `id` did not come from this table.
    pub fn get(&self, id: ShapeId) -> Arc<Shape> {
        Arc::clone(&self.arena.read().shapes[id.index()])
    }

    /// Slot holding `name` in `shape`.
    ///
    /// Linear in the number of properties; property nodes cache the result
    /// per shape.
    pub fn slot_of(&self, shape: ShapeId, name: Name) -> Option<usize> {
        self.arena.read().slot_of(shape, name)
    }

    /// Declared property names of `shape` in slot order.
    pub fn keys(&self, shape: ShapeId) -> Vec<Name> {
        self.arena.read().keys(shape)
    }

    /// Existing successor of `from` that adds `name`, without creating one.
    pub fn lookup_transition(&self, from: ShapeId, name: Name) -> Option<ShapeId> {
        self.arena.read().transitions.get(&(from, name)).copied()
    }

    /// Successor of `from` that adds `name`, creating it if absent.
    ///
    /// `name` must not already be declared by `from`; adding an existing
    /// property is a write in place, not a transition.
    pub fn transition(&self, from: ShapeId, name: Name) -> ShapeId {
        if let Some(existing) = self.lookup_transition(from, name) {
            return existing;
        }

        let mut arena = self.arena.write();
        // Double-check after acquiring write lock
        if let Some(&existing) = arena.transitions.get(&(from, name)) {
            return existing;
        }

        debug_assert!(
            arena.slot_of(from, name).is_none(),
            "transition would redeclare an existing property"
        );
        let parent = Arc::clone(&arena.shapes[from.index()]);
        let id = ShapeId(
            u32::try_from(arena.shapes.len())
                .unwrap_or_else(|_| panic!("shape table overflow: {} shapes", arena.shapes.len())),
        );
        arena.shapes.push(Arc::new(parent.child(id, name)));
        arena.transitions.insert((from, name), id);
        tracing::trace!(from = from.raw(), to = id.raw(), "shape transition created");
        id
    }

    /// Number of shapes created so far, including the root.
    pub fn len(&self) -> usize {
        self.arena.read().shapes.len()
    }

    /// Always `false`: the root shape exists from construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for ShapeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShapeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeTable").field("len", &self.len()).finish()
    }
}
