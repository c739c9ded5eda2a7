//! Runtime values.

use std::fmt;
use std::sync::Arc;

use lama_object::DynamicObject;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::CallTarget;

/// A Lama runtime value.
///
/// Cloning is cheap: strings, functions and objects are reference counted.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absence of a value; what functions without `return` produce.
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Function(CallTarget),
    Object(ObjectRef),
}

impl Value {
    /// Type name as reported by `typeOf` and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Number",
            Value::Str(_) => "String",
            Value::Function(_) => "Function",
            Value::Object(_) => "Object",
        }
    }

    #[inline]
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn string(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&CallTarget> {
        match self {
            Value::Function(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Strings compare by content, functions and objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Function(target) => write!(f, "{}", target.label()),
            Value::Object(_) => write!(f, "[object]"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Shared handle to a dynamic object.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<DynamicObject<Value>>>);

impl ObjectRef {
    pub fn new(object: DynamicObject<Value>) -> Self {
        ObjectRef(Arc::new(RwLock::new(object)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DynamicObject<Value>> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, DynamicObject<Value>> {
        self.0.write()
    }

    /// Address used for identity comparison and cycle detection.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(object) => f
                .debug_struct("ObjectRef")
                .field("shape", &object.shape())
                .field("len", &object.len())
                .finish(),
            None => f.write_str("ObjectRef(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests;
