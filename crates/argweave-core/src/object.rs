//! Reflective object instances
//!
//! An `ObjectRef` is a shared handle to an instance of a described class.
//! Cloning the handle shares identity, so an instance mutated through one
//! handle is observed through all of them. Field slots sit behind a
//! `parking_lot::RwLock`; reads hand out clones and never keep the lock.
//!
//! Because instances are shared and mutable, object graphs may be cyclic.
//! Recursive walks (serialization, formatting, structural equality) mark the
//! objects they are inside of with `ObjectRef::enter` and stop when they
//! reach one again.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::descriptor::ClassDescriptor;
use crate::value::Value;

/// Kind of recursive walk over an object graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Serializing to the interchange form
    Serialize,
    /// `Display` or `Debug` formatting
    Format,
    /// Structural equality against another object
    Compare,
}

thread_local! {
    static ACTIVE: RefCell<Vec<(Walk, usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an object as being walked on the current thread until dropped
#[must_use]
pub struct WalkGuard {
    entry: (Walk, usize, usize),
}

impl WalkGuard {
    fn enter(entry: (Walk, usize, usize)) -> Option<Self> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&entry) {
                return None;
            }
            active.push(entry);
            Some(Self { entry })
        })
    }
}

impl Drop for WalkGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|e| *e == self.entry) {
                active.remove(pos);
            }
        });
    }
}

struct ObjectInner {
    class: Arc<ClassDescriptor>,
    slots: RwLock<Vec<Value>>,
}

/// Shared handle to a class instance
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectInner>);

impl ObjectRef {
    /// Allocate an instance with every field at its initial value
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        let slots = class.fields().iter().map(|f| f.initial_value()).collect();
        Self(Arc::new(ObjectInner {
            class,
            slots: RwLock::new(slots),
        }))
    }

    /// Allocate an instance and set the given fields; unknown names are ignored
    pub fn with_fields<'a>(
        class: Arc<ClassDescriptor>,
        fields: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Self {
        let obj = Self::new(class);
        for (name, value) in fields {
            obj.set(name, value);
        }
        obj
    }

    /// The instance's class
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.0.class
    }

    /// The instance's class name
    pub fn class_name(&self) -> &str {
        self.0.class.name()
    }

    /// Read a field by name
    pub fn get(&self, name: &str) -> Option<Value> {
        let index = self.0.class.field(name)?.index;
        Some(self.0.slots.read()[index].clone())
    }

    /// Write a field by name. Returns false if the class has no such field.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.0.class.field(name) {
            Some(field) => {
                self.0.slots.write()[field.index] = value;
                true
            }
            None => false,
        }
    }

    /// Write a field slot by index. Returns false if out of range.
    pub fn set_index(&self, index: usize, value: Value) -> bool {
        match self.0.slots.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all field values, in slot order
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.slots.read().clone()
    }

    /// Field names paired with a snapshot of their values
    pub fn entries(&self) -> Vec<(String, Value)> {
        let slots = self.snapshot();
        self.0
            .class
            .fields()
            .iter()
            .map(|f| (f.name.clone(), slots[f.index].clone()))
            .collect()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Enter this object during a recursive `walk`.
    ///
    /// Returns `None` when the current thread is already inside this object
    /// for the same kind of walk, i.e. the graph loops back to it.
    pub fn enter(&self, walk: Walk) -> Option<WalkGuard> {
        WalkGuard::enter((walk, self.address(), 0))
    }

    /// Identical, or same class with equal fields.
    ///
    /// A pair already under comparison further up a cyclic graph counts as equal.
    pub fn structurally_eq(&self, other: &ObjectRef) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.class_name() != other.class_name() {
            return false;
        }
        match WalkGuard::enter((Walk::Compare, self.address(), other.address())) {
            Some(_guard) => self.snapshot() == other.snapshot(),
            None => true,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.enter(Walk::Format) else {
            return write!(f, "{}(..)", self.class_name());
        };
        write!(f, "{}(", self.class_name())?;
        for (i, (name, value)) in self.entries().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.enter(Walk::Format) else {
            return write!(f, "{} {{ .. }}", self.class_name());
        };
        let mut s = f.debug_struct(self.class_name());
        for (name, value) in self.entries() {
            s.field(&name, &value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Primitive, TypeRef};

    fn point() -> Arc<ClassDescriptor> {
        ClassDescriptor::builder("Point")
            .field("x", TypeRef::Primitive(Primitive::Int))
            .field("y", TypeRef::Primitive(Primitive::Int))
            .build()
    }

    #[test]
    fn test_new_object_has_initial_values() {
        let obj = ObjectRef::new(point());
        assert_eq!(obj.get("x"), Some(Value::Int(0)));
        assert_eq!(obj.get("missing"), None);
    }

    #[test]
    fn test_shared_identity() {
        let a = ObjectRef::new(point());
        let b = a.clone();
        assert!(b.set("x", Value::Int(5)));
        assert_eq!(a.get("x"), Some(Value::Int(5)));
        assert!(a.ptr_eq(&b));
        assert!(!a.set("z", Value::Int(1)));
    }

    #[test]
    fn test_structural_equality() {
        let a = ObjectRef::with_fields(point(), [("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = ObjectRef::with_fields(point(), [("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert!(!a.ptr_eq(&b));
        assert!(a.structurally_eq(&b));
        b.set("y", Value::Int(3));
        assert!(!a.structurally_eq(&b));
    }

    fn node() -> Arc<ClassDescriptor> {
        ClassDescriptor::builder("Node")
            .field("label", TypeRef::String)
            .field("next", TypeRef::named("Node"))
            .build()
    }

    fn ring(label: &str) -> ObjectRef {
        let node = ObjectRef::with_fields(node(), [("label", Value::str(label))]);
        node.set("next", Value::Object(node.clone()));
        node
    }

    #[test]
    fn test_cyclic_graph_formats() {
        let a = ring("a");
        assert_eq!(a.to_string(), "Node(label=a, next=Node(..))");
        assert_eq!(format!("{:?}", a), "Node { label: Str(\"a\"), next: Object(Node { .. }) }");
    }

    #[test]
    fn test_cyclic_graph_compares() {
        let a = ring("a");
        assert!(a.structurally_eq(&ring("a")));
        assert!(!a.structurally_eq(&ring("b")));
        assert_eq!(Value::Object(a.clone()), Value::Object(a));
    }

    #[test]
    fn test_walk_guard_releases_on_drop() {
        let a = ObjectRef::new(point());
        let guard = a.enter(Walk::Serialize);
        assert!(guard.is_some());
        assert!(a.enter(Walk::Serialize).is_none());
        assert!(a.enter(Walk::Format).is_some());
        drop(guard);
        assert!(a.enter(Walk::Serialize).is_some());
    }

    #[test]
    fn test_display() {
        let a = ObjectRef::with_fields(point(), [("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(a.to_string(), "Point(x=1, y=2)");
    }
}
