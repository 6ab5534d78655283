//! Host object model.
//!
//! Symbols are declared through [`ClassDef`] registration tables instead of
//! decorators. The weaver turns a `ClassDef` into an installed [`Class`] whose
//! executable definitions live in guarded [`Slot`]s. Instances are
//! [`ObjectRef`]s: shared, identity-compared handles carrying an
//! insertion-ordered field map.
//!
//! Callers use the same surface whether or not a symbol was woven:
//!
//! - [`Class::construct`]
//! - [`Class::invoke_static`]
//! - [`ObjectRef::invoke`]
//! - [`ObjectRef::get`] / [`ObjectRef::set`]

mod class;
mod def;
mod slot;

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

pub use class::{Class, ClassRef, Method, Property};
pub use def::{ClassDef, MethodDef, ParamDef, PropertyDef};
pub use slot::Slot;

use crate::error::{Fault, WeavingError};
use crate::value::Value;

/// Constructor body: initializes fields of a freshly allocated object.
pub type ConstructorBody = dyn Fn(&ObjectRef, &[Value]) -> Result<(), Fault> + Send + Sync;

/// Installed constructor: allocates and returns an instance.
pub type ConstructFn = dyn Fn(&[Value]) -> Result<ObjectRef, Fault> + Send + Sync;

/// Method body. Static methods receive the class statics object.
pub type MethodFn = dyn Fn(&ObjectRef, &[Value]) -> Result<Value, Fault> + Send + Sync;

/// Property getter.
pub type GetterFn = dyn Fn(&ObjectRef) -> Result<Value, Fault> + Send + Sync;

/// Property setter.
pub type SetterFn = dyn Fn(&ObjectRef, Value) -> Result<(), Fault> + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// ObjectRef
// ─────────────────────────────────────────────────────────────────────────────

struct ObjectInner {
    id: String,
    label: Arc<str>,
    class: Option<ClassRef>,
    fields: RwLock<IndexMap<String, Value>>,
    ready: AtomicBool,
}

/// Shared handle to a host object.
///
/// Equality is identity: two handles are equal when they point at the same
/// object.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectInner>);

impl ObjectRef {
    fn alloc(label: Arc<str>, class: Option<ClassRef>, ready: bool) -> Self {
        Self(Arc::new(ObjectInner {
            id: nanoid::nanoid!(8),
            label,
            class,
            fields: RwLock::new(IndexMap::new()),
            ready: AtomicBool::new(ready),
        }))
    }

    /// Allocates an initialized-state instance of `class` with no fields.
    #[must_use]
    pub fn new(class: &ClassRef) -> Self {
        Self::alloc(class.name().into(), Some(Arc::clone(class)), true)
    }

    /// Allocates a placeholder instance of `class`.
    ///
    /// The placeholder is not ready until [`mark_ready`](Self::mark_ready) is
    /// called; advice reading it before then gets
    /// [`WeavingError::UninitializedInstance`].
    #[must_use]
    pub fn pending(class: &ClassRef) -> Self {
        Self::alloc(class.name().into(), Some(Arc::clone(class)), false)
    }

    /// Allocates an object that belongs to no class.
    #[must_use]
    pub fn detached(label: impl Into<Arc<str>>) -> Self {
        Self::alloc(label.into(), None, true)
    }

    /// Short random id, used for display.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Class name, or the label of a detached object.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// The class this object is an instance of.
    #[must_use]
    pub fn class(&self) -> Option<&ClassRef> {
        self.0.class.as_ref()
    }

    /// Whether the object is fully constructed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.0.ready.load(Ordering::Acquire)
    }

    /// Releases a placeholder.
    pub fn mark_ready(&self) {
        self.0.ready.store(true, Ordering::Release);
    }

    /// Whether the object is an instance of `class` or of one of its subclasses.
    #[must_use]
    pub fn instance_of(&self, class: &ClassRef) -> bool {
        let mut current = self.0.class.as_ref();
        while let Some(candidate) = current {
            if Arc::ptr_eq(candidate, class) {
                return true;
            }
            current = candidate.parent();
        }
        false
    }

    /// Reads a raw field, bypassing property accessors.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        self.0.fields.read().get(name).cloned().unwrap_or_default()
    }

    /// Writes a raw field, bypassing property accessors.
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.fields.write().insert(name.into(), value.into());
    }

    /// Whether a raw field is present.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.read().contains_key(name)
    }

    /// Snapshot of all raw fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.0
            .fields
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Copies every field of `other` onto `self`.
    pub fn absorb(&self, other: &ObjectRef) {
        if self == other {
            return;
        }
        let incoming = other.fields();
        let mut fields = self.0.fields.write();
        for (name, value) in incoming {
            fields.insert(name, value);
        }
    }

    /// Invokes an instance method, resolved through the class chain.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::UnknownMember`] if no such method exists, and
    /// otherwise whatever the method's installed definition returns.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let method = self
            .class()
            .and_then(|class| class.find_method(name))
            .ok_or_else(|| self.unknown(name))?;
        method.call(self, args)
    }

    /// Reads a property, or the raw field when no property is declared.
    ///
    /// # Errors
    ///
    /// Propagates the getter's error.
    pub fn get(&self, name: &str) -> Result<Value, Fault> {
        match self.class().and_then(|class| class.find_property(name)) {
            Some(property) => property.get(self),
            None => Ok(self.field(name)),
        }
    }

    /// Writes a property, or the raw field when no property is declared.
    ///
    /// # Errors
    ///
    /// Propagates the setter's error.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), Fault> {
        let value = value.into();
        match self.class().and_then(|class| class.find_property(name)) {
            Some(property) => property.set(self, value),
            None => {
                self.set_field(name, value);
                Ok(())
            }
        }
    }

    fn unknown(&self, member: &str) -> Fault {
        WeavingError::UnknownMember {
            class: self.label().to_owned(),
            member: member.to_owned(),
        }
        .into()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.label, self.0.id)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("label", &self.0.label)
            .field("id", &self.0.id)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality() {
        let a = ObjectRef::detached("Point");
        let b = ObjectRef::detached("Point");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("Point#"));
    }

    #[test]
    fn fields_keep_insertion_order_and_absorb_overwrites() {
        let target = ObjectRef::detached("Point");
        target.set_field("x", 1_i64);
        target.set_field("y", 2_i64);

        let source = ObjectRef::detached("Point");
        source.set_field("y", 20_i64);
        source.set_field("z", 30_i64);
        target.absorb(&source);

        let names: Vec<_> = target.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["x", "y", "z"]);
        assert_eq!(target.field("y"), Value::Int(20));
        assert!(target.field("missing").is_undefined());
    }

    #[test]
    fn detached_objects_have_no_members() {
        let obj = ObjectRef::detached("Bag");
        obj.set("color", "red").unwrap();
        assert_eq!(obj.get("color").unwrap(), Value::from("red"));

        let err = obj.invoke("paint", &[]).unwrap_err();
        assert!(matches!(
            err.as_weaving(),
            Some(WeavingError::UnknownMember { .. })
        ));
    }
}
