//! Dynamic values exchanged between woven symbols and advice.
//!
//! Arguments, return values and annotation parameters are all carried as
//! [`Value`]. The variants cover what a host object model needs to pass
//! around (scalars, lists, object references), plus [`Value::Native`] for
//! arbitrary Rust data that only the code producing and consuming it knows
//! how to interpret.
//!
//! # Undefined vs Null
//!
//! [`Value::Undefined`] means "no value was produced". Non-returning advice
//! phases (before, after) must answer with `Undefined`; anything else is a
//! structural error raised by the weaver. [`Value::Null`] is an ordinary value.

use core::fmt;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};

use crate::object::ObjectRef;

/// Opaque host data that can travel inside a [`Value`].
///
/// Any `Debug + Send + Sync + 'static` type can implement this marker trait and
/// be recovered later through [`Value::as_native`] or [`Value::native_arc`].
///
/// # Example
///
/// ```
/// use weft_core::value::{NativeValue, Value};
///
/// #[derive(Debug)]
/// struct Money { cents: i64 }
/// impl NativeValue for Money {}
///
/// let value = Value::native(Money { cents: 250 });
/// assert_eq!(value.as_native::<Money>().map(|m| m.cents), Some(250));
/// ```
pub trait NativeValue: DowncastSync + fmt::Debug {}
impl_downcast!(sync NativeValue);

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(Arc<str>),
    /// Ordered list of values.
    List(Arc<[Value]>),
    /// Reference to a host object.
    Object(ObjectRef),
    /// Opaque host data.
    Native(Arc<dyn NativeValue>),
}

impl Value {
    /// Wraps arbitrary host data.
    #[must_use]
    pub fn native<T: NativeValue>(value: T) -> Self {
        Value::Native(Arc::new(value))
    }

    /// Builds a list value.
    #[must_use]
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(values.into_iter().collect())
    }

    /// Returns `true` for [`Value::Undefined`].
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `Undefined` and `Null`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric payload as `f64`, converting integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list payload, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the object reference, if any.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrows native data of type `T`, if this value holds one.
    #[must_use]
    pub fn as_native<T: NativeValue>(&self) -> Option<&T> {
        match self {
            Value::Native(native) => (**native).downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns a shared handle to native data of type `T`.
    #[must_use]
    pub fn native_arc<T: NativeValue>(&self) -> Option<Arc<T>> {
        match self {
            Value::Native(native) => Arc::clone(native).downcast_arc::<T>().ok(),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Native(_) => "native",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(obj) => write!(f, "Object({obj})"),
            Value::Native(native) => write!(f, "Native({native:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => write!(f, "{obj}"),
            Value::Native(native) => write!(f, "{native:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
