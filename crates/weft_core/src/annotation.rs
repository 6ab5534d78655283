//! Annotation tokens and annotation instances.
//!
//! An [`AnnotationRef`] is the identity of an annotation token (`@group:Name`).
//! How tokens are authored is up to the host; the weaver only compares them.
//! An [`Annotation`] is one application of a token to a symbol, together with
//! the arguments it was applied with.

use core::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Identity of an annotation token.
///
/// Two references are equal when both their group and name are equal.
/// Cloning is cheap (reference count bump only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationRef {
    group: Arc<str>,
    name: Arc<str>,
}

impl AnnotationRef {
    /// Creates a reference for `@group:name`.
    #[must_use]
    pub fn new(group: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Returns the group the token belongs to.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the token name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies this token with arguments.
    #[must_use]
    pub fn with_args(&self, args: impl IntoIterator<Item = Value>) -> Annotation {
        Annotation {
            reference: self.clone(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.group, self.name)
    }
}

/// An annotation applied to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    reference: AnnotationRef,
    args: Vec<Value>,
}

impl Annotation {
    /// Returns the token this annotation is an instance of.
    #[must_use]
    pub fn reference(&self) -> &AnnotationRef {
        &self.reference
    }

    /// Returns the arguments the annotation was applied with.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns the argument at `index`, or `Undefined`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// Returns `true` if this is an instance of `reference`.
    #[must_use]
    pub fn is(&self, reference: &AnnotationRef) -> bool {
        &self.reference == reference
    }
}

impl From<AnnotationRef> for Annotation {
    fn from(reference: AnnotationRef) -> Self {
        Self {
            reference,
            args: Vec::new(),
        }
    }
}

impl From<&AnnotationRef> for Annotation {
    fn from(reference: &AnnotationRef) -> Self {
        reference.clone().into()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Appends `inherited` to `own`, skipping tokens `own` already carries.
///
/// Used to compute the annotations visible on a symbol that inherits from a
/// parent: the symbol's own annotations come first and shadow inherited ones.
#[must_use]
pub fn merge_inherited(own: &[Annotation], inherited: &[Annotation]) -> Vec<Annotation> {
    let mut merged = own.to_vec();
    for annotation in inherited {
        if !own.iter().any(|a| a.reference == annotation.reference) {
            merged.push(annotation.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_identity_and_display() {
        let a = AnnotationRef::new("demo", "Log");
        let b = AnnotationRef::new("demo", "Log");
        let c = AnnotationRef::new("other", "Log");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "@demo:Log");
    }

    #[test]
    fn annotation_args_and_display() {
        let token = AnnotationRef::new("demo", "Range");
        let annotation = token.with_args([Value::from(1_i64), Value::from(10_i64)]);
        assert!(annotation.is(&token));
        assert_eq!(annotation.arg(1), Value::Int(10));
        assert!(annotation.arg(5).is_undefined());
        assert_eq!(annotation.to_string(), "@demo:Range(1, 10)");
    }

    #[test]
    fn merge_inherited_prefers_own_annotations() {
        let log = AnnotationRef::new("demo", "Log");
        let audit = AnnotationRef::new("demo", "Audit");
        let own = vec![log.with_args([Value::from("child")])];
        let inherited = vec![log.with_args([Value::from("parent")]), audit.clone().into()];

        let merged = merge_inherited(&own, &inherited);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].arg(0), Value::from("child"));
        assert!(merged[1].is(&audit));
    }
}
