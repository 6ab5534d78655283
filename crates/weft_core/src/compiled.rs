//! Output of the compile phase.

use std::sync::Arc;

use crate::annotation::Annotation;
use crate::error::ReplacementError;
use crate::object::{ClassDef, MethodDef, PropertyDef};
use crate::symbol::SymbolKind;

/// A compiled definition of one symbol.
///
/// Compile advice receives the current definition and may answer with a full
/// replacement of the same kind. Parameter symbols compile as part of their
/// owning method and therefore have no variant of their own.
#[derive(Debug, Clone)]
pub enum CompiledSymbol {
    /// Class definition.
    Class(ClassDef),
    /// Method definition.
    Method(MethodDef),
    /// Property definition.
    Property(PropertyDef),
}

impl CompiledSymbol {
    /// Symbol kind of the definition.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        match self {
            CompiledSymbol::Class(_) => SymbolKind::Class,
            CompiledSymbol::Method(_) => SymbolKind::Method,
            CompiledSymbol::Property(_) => SymbolKind::Property,
        }
    }

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CompiledSymbol::Class(def) => def.name(),
            CompiledSymbol::Method(def) => def.name(),
            CompiledSymbol::Property(def) => def.name(),
        }
    }

    /// Own annotations of the definition.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            CompiledSymbol::Class(def) => def.annotations(),
            CompiledSymbol::Method(def) => def.annotations(),
            CompiledSymbol::Property(def) => def.annotations(),
        }
    }

    /// Class definition, if this is one.
    #[must_use]
    pub fn as_class(&self) -> Option<&ClassDef> {
        match self {
            CompiledSymbol::Class(def) => Some(def),
            _ => None,
        }
    }

    /// Method definition, if this is one.
    #[must_use]
    pub fn as_method(&self) -> Option<&MethodDef> {
        match self {
            CompiledSymbol::Method(def) => Some(def),
            _ => None,
        }
    }

    /// Property definition, if this is one.
    #[must_use]
    pub fn as_property(&self) -> Option<&PropertyDef> {
        match self {
            CompiledSymbol::Property(def) => Some(def),
            _ => None,
        }
    }

    /// Checks that `replacement` can stand in for `self`.
    ///
    /// A replacement must keep the kind, the name and the shape callers rely
    /// on (parent class, static flag, parameter count).
    ///
    /// # Errors
    ///
    /// Returns the first [`ReplacementError`] the replacement violates.
    pub fn check_replacement(&self, replacement: &CompiledSymbol) -> Result<(), ReplacementError> {
        if self.kind() != replacement.kind() {
            return Err(ReplacementError::KindChanged {
                expected: self.kind(),
                found: replacement.kind(),
            });
        }
        if self.name() != replacement.name() {
            return Err(ReplacementError::Renamed {
                from: self.name().to_owned(),
                to: replacement.name().to_owned(),
            });
        }
        match (self, replacement) {
            (CompiledSymbol::Class(current), CompiledSymbol::Class(next)) => {
                let same_parent = match (current.parent(), next.parent()) {
                    (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                    (None, None) => true,
                    _ => false,
                };
                if !same_parent {
                    return Err(ReplacementError::ParentChanged);
                }
            }
            (CompiledSymbol::Method(current), CompiledSymbol::Method(next)) => {
                if current.is_static() != next.is_static() {
                    return Err(ReplacementError::StaticChanged);
                }
                if current.params().len() != next.params().len() {
                    return Err(ReplacementError::ArityChanged {
                        expected: current.params().len(),
                        found: next.params().len(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}
