//! Symbol identity and the read-only description of a weaving target.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationRef};

// ─────────────────────────────────────────────────────────────────────────────
// SymbolKind
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of symbol a pointcut can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// A class (its constructor).
    Class,
    /// An instance or static method.
    Method,
    /// A property accessor pair.
    Property,
    /// A method parameter.
    Parameter,
}

impl SymbolKind {
    /// Every concrete symbol kind, in declaration order.
    pub const ALL: [SymbolKind; 4] = [
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Parameter,
    ];

    /// Lower-case name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Parameter => "parameter",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassId
// ─────────────────────────────────────────────────────────────────────────────

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a defined class.
///
/// Two classes with the same name defined separately get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassId {
    id: u64,
    name: Arc<str>,
}

impl ClassId {
    /// Allocates a fresh id for a class named `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    /// Returns the numeric part of the id.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.id
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SymbolId
// ─────────────────────────────────────────────────────────────────────────────

/// Location of a symbol inside its class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolPath {
    /// The class itself.
    Class,
    /// A method.
    Method {
        /// Method name.
        name: Arc<str>,
        /// Whether the method is static.
        is_static: bool,
    },
    /// A property.
    Property {
        /// Property name.
        name: Arc<str>,
    },
    /// A parameter of a method.
    Parameter {
        /// Owning method name.
        method: Arc<str>,
        /// Whether the owning method is static.
        is_static: bool,
        /// Zero-based position of the parameter.
        index: usize,
    },
}

/// Stable identity key of a symbol.
///
/// Used to key the compile cache and the "advice already applied" flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolId {
    class: ClassId,
    path: SymbolPath,
}

impl SymbolId {
    /// Identity of a class symbol.
    #[must_use]
    pub fn class(class: ClassId) -> Self {
        Self {
            class,
            path: SymbolPath::Class,
        }
    }

    /// Identity of a method symbol.
    #[must_use]
    pub fn method(class: ClassId, name: impl Into<Arc<str>>, is_static: bool) -> Self {
        Self {
            class,
            path: SymbolPath::Method {
                name: name.into(),
                is_static,
            },
        }
    }

    /// Identity of a property symbol.
    #[must_use]
    pub fn property(class: ClassId, name: impl Into<Arc<str>>) -> Self {
        Self {
            class,
            path: SymbolPath::Property { name: name.into() },
        }
    }

    /// Identity of a parameter symbol.
    #[must_use]
    pub fn parameter(
        class: ClassId,
        method: impl Into<Arc<str>>,
        is_static: bool,
        index: usize,
    ) -> Self {
        Self {
            class,
            path: SymbolPath::Parameter {
                method: method.into(),
                is_static,
                index,
            },
        }
    }

    /// Returns the owning class id.
    #[must_use]
    pub fn class_id(&self) -> &ClassId {
        &self.class
    }

    /// Returns the location of the symbol inside its class.
    #[must_use]
    pub fn path(&self) -> &SymbolPath {
        &self.path
    }

    /// Returns the kind of symbol this id designates.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        match self.path {
            SymbolPath::Class => SymbolKind::Class,
            SymbolPath::Method { .. } => SymbolKind::Method,
            SymbolPath::Property { .. } => SymbolKind::Property,
            SymbolPath::Parameter { .. } => SymbolKind::Parameter,
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = &self.class;
        match &self.path {
            SymbolPath::Class => write!(f, "{class}"),
            SymbolPath::Method {
                name,
                is_static: true,
            } => write!(f, "{class}::{name}"),
            SymbolPath::Method { name, .. } | SymbolPath::Property { name } => {
                write!(f, "{class}.{name}")
            }
            SymbolPath::Parameter {
                method,
                is_static,
                index,
            } => {
                let sep = if *is_static { "::" } else { "." };
                write!(f, "{class}{sep}{method}#{index}")
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target
// ─────────────────────────────────────────────────────────────────────────────

/// Which half of a property pipeline is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Property read.
    Get,
    /// Property write.
    Set,
}

/// Description of one parameter of a method target.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTarget {
    index: usize,
    name: Arc<str>,
    annotations: Vec<Annotation>,
}

impl ParamTarget {
    /// Creates a parameter description.
    #[must_use]
    pub fn new(index: usize, name: impl Into<Arc<str>>, annotations: Vec<Annotation>) -> Self {
        Self {
            index,
            name: name.into(),
            annotations,
        }
    }

    /// Zero-based position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations applied to this parameter.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the first annotation that is an instance of `reference`.
    #[must_use]
    pub fn annotation(&self, reference: &AnnotationRef) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(reference))
    }
}

/// Read-only description of the symbol being woven or invoked.
///
/// Advice reaches it through every context view. Annotations include the ones
/// inherited from a parent class, listed after the symbol's own.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    id: SymbolId,
    name: Arc<str>,
    annotations: Vec<Annotation>,
    is_static: bool,
    parameters: Vec<ParamTarget>,
    accessor: Option<Accessor>,
}

impl Target {
    /// Creates a target for `id`.
    #[must_use]
    pub fn new(id: SymbolId, name: impl Into<Arc<str>>, annotations: Vec<Annotation>) -> Self {
        Self {
            id,
            name: name.into(),
            annotations,
            is_static: false,
            parameters: Vec::new(),
            accessor: None,
        }
    }

    /// Marks the target as static.
    #[must_use]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Sets the parameter descriptions of a method target.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<ParamTarget>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Narrows a property target to one accessor.
    #[must_use]
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Identity key.
    #[must_use]
    pub fn id(&self) -> &SymbolId {
        &self.id
    }

    /// Symbol kind.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.id.kind()
    }

    /// Name of the owning class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.id.class_id().name()
    }

    /// Name of the symbol itself (the class name for class targets).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations, own first then inherited.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the first annotation that is an instance of `reference`.
    #[must_use]
    pub fn annotation(&self, reference: &AnnotationRef) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(reference))
    }

    /// Whether the target carries `reference`.
    #[must_use]
    pub fn has_annotation(&self, reference: &AnnotationRef) -> bool {
        self.annotation(reference).is_some()
    }

    /// Whether the target is a static member.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Parameter descriptions (method targets only).
    #[must_use]
    pub fn parameters(&self) -> &[ParamTarget] {
        &self.parameters
    }

    /// Accessor being dispatched (property targets only).
    #[must_use]
    pub fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accessor {
            Some(Accessor::Get) => write!(f, "get {}", self.id),
            Some(Accessor::Set) => write!(f, "set {}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ids_are_unique_per_definition() {
        let a = ClassId::new("Person");
        let b = ClassId::new("Person");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn symbol_ids_render_their_location() {
        let class = ClassId::new("Person");
        assert_eq!(SymbolId::class(class.clone()).to_string(), "Person");
        assert_eq!(
            SymbolId::method(class.clone(), "greet", false).to_string(),
            "Person.greet"
        );
        assert_eq!(
            SymbolId::method(class.clone(), "create", true).to_string(),
            "Person::create"
        );
        assert_eq!(
            SymbolId::parameter(class.clone(), "greet", false, 0).to_string(),
            "Person.greet#0"
        );
        assert_eq!(
            SymbolId::property(class, "name").kind(),
            SymbolKind::Property
        );
    }

    #[test]
    fn target_lookups() {
        let log = AnnotationRef::new("demo", "Log");
        let target = Target::new(
            SymbolId::method(ClassId::new("Person"), "greet", false),
            "greet",
            vec![log.clone().into()],
        )
        .with_parameters(vec![ParamTarget::new(0, "name", Vec::new())]);

        assert!(target.has_annotation(&log));
        assert!(!target.has_annotation(&AnnotationRef::new("demo", "Other")));
        assert_eq!(target.kind(), SymbolKind::Method);
        assert_eq!(target.class_name(), "Person");
        assert_eq!(target.parameters().len(), 1);
    }

    #[test]
    fn accessor_targets_display_direction() {
        let target = Target::new(
            SymbolId::property(ClassId::new("Person"), "age"),
            "age",
            Vec::new(),
        );
        assert_eq!(target.clone().with_accessor(Accessor::Get).to_string(), "get Person.age");
        assert_eq!(target.with_accessor(Accessor::Set).to_string(), "set Person.age");
    }
}
