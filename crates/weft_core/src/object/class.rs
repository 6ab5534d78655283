//! Installed classes and their member tables.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{
    ConstructFn, ConstructorBody, GetterFn, MethodDef, MethodFn, ObjectRef, PropertyDef, SetterFn,
    Slot,
};
use crate::annotation::Annotation;
use crate::error::{Fault, WeavingError};
use crate::symbol::{ClassId, SymbolId};
use crate::value::Value;

/// Shared handle to an installed class.
pub type ClassRef = Arc<Class>;

// ─────────────────────────────────────────────────────────────────────────────
// Method
// ─────────────────────────────────────────────────────────────────────────────

/// An installed method.
///
/// `definition` is the compiled definition; `body` holds the linked
/// definition callers actually run.
pub struct Method {
    symbol: SymbolId,
    definition: MethodDef,
    body: Slot<MethodFn>,
}

impl Method {
    /// Creates an unlinked method.
    #[must_use]
    pub fn new(symbol: SymbolId, definition: MethodDef) -> Self {
        Self {
            symbol,
            definition,
            body: Slot::empty(),
        }
    }

    /// Identity key.
    #[must_use]
    pub fn symbol(&self) -> &SymbolId {
        &self.symbol
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Compiled definition.
    #[must_use]
    pub fn definition(&self) -> &MethodDef {
        &self.definition
    }

    /// Slot holding the linked body.
    #[must_use]
    pub fn slot(&self) -> &Slot<MethodFn> {
        &self.body
    }

    /// Runs the linked body against `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::Unlinked`] if nothing was installed, otherwise
    /// whatever the body returns.
    pub fn call(&self, receiver: &ObjectRef, args: &[Value]) -> Result<Value, Fault> {
        let body = self.body.get().ok_or_else(|| unlinked(&self.symbol))?;
        body(receiver, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("symbol", &self.symbol)
            .field("linked", &self.body.is_installed())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Property
// ─────────────────────────────────────────────────────────────────────────────

/// An installed property with independent getter and setter slots.
pub struct Property {
    symbol: SymbolId,
    definition: PropertyDef,
    getter: Slot<GetterFn>,
    setter: Slot<SetterFn>,
}

impl Property {
    /// Creates an unlinked property.
    #[must_use]
    pub fn new(symbol: SymbolId, definition: PropertyDef) -> Self {
        Self {
            symbol,
            definition,
            getter: Slot::empty(),
            setter: Slot::empty(),
        }
    }

    /// Identity key.
    #[must_use]
    pub fn symbol(&self) -> &SymbolId {
        &self.symbol
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Compiled definition.
    #[must_use]
    pub fn definition(&self) -> &PropertyDef {
        &self.definition
    }

    /// Slot holding the linked getter.
    #[must_use]
    pub fn getter_slot(&self) -> &Slot<GetterFn> {
        &self.getter
    }

    /// Slot holding the linked setter.
    #[must_use]
    pub fn setter_slot(&self) -> &Slot<SetterFn> {
        &self.setter
    }

    /// Runs the linked getter.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::Unlinked`] if nothing was installed.
    pub fn get(&self, receiver: &ObjectRef) -> Result<Value, Fault> {
        let getter = self.getter.get().ok_or_else(|| unlinked(&self.symbol))?;
        getter(receiver)
    }

    /// Runs the linked setter.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::Unlinked`] if nothing was installed.
    pub fn set(&self, receiver: &ObjectRef, value: Value) -> Result<(), Fault> {
        let setter = self.setter.get().ok_or_else(|| unlinked(&self.symbol))?;
        setter(receiver, value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("symbol", &self.symbol)
            .field("linked", &(self.getter.is_installed() && self.setter.is_installed()))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Class
// ─────────────────────────────────────────────────────────────────────────────

/// An installed class.
///
/// Member lookups walk the parent chain. Static methods run with the class's
/// detached statics object as receiver.
pub struct Class {
    id: ClassId,
    parent: Option<ClassRef>,
    annotations: Vec<Annotation>,
    initializer: Option<Arc<ConstructorBody>>,
    constructor: Slot<ConstructFn>,
    methods: IndexMap<Arc<str>, Method>,
    static_methods: IndexMap<Arc<str>, Method>,
    properties: IndexMap<Arc<str>, Property>,
    statics: ObjectRef,
}

impl Class {
    /// Assembles an unlinked class from compiled parts.
    ///
    /// `annotations` are the effective annotations (own then inherited);
    /// `initializer` is the compiled constructor body.
    #[must_use]
    pub fn assemble(
        id: ClassId,
        parent: Option<ClassRef>,
        annotations: Vec<Annotation>,
        initializer: Option<Arc<ConstructorBody>>,
        methods: Vec<Method>,
        properties: Vec<Property>,
    ) -> ClassRef {
        let statics = ObjectRef::detached(format!("{}.statics", id.name()));
        let (static_methods, methods): (Vec<_>, Vec<_>) =
            methods.into_iter().partition(|m| m.definition.is_static());
        Arc::new(Self {
            parent,
            annotations,
            initializer,
            constructor: Slot::empty(),
            methods: keyed(methods, |m| m.definition.name()),
            static_methods: keyed(static_methods, |m| m.definition.name()),
            properties: keyed(properties, |p| p.definition.name()),
            statics,
            id,
        })
    }

    /// Stable identity.
    #[must_use]
    pub fn id(&self) -> &ClassId {
        &self.id
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Identity key of the class symbol.
    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        SymbolId::class(self.id.clone())
    }

    /// Parent class.
    #[must_use]
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// Effective annotations, own first then inherited.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Detached receiver of static methods.
    #[must_use]
    pub fn statics(&self) -> &ObjectRef {
        &self.statics
    }

    /// Slot holding the linked constructor.
    #[must_use]
    pub fn constructor_slot(&self) -> &Slot<ConstructFn> {
        &self.constructor
    }

    /// Runs the compiled constructor chain on `this`: parent first, then own.
    ///
    /// Advice is not involved; this is what the innermost constructor join
    /// point executes.
    ///
    /// # Errors
    ///
    /// Propagates the first constructor body error.
    pub fn initialize(&self, this: &ObjectRef, args: &[Value]) -> Result<(), Fault> {
        if let Some(parent) = &self.parent {
            parent.initialize(this, args)?;
        }
        match &self.initializer {
            Some(body) => body(this, args),
            None => Ok(()),
        }
    }

    /// Creates an instance through the linked constructor.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::Unlinked`] if the class was never linked,
    /// otherwise whatever the constructor pipeline returns.
    pub fn construct(&self, args: &[Value]) -> Result<ObjectRef, Fault> {
        let construct = self
            .constructor
            .get()
            .ok_or_else(|| unlinked(&self.symbol()))?;
        construct(args)
    }

    /// Invokes a static method, resolved through the class chain.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::UnknownMember`] if no such static method
    /// exists, otherwise whatever the method returns.
    pub fn invoke_static(&self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let method = self.find_static(name).ok_or_else(|| {
            Fault::from(WeavingError::UnknownMember {
                class: self.name().to_owned(),
                member: name.to_owned(),
            })
        })?;
        method.call(&self.statics, args)
    }

    /// Finds an instance method here or in an ancestor.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods
            .get(name)
            .or_else(|| self.parent.as_ref()?.find_method(name))
    }

    /// Finds a static method here or in an ancestor.
    #[must_use]
    pub fn find_static(&self, name: &str) -> Option<&Method> {
        self.static_methods
            .get(name)
            .or_else(|| self.parent.as_ref()?.find_static(name))
    }

    /// Finds a property here or in an ancestor.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .get(name)
            .or_else(|| self.parent.as_ref()?.find_property(name))
    }

    /// Instance methods declared on this class, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    /// Static methods declared on this class, in declaration order.
    pub fn static_methods(&self) -> impl Iterator<Item = &Method> {
        self.static_methods.values()
    }

    /// Properties declared on this class, in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_owned()))
            .field("annotations", &self.annotations)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("static_methods", &self.static_methods.keys().collect::<Vec<_>>())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn keyed<T>(items: Vec<T>, name: impl Fn(&T) -> &str) -> IndexMap<Arc<str>, T> {
    items
        .into_iter()
        .map(|item| (Arc::from(name(&item)), item))
        .collect()
}

fn unlinked(symbol: &SymbolId) -> Fault {
    WeavingError::Unlinked {
        symbol: symbol.to_string(),
    }
    .into()
}
