//! Registration tables describing a class before it is woven.

use core::fmt;
use std::sync::Arc;

use super::{ClassRef, ConstructorBody, GetterFn, MethodFn, ObjectRef, SetterFn};
use crate::annotation::Annotation;
use crate::error::{Fault, Thrown};
use crate::value::Value;

// ─────────────────────────────────────────────────────────────────────────────
// ParamDef
// ─────────────────────────────────────────────────────────────────────────────

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    name: Arc<str>,
    annotations: Vec<Annotation>,
}

impl ParamDef {
    /// Declares a parameter named `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations on this parameter.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodDef
// ─────────────────────────────────────────────────────────────────────────────

/// A declared method: body, annotations and parameters.
#[derive(Clone)]
pub struct MethodDef {
    name: Arc<str>,
    body: Arc<MethodFn>,
    annotations: Vec<Annotation>,
    params: Vec<ParamDef>,
    is_static: bool,
}

impl MethodDef {
    /// Declares an instance method.
    #[must_use]
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
            annotations: Vec::new(),
            params: Vec::new(),
            is_static: false,
        }
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Appends a parameter declaration.
    #[must_use]
    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Turns the method into a static method.
    #[must_use]
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Replaces the body, keeping every other attribute.
    #[must_use]
    pub fn with_body<F>(self, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.with_body_arc(Arc::new(body))
    }

    /// Replaces the body with an already shared one.
    #[must_use]
    pub fn with_body_arc(mut self, body: Arc<MethodFn>) -> Self {
        self.body = body;
        self
    }

    /// Replaces the annotation list.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared body.
    #[must_use]
    pub fn body(&self) -> &Arc<MethodFn> {
        &self.body
    }

    /// Own annotations.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Parameter declarations.
    #[must_use]
    pub fn params(&self) -> &[ParamDef] {
        &self.params
    }

    /// Whether the method is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PropertyDef
// ─────────────────────────────────────────────────────────────────────────────

/// A declared property: an accessor pair plus annotations.
#[derive(Clone)]
pub struct PropertyDef {
    name: Arc<str>,
    annotations: Vec<Annotation>,
    getter: Arc<GetterFn>,
    setter: Arc<SetterFn>,
}

impl PropertyDef {
    /// Declares a property backed by the raw field of the same name.
    #[must_use]
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        let name: Arc<str> = name.into();
        let read = Arc::clone(&name);
        let write = Arc::clone(&name);
        Self {
            name,
            annotations: Vec::new(),
            getter: Arc::new(move |obj: &ObjectRef| -> Result<Value, Fault> {
                Ok(obj.field(&read))
            }),
            setter: Arc::new(move |obj: &ObjectRef, value: Value| -> Result<(), Fault> {
                obj.set_field(&*write, value);
                Ok(())
            }),
        }
    }

    /// Declares a property with explicit accessors.
    #[must_use]
    pub fn accessor<G, S>(name: impl Into<Arc<str>>, getter: G, setter: S) -> Self
    where
        G: Fn(&ObjectRef) -> Result<Value, Fault> + Send + Sync + 'static,
        S: Fn(&ObjectRef, Value) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// Declares a property without a setter. Assigning to it throws.
    #[must_use]
    pub fn readonly<G>(name: impl Into<Arc<str>>, getter: G) -> Self
    where
        G: Fn(&ObjectRef) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into();
        let label = Arc::clone(&name);
        Self {
            name,
            annotations: Vec::new(),
            getter: Arc::new(getter),
            setter: Arc::new(move |obj: &ObjectRef, _: Value| -> Result<(), Fault> {
                let message = format!("property '{label}' of {} is read-only", obj.label());
                Err(Thrown::msg(message).into())
            }),
        }
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Replaces the annotation list.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Replaces the getter.
    #[must_use]
    pub fn with_getter(mut self, getter: Arc<GetterFn>) -> Self {
        self.getter = getter;
        self
    }

    /// Replaces the setter.
    #[must_use]
    pub fn with_setter(mut self, setter: Arc<SetterFn>) -> Self {
        self.setter = setter;
        self
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own annotations.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Shared getter.
    #[must_use]
    pub fn getter(&self) -> &Arc<GetterFn> {
        &self.getter
    }

    /// Shared setter.
    #[must_use]
    pub fn setter(&self) -> &Arc<SetterFn> {
        &self.setter
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassDef
// ─────────────────────────────────────────────────────────────────────────────

/// Registration table for one class.
///
/// # Example
///
/// ```
/// use weft_core::object::{ClassDef, MethodDef, PropertyDef};
/// use weft_core::value::Value;
///
/// let def = ClassDef::new("Person")
///     .constructor(|this, args| {
///         this.set_field("name", args.first().cloned().unwrap_or_default());
///         Ok(())
///     })
///     .property(PropertyDef::field("name"))
///     .method(MethodDef::new("greet", |this, _| {
///         Ok(Value::from(format!("hello {}", this.field("name"))))
///     }));
/// assert_eq!(def.methods().len(), 1);
/// ```
#[derive(Clone)]
pub struct ClassDef {
    name: Arc<str>,
    parent: Option<ClassRef>,
    annotations: Vec<Annotation>,
    constructor: Option<Arc<ConstructorBody>>,
    methods: Vec<MethodDef>,
    properties: Vec<PropertyDef>,
}

impl ClassDef {
    /// Starts the table for a class named `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            annotations: Vec::new(),
            constructor: None,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Makes the class a subclass of `parent`.
    #[must_use]
    pub fn extends(mut self, parent: &ClassRef) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Sets the constructor body.
    #[must_use]
    pub fn constructor<F>(self, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.with_constructor(Arc::new(body))
    }

    /// Sets the constructor body from an already shared one.
    #[must_use]
    pub fn with_constructor(mut self, body: Arc<ConstructorBody>) -> Self {
        self.constructor = Some(body);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Replaces the annotation list.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// Own annotations.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Constructor body, if one was declared.
    #[must_use]
    pub fn constructor_body(&self) -> Option<&Arc<ConstructorBody>> {
        self.constructor.as_ref()
    }

    /// Declared methods.
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Declared properties.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_owned()))
            .field("annotations", &self.annotations)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
