//! Per-invocation execution context and its phase views.
//!
//! A fresh [`ExecutionContext`] is created for every call of a woven symbol
//! and dropped when the call returns. Advice never sees it directly: each
//! phase gets a read-only view exposing only what is legal at that point.
//!
//! | View | Instance | Args | Value | Error |
//! |------|----------|------|-------|-------|
//! | [`CompileContext`] | - | - | - | - |
//! | [`BeforeContext`] | yes* | yes | - | - |
//! | [`AroundContext`] | yes* | yes | - | - |
//! | [`AfterReturnContext`] | yes | yes | as argument | - |
//! | [`AfterThrowContext`] | yes | yes | - | as argument |
//! | [`AfterContext`] | yes | yes | yes | yes |
//!
//! \* For class symbols the instance is a placeholder that cannot be read
//! until the constructor ran.
//!
//! The views also share a small key/value map, so that advice of one call
//! can hand data to advice running later in the same call.

use core::fmt;
use core::ops::Deref;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use weft_core::annotation::{Annotation, AnnotationRef};
use weft_core::compiled::CompiledSymbol;
use weft_core::error::{Thrown, WeavingError};
use weft_core::object::ObjectRef;
use weft_core::symbol::{ParamTarget, SymbolKind, Target};
use weft_core::value::Value;

use crate::aspect::Aspect;
use crate::entry::AdviceEntry;

// ─────────────────────────────────────────────────────────────────────────────
// ExecutionContext
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable record of one invocation, owned by the dispatch call stack.
pub struct ExecutionContext {
    target: Arc<Target>,
    instance: Option<ObjectRef>,
    args: Vec<Value>,
    value: Option<Value>,
    error: Option<Thrown>,
    data: Mutex<HashMap<String, Value>>,
}

impl ExecutionContext {
    /// Starts the record of a call to `target`.
    #[must_use]
    pub fn new(target: Arc<Target>, instance: Option<ObjectRef>, args: Vec<Value>) -> Self {
        Self {
            target,
            instance,
            args,
            value: None,
            error: None,
            data: Mutex::new(HashMap::new()),
        }
    }

    /// The symbol being invoked.
    #[must_use]
    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    /// Receiver of the call, ready or not.
    #[must_use]
    pub fn raw_instance(&self) -> Option<&ObjectRef> {
        self.instance.as_ref()
    }

    /// Arguments the call was made with.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Result recorded so far.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Application error recorded so far.
    #[must_use]
    pub fn error(&self) -> Option<&Thrown> {
        self.error.as_ref()
    }

    /// Records the result and clears any error.
    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.error = None;
    }

    /// Records an application error and clears any result.
    pub fn set_error(&mut self, error: Thrown) {
        self.error = Some(error);
        self.value = None;
    }

    /// Replaces the receiver.
    pub fn set_instance(&mut self, instance: ObjectRef) {
        self.instance = Some(instance);
    }

    /// View for `entry` at the before phase.
    #[must_use]
    pub fn before<'a>(&'a self, entry: &'a AdviceEntry) -> BeforeContext<'a> {
        BeforeContext(self.invocation(entry))
    }

    /// View for `entry` at the around phase.
    #[must_use]
    pub fn around<'a>(&'a self, entry: &'a AdviceEntry) -> AroundContext<'a> {
        AroundContext(self.invocation(entry))
    }

    /// View for `entry` at the after-return phase.
    #[must_use]
    pub fn after_return<'a>(&'a self, entry: &'a AdviceEntry) -> AfterReturnContext<'a> {
        AfterReturnContext(self.invocation(entry))
    }

    /// View for `entry` at the after-throw phase.
    #[must_use]
    pub fn after_throw<'a>(&'a self, entry: &'a AdviceEntry) -> AfterThrowContext<'a> {
        AfterThrowContext(self.invocation(entry))
    }

    /// View for `entry` at the after phase.
    #[must_use]
    pub fn after<'a>(&'a self, entry: &'a AdviceEntry) -> AfterContext<'a> {
        AfterContext(self.invocation(entry))
    }

    fn invocation<'a>(&'a self, entry: &'a AdviceEntry) -> Invocation<'a> {
        Invocation { ctx: self, entry }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("target", &self.target.id())
            .field("instance", &self.instance)
            .field("args", &self.args)
            .field("value", &self.value)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// What every runtime view exposes. Reached through `Deref`.
pub struct Invocation<'a> {
    ctx: &'a ExecutionContext,
    entry: &'a AdviceEntry,
}

impl<'a> Invocation<'a> {
    /// The symbol being invoked.
    #[must_use]
    pub fn target(&self) -> &'a Target {
        &self.ctx.target
    }

    /// Annotations of the symbol, own then inherited.
    #[must_use]
    pub fn annotations(&self) -> &'a [Annotation] {
        self.ctx.target.annotations()
    }

    /// First annotation of the symbol that is an instance of `reference`.
    #[must_use]
    pub fn annotation(&self, reference: &AnnotationRef) -> Option<&'a Annotation> {
        self.ctx.target.annotation(reference)
    }

    /// The running advice.
    #[must_use]
    pub fn entry(&self) -> &'a AdviceEntry {
        self.entry
    }

    /// Aspect that owns the running advice.
    #[must_use]
    pub fn aspect(&self) -> &'a Aspect {
        self.entry.aspect()
    }

    /// Receiver of the call.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::UninitializedInstance`] while a class
    /// placeholder has not been constructed yet.
    pub fn instance(&self) -> Result<ObjectRef, WeavingError> {
        match &self.ctx.instance {
            Some(instance) if instance.is_ready() => Ok(instance.clone()),
            _ => Err(WeavingError::UninitializedInstance {
                class: self.ctx.target.class_name().to_owned(),
            }),
        }
    }

    /// Arguments the call was made with.
    #[must_use]
    pub fn args(&self) -> &'a [Value] {
        &self.ctx.args
    }

    /// Argument at `index`, or `Undefined`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        self.ctx.args.get(index).cloned().unwrap_or_default()
    }

    /// Parameters of the method matched by the running advice's parameter
    /// pointcut. Empty for advice that targets other kinds.
    #[must_use]
    pub fn parameters(&self) -> Vec<&'a ParamTarget> {
        let Some(pointcut) = self
            .entry
            .pointcut(SymbolKind::Parameter, self.entry.phase())
        else {
            return Vec::new();
        };
        self.ctx
            .target
            .parameters()
            .iter()
            .filter(|param| pointcut.matches_applied(param.annotations()))
            .collect()
    }

    /// Reads a value shared by the advice of this call.
    #[must_use]
    pub fn data(&self, key: &str) -> Value {
        self.ctx.data.lock().get(key).cloned().unwrap_or_default()
    }

    /// Stores a value shared by the advice of this call.
    pub fn set_data(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.ctx.data.lock().insert(key.into(), value.into());
    }
}

macro_rules! phase_view {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<'a>(Invocation<'a>);

        impl<'a> Deref for $name<'a> {
            type Target = Invocation<'a>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

phase_view!(
    /// View handed to before advice.
    BeforeContext
);
phase_view!(
    /// View handed to around advice.
    AroundContext
);
phase_view!(
    /// View handed to after-return advice. The current result is passed as a
    /// separate argument.
    AfterReturnContext
);
phase_view!(
    /// View handed to after-throw advice. The error is passed as a separate
    /// argument.
    AfterThrowContext
);
phase_view!(
    /// View handed to after advice.
    AfterContext
);

impl AfterThrowContext<'_> {
    /// Error raised by the around chain or the original body, before any
    /// after-throw advice rethrew something else.
    #[must_use]
    pub fn original_error(&self) -> Option<&Thrown> {
        self.0.ctx.error.as_ref()
    }
}

impl AfterContext<'_> {
    /// Final result, if the call succeeded.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.0.ctx.value.as_ref()
    }

    /// Final application error, if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&Thrown> {
        self.0.ctx.error.as_ref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompileContext
// ─────────────────────────────────────────────────────────────────────────────

/// View handed to compile advice: the target and its current definition.
///
/// There is no instance and there are no arguments at compile time.
pub struct CompileContext<'a> {
    target: &'a Target,
    definition: &'a CompiledSymbol,
    entry: &'a AdviceEntry,
}

impl<'a> CompileContext<'a> {
    /// Creates the view for one compile pass.
    #[must_use]
    pub fn new(target: &'a Target, definition: &'a CompiledSymbol, entry: &'a AdviceEntry) -> Self {
        Self {
            target,
            definition,
            entry,
        }
    }

    /// The symbol being compiled.
    #[must_use]
    pub fn target(&self) -> &'a Target {
        self.target
    }

    /// Current definition; the base any replacement builds on.
    #[must_use]
    pub fn definition(&self) -> &'a CompiledSymbol {
        self.definition
    }

    /// First annotation of the symbol that is an instance of `reference`.
    #[must_use]
    pub fn annotation(&self, reference: &AnnotationRef) -> Option<&'a Annotation> {
        self.target.annotation(reference)
    }

    /// The running advice.
    #[must_use]
    pub fn entry(&self) -> &'a AdviceEntry {
        self.entry
    }

    /// Aspect that owns the running advice.
    #[must_use]
    pub fn aspect(&self) -> &'a Aspect {
        self.entry.aspect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use weft_core::object::ObjectRef;
    use weft_core::symbol::{ClassId, SymbolId};

    use super::*;
    use crate::advice::Advice;
    use crate::aspect::AspectDef;
    use crate::pointcut::on;
    use crate::registry::AdviceRegistry;
    use crate::selection::Scope;
    use crate::phase::Phase;

    fn entry_for(advice: Advice, scope: Scope) -> Arc<AdviceEntry> {
        let registry = AdviceRegistry::new();
        registry
            .register(&AspectDef::new("Probe").advice(advice).build())
            .unwrap();
        let phase = registry.aspects()[0].own_advice()[0].phase();
        registry.select(phase, &[scope]).entries()[0].clone()
    }

    fn method_target(params: Vec<ParamTarget>) -> Arc<Target> {
        Arc::new(
            Target::new(SymbolId::method(ClassId::new("Svc"), "run", false), "run", Vec::new())
                .with_parameters(params),
        )
    }

    #[test]
    fn instance_requires_a_ready_receiver() {
        let entry = entry_for(
            Advice::before("b", |_| Ok(Value::Undefined)).on(on::classes()),
            Scope::new(SymbolKind::Class, []),
        );
        let receiver = ObjectRef::detached("Svc");
        let ctx = ExecutionContext::new(method_target(Vec::new()), Some(receiver), Vec::new());
        assert!(ctx.before(&entry).instance().is_ok());

        let pending = ExecutionContext::new(method_target(Vec::new()), None, Vec::new());
        assert!(matches!(
            pending.before(&entry).instance(),
            Err(WeavingError::UninitializedInstance { .. })
        ));
    }

    #[test]
    fn data_is_shared_between_views() {
        let entry = entry_for(
            Advice::after("a", |_| Ok(Value::Undefined)).on(on::methods()),
            Scope::new(SymbolKind::Method, []),
        );
        let mut ctx = ExecutionContext::new(method_target(Vec::new()), None, vec![Value::Int(1)]);
        ctx.before(&entry).set_data("started", true);
        ctx.set_value(Value::Int(2));

        let after = ctx.after(&entry);
        assert_eq!(after.data("started"), Value::Bool(true));
        assert_eq!(after.value(), Some(&Value::Int(2)));
        assert!(after.error().is_none());
        assert_eq!(after.arg(0), Value::Int(1));
        assert!(after.arg(3).is_undefined());
    }

    #[test]
    fn parameter_views_expose_matched_parameters() {
        let not_null = AnnotationRef::new("t", "NotNull");
        let entry = entry_for(
            Advice::before("check", |_| Ok(Value::Undefined))
                .on(on::parameters().with_annotation(not_null.clone())),
            Scope::new(SymbolKind::Parameter, [not_null.clone()]),
        );
        let target = method_target(vec![
            ParamTarget::new(0, "id", vec![not_null.into()]),
            ParamTarget::new(1, "note", Vec::new()),
        ]);
        let ctx = ExecutionContext::new(target, None, Vec::new());
        let view = ctx.before(&entry);
        let names: Vec<_> = view.parameters().into_iter().map(ParamTarget::name).collect();
        assert_eq!(names, ["id"]);
        assert_eq!(entry.phase(), Phase::Before);
    }
}
