//! The weaver context.
//!
//! A [`Weaver`] owns the advice registry and the compile cache. Aspects are
//! enabled while it is open; the first [`Weaver::define`] seals it, after which
//! the set of enabled aspects is fixed.
//!
//! # Example
//!
//! ```
//! use weft_advice::prelude::*;
//! use weft_core::prelude::*;
//! use weft_weaver::weaver::Weaver;
//!
//! let traced = AnnotationRef::new("demo", "traced");
//! let weaver = Weaver::new();
//! weaver
//!     .enable(
//!         AspectDef::new("Doubler")
//!             .advice(
//!                 Advice::around("double", |_, jp, args| {
//!                     let value = jp.proceed(args)?;
//!                     Ok(Value::Int(value.as_int().unwrap_or_default() * 2))
//!                 })
//!                 .on(on::methods().with_annotation(traced.clone())),
//!             )
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let counter = weaver
//!     .define(
//!         ClassDef::new("Counter").method(
//!             MethodDef::new("answer", |_, _| Ok(Value::Int(21))).annotate(&traced),
//!         ),
//!     )
//!     .unwrap();
//!
//! let counter = counter.construct(&[]).unwrap();
//! assert_eq!(counter.invoke("answer", &[]).unwrap(), Value::Int(42));
//! assert!(weaver.is_sealed());
//! ```

use std::fmt;

use hashbrown::HashMap;
use parking_lot::Mutex;
use weft_advice::aspect::Aspect;
use weft_advice::registry::AdviceRegistry;
use weft_core::compiled::CompiledSymbol;
use weft_core::error::WeavingError;
use weft_core::object::{Class, ClassDef, ClassRef, Method, Property};
use weft_core::symbol::{ClassId, SymbolId, Target};

use crate::compile::{CompileCache, Compiler};
use crate::config::WeaverConfig;
use crate::profile::{AspectProfile, IntoAspects};
use crate::strategy::{ClassStrategy, MethodStrategy, PropertyStrategy, WeaveContext, WeavingStrategy};

/// Build state of a weaver.
///
/// The weaver progresses `Open` → `Sealed`; only [`Weaver::reset`] goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Aspects may be enabled and disabled.
    #[default]
    Open,
    /// A symbol was compiled; the aspect set is fixed.
    Sealed,
}

/// Weaving context: enabled aspects, compiled symbols and build state.
///
/// # Thread Safety
///
/// All methods take `&self`. Registration holds the state lock for its whole
/// duration, so it cannot interleave with sealing. No lock is held while
/// advice or original bodies run.
pub struct Weaver {
    config: WeaverConfig,
    registry: AdviceRegistry,
    cache: Mutex<CompileCache>,
    state: Mutex<BuildState>,
}

impl Default for Weaver {
    fn default() -> Self {
        Self::with_config(WeaverConfig::default())
    }
}

impl Weaver {
    /// Creates an open weaver with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an open weaver with `config`.
    #[must_use]
    pub fn with_config(config: WeaverConfig) -> Self {
        Self {
            config,
            registry: AdviceRegistry::new(),
            cache: Mutex::new(CompileCache::default()),
            state: Mutex::new(BuildState::Open),
        }
    }

    /// Weaver configuration.
    #[must_use]
    pub fn config(&self) -> &WeaverConfig {
        &self.config
    }

    /// Underlying advice registry.
    #[must_use]
    pub fn registry(&self) -> &AdviceRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Enables aspects, in order.
    ///
    /// Either every aspect is enabled or none is: when one is rejected, the
    /// ones this call already registered are removed again.
    ///
    /// # Errors
    ///
    /// - [`WeavingError::Sealed`] once a symbol was compiled.
    /// - [`WeavingError::DuplicateAspect`] if an aspect id is already enabled.
    /// - [`WeavingError::AnnotationConsumed`] / [`WeavingError::KindConsumed`]
    ///   if an aspect targets symbols compiled before.
    pub fn enable(&self, aspects: impl IntoAspects) -> Result<&Self, WeavingError> {
        let state = self.state.lock();
        ensure_open(*state, "enable aspects")?;

        let aspects = aspects.into_aspects();
        for (index, aspect) in aspects.iter().enumerate() {
            if let Err(err) = self.registry.register(aspect) {
                for done in &aspects[..index] {
                    self.registry.unregister(done.id());
                }
                return Err(err);
            }
        }
        tracing::debug!(
            aspects = ?aspects.iter().map(|a| &**a.id()).collect::<Vec<_>>(),
            "aspects enabled"
        );
        Ok(self)
    }

    /// Disables aspects by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::Sealed`] once a symbol was compiled.
    pub fn disable<I>(&self, ids: I) -> Result<&Self, WeavingError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let state = self.state.lock();
        ensure_open(*state, "disable aspects")?;

        for id in ids {
            let id = id.as_ref();
            if self.registry.unregister(id) {
                tracing::debug!(aspect = id, "aspect disabled");
            }
        }
        Ok(self)
    }

    /// Enables every aspect of `profile` that is not enabled yet.
    ///
    /// # Errors
    ///
    /// Same as [`enable`](Self::enable).
    pub fn merge(&self, profile: AspectProfile) -> Result<&Self, WeavingError> {
        let pending: Vec<Aspect> = profile
            .into_aspects()
            .into_iter()
            .filter(|aspect| {
                let enabled = self.registry.contains(aspect.id());
                if enabled {
                    tracing::debug!(aspect = %aspect.id(), "aspect already enabled, skipped");
                }
                !enabled
            })
            .collect();
        self.enable(pending)
    }

    /// Whether an aspect with `id` is enabled.
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Enabled aspects, in enable order.
    #[must_use]
    pub fn aspects(&self) -> Vec<Aspect> {
        self.registry.aspects()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Build state
    // ─────────────────────────────────────────────────────────────────────────

    /// Seals the weaver. Sealing twice is a no-op.
    pub fn seal(&self) {
        let mut state = self.state.lock();
        if *state == BuildState::Open {
            *state = BuildState::Sealed;
            tracing::debug!(aspects = self.registry.aspects().len(), "weaver sealed");
        }
    }

    /// Whether the weaver is sealed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state() == BuildState::Sealed
    }

    /// Current build state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        *self.state.lock()
    }

    /// Disables every aspect and reopens the weaver.
    ///
    /// Compiled symbols stay compiled: their annotations and kinds remain
    /// consumed, and enabling an aspect that targets them fails.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        self.registry.clear();
        *state = BuildState::Open;
        tracing::debug!("weaver reset");
    }

    /// Compiled definition of `symbol`, if it was compiled.
    #[must_use]
    pub fn compiled(&self, symbol: &SymbolId) -> Option<CompiledSymbol> {
        self.cache.lock().get(symbol).cloned()
    }

    /// Number of compiled symbols.
    #[must_use]
    pub fn compiled_len(&self) -> usize {
        self.cache.lock().len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Definition
    // ─────────────────────────────────────────────────────────────────────────

    /// Weaves every symbol of `definition` and returns the installed class.
    ///
    /// Seals the weaver. The class symbol is compiled first; the compiled
    /// class definition then decides which methods and properties are woven.
    ///
    /// # Errors
    ///
    /// Returns the first structural error raised while compiling or linking.
    pub fn define(&self, definition: ClassDef) -> Result<ClassRef, WeavingError> {
        self.seal();
        let cx = WeaveContext::new(
            &self.registry,
            &self.config,
            Compiler::new(&self.registry, &self.cache, &self.config),
        );

        let id = ClassId::new(definition.name());
        let parent = definition.parent().cloned();
        let class_strategy = ClassStrategy::new(id.clone(), parent.clone());
        let (compiled, class_target) = class_strategy.compile(&cx, definition)?;

        let mut method_links: HashMap<SymbolId, (MethodStrategy, Target)> = HashMap::new();
        let mut methods = Vec::with_capacity(compiled.methods().len());
        for definition in compiled.methods() {
            let inherited = parent.as_ref().and_then(|parent| {
                let method = if definition.is_static() {
                    parent.find_static(definition.name())
                } else {
                    parent.find_method(definition.name())
                };
                method.map(|m| m.definition().annotations().to_vec())
            });
            let strategy = MethodStrategy::new(id.clone(), inherited);
            let (definition, target) = strategy.compile(&cx, definition.clone())?;
            let definition = definition.with_annotations(target.annotations().to_vec());
            methods.push(Method::new(target.id().clone(), definition));
            method_links.insert(target.id().clone(), (strategy, target));
        }

        let mut property_links: HashMap<SymbolId, (PropertyStrategy, Target)> = HashMap::new();
        let mut properties = Vec::with_capacity(compiled.properties().len());
        for definition in compiled.properties() {
            let inherited = parent
                .as_ref()
                .and_then(|parent| parent.find_property(definition.name()))
                .map(|p| p.definition().annotations().to_vec());
            let strategy = PropertyStrategy::new(id.clone(), inherited);
            let (definition, target) = strategy.compile(&cx, definition.clone())?;
            let definition = definition.with_annotations(target.annotations().to_vec());
            properties.push(Property::new(target.id().clone(), definition));
            property_links.insert(target.id().clone(), (strategy, target));
        }

        let class = Class::assemble(
            id,
            parent,
            class_target.annotations().to_vec(),
            compiled.constructor_body().cloned(),
            methods,
            properties,
        );

        for method in class.methods().chain(class.static_methods()) {
            let (strategy, target) = take(&mut method_links, method.symbol())?;
            strategy.link(&cx, method, target)?;
        }
        for property in class.properties() {
            let (strategy, target) = take(&mut property_links, property.symbol())?;
            strategy.link(&cx, property, target)?;
        }
        class_strategy.link(&cx, &class, class_target)?;

        tracing::debug!(
            class = class.name(),
            methods = class.methods().count() + class.static_methods().count(),
            properties = class.properties().count(),
            "class defined"
        );
        Ok(class)
    }
}

impl fmt::Debug for Weaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weaver")
            .field("state", &self.state())
            .field("aspects", &self.registry.aspects().len())
            .field("compiled", &self.compiled_len())
            .field("config", &self.config)
            .finish()
    }
}

fn ensure_open(state: BuildState, operation: &'static str) -> Result<(), WeavingError> {
    match state {
        BuildState::Open => Ok(()),
        BuildState::Sealed => {
            tracing::warn!(operation, "weaver is sealed");
            Err(WeavingError::Sealed { operation })
        }
    }
}

fn take<V>(links: &mut HashMap<SymbolId, V>, symbol: &SymbolId) -> Result<V, WeavingError> {
    links.remove(symbol).ok_or_else(|| WeavingError::Unlinked {
        symbol: symbol.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use weft_advice::advice::Advice;
    use weft_advice::aspect::AspectDef;
    use weft_advice::pointcut::on;
    use weft_core::annotation::AnnotationRef;
    use weft_core::object::MethodDef;
    use weft_core::value::Value;

    use super::*;

    fn tagged() -> AnnotationRef {
        AnnotationRef::new("test", "tagged")
    }

    fn noop(name: &str) -> Aspect {
        AspectDef::new(name)
            .advice(Advice::before("noop", |_| Ok(Value::Undefined)).on(on::methods().with_annotation(tagged())))
            .build()
    }

    #[test]
    fn define_seals_the_weaver() {
        let weaver = Weaver::new();
        assert_eq!(weaver.state(), BuildState::Open);
        weaver.define(ClassDef::new("Empty")).unwrap();
        assert!(weaver.is_sealed());

        let err = weaver.enable(noop("Late")).unwrap_err();
        assert!(matches!(err, WeavingError::Sealed { .. }));
    }

    #[test]
    fn failed_enable_rolls_back_the_whole_batch() {
        let weaver = Weaver::new();
        weaver.enable(noop("Existing")).unwrap();

        let err = weaver.enable(vec![noop("Fresh"), noop("Existing")]).unwrap_err();
        assert!(matches!(err, WeavingError::DuplicateAspect(id) if id == "Existing"));
        assert!(!weaver.is_enabled("Fresh"));
        assert!(weaver.is_enabled("Existing"));
    }

    #[test]
    fn disable_ignores_unknown_ids() {
        let weaver = Weaver::new();
        weaver.enable(noop("Known")).unwrap();
        weaver.disable(["Known", "Unknown"]).unwrap();
        assert!(weaver.aspects().is_empty());
    }

    #[test]
    fn merge_skips_enabled_aspects() {
        let weaver = Weaver::new();
        weaver.enable(noop("A")).unwrap();
        weaver
            .merge(AspectProfile::new().add(noop("A")).add(noop("B")))
            .unwrap();

        let ids: Vec<String> = weaver.aspects().iter().map(|a| a.id().to_string()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn compiled_symbols_are_cached() {
        let weaver = Weaver::new();
        let class = weaver
            .define(ClassDef::new("Svc").method(MethodDef::new("run", |_, _| Ok(Value::Null))))
            .unwrap();

        assert!(weaver.compiled(&class.symbol()).is_some());
        let method = class.find_method("run").unwrap();
        assert!(
            weaver
                .compiled(method.symbol())
                .and_then(|c| c.as_method().map(|m| m.name().to_owned()))
                .is_some_and(|name| name == "run")
        );
        assert_eq!(weaver.compiled_len(), 2);
    }
}
