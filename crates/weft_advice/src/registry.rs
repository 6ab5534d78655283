//! Registry of enabled aspects and their advice.
//!
//! Entries are bucketed by symbol kind, then phase, then owning aspect:
//!
//! ```text
//! SymbolKind -> Phase -> AspectId -> [AdviceEntry]
//! ```
//!
//! An entry whose pointcuts cover several kinds (for example `on::any()`) is
//! shared by every matching bucket.
//!
//! # Consumption
//!
//! Once a symbol has been compiled, the annotations it carries and its kind
//! are marked as consumed. Enabling an aspect that targets a consumed
//! annotation, or that targets every symbol of a consumed kind, is refused:
//! the already compiled symbols would silently miss the new advice.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use weft_core::annotation::AnnotationRef;
use weft_core::error::WeavingError;
use weft_core::symbol::SymbolKind;

use crate::aspect::{AdviceId, Aspect, AspectId};
use crate::entry::AdviceEntry;
use crate::phase::Phase;

type Buckets = HashMap<SymbolKind, HashMap<Phase, IndexMap<AspectId, Vec<Arc<AdviceEntry>>>>>;

#[derive(Default)]
pub(crate) struct RegistryState {
    pub(crate) aspects: IndexMap<AspectId, Aspect>,
    pub(crate) buckets: Buckets,
    advice_ids: HashSet<AdviceId>,
    consumed_annotations: HashSet<AnnotationRef>,
    consumed_kinds: HashSet<SymbolKind>,
    next_seq: u64,
}

impl RegistryState {
    fn check_consumption(&self, aspect: &Aspect) -> Result<(), WeavingError> {
        for resolved in aspect.resolve() {
            for pointcut in &resolved.pointcuts {
                if pointcut.is_unrestricted() && self.consumed_kinds.contains(&pointcut.kind()) {
                    return Err(WeavingError::KindConsumed {
                        aspect: aspect.id().to_string(),
                        kind: pointcut.kind(),
                    });
                }
                if let Some(annotation) = pointcut
                    .annotations()
                    .iter()
                    .find(|a| self.consumed_annotations.contains(*a))
                {
                    return Err(WeavingError::AnnotationConsumed {
                        aspect: aspect.id().to_string(),
                        annotation: annotation.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, aspect: &Aspect) {
        self.aspects.insert(Arc::clone(aspect.id()), aspect.clone());
        for resolved in aspect.resolve() {
            if resolved.pointcuts.is_empty() {
                tracing::debug!(aspect = %aspect.id(), advice = %resolved.id, "advice has no pointcut");
                continue;
            }
            if !self.advice_ids.insert(resolved.id.clone()) {
                tracing::trace!(aspect = %aspect.id(), advice = %resolved.id, "advice already registered");
                continue;
            }
            let seq = self.next_seq;
            self.next_seq += 1;
            let entry = Arc::new(AdviceEntry::new(
                resolved.id,
                resolved.advice,
                resolved.pointcuts,
                aspect.clone(),
                seq,
            ));
            for pointcut in entry.pointcuts() {
                self.buckets
                    .entry(pointcut.kind())
                    .or_default()
                    .entry(pointcut.phase())
                    .or_default()
                    .entry(Arc::clone(aspect.id()))
                    .or_default()
                    .push(Arc::clone(&entry));
            }
        }
    }

    fn rebuild(&mut self) {
        let aspects: Vec<Aspect> = self.aspects.values().cloned().collect();
        self.aspects.clear();
        self.buckets.clear();
        self.advice_ids.clear();
        self.next_seq = 0;
        for aspect in &aspects {
            self.insert(aspect);
        }
    }
}

/// Registry of enabled aspects.
///
/// # Thread Safety
///
/// The registry uses interior mutability via [`RwLock`]. Queries snapshot the
/// shared entries and release the lock before returning, so advice never runs
/// under it.
#[derive(Default)]
pub struct AdviceRegistry {
    pub(crate) state: RwLock<RegistryState>,
}

impl AdviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every advice of `aspect`, including inherited advice.
    ///
    /// Advice whose identity is already registered (inherited from another
    /// enabled aspect) is skipped.
    ///
    /// # Errors
    ///
    /// - [`WeavingError::DuplicateAspect`] if the aspect id is taken.
    /// - [`WeavingError::AnnotationConsumed`] / [`WeavingError::KindConsumed`]
    ///   if the aspect targets symbols that were already compiled.
    ///
    /// Nothing is registered when an error is returned.
    pub fn register(&self, aspect: &Aspect) -> Result<&Self, WeavingError> {
        let mut state = self.state.write();
        if state.aspects.contains_key(aspect.id()) {
            tracing::warn!(aspect = %aspect.id(), "aspect already enabled");
            return Err(WeavingError::DuplicateAspect(aspect.id().to_string()));
        }
        if let Err(err) = state.check_consumption(aspect) {
            tracing::warn!(aspect = %aspect.id(), error = %err, "aspect rejected");
            return Err(err);
        }
        state.insert(aspect);
        tracing::debug!(aspect = %aspect.id(), priority = aspect.priority(), "aspect registered");
        Ok(self)
    }

    /// Removes an aspect and every entry it contributed.
    ///
    /// Advice that the removed aspect shadowed for other enabled aspects is
    /// registered again for them. Returns `false` if the aspect was not
    /// registered.
    pub fn unregister(&self, id: &str) -> bool {
        let mut state = self.state.write();
        if state.aspects.shift_remove(id).is_none() {
            return false;
        }
        state.rebuild();
        tracing::debug!(aspect = id, "aspect unregistered");
        true
    }

    /// Removes every aspect. Consumption marks are kept.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.aspects.clear();
        state.rebuild();
    }

    /// Whether an aspect with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.state.read().aspects.contains_key(id)
    }

    /// Registered aspects, in enable order.
    #[must_use]
    pub fn aspects(&self) -> Vec<Aspect> {
        self.state.read().aspects.values().cloned().collect()
    }

    /// Number of distinct registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().advice_ids.len()
    }

    /// Whether no entry is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks `annotations` and `kind` as consumed by a compiled symbol.
    pub fn mark_consumed<'a>(
        &self,
        kind: SymbolKind,
        annotations: impl IntoIterator<Item = &'a AnnotationRef>,
    ) {
        let mut state = self.state.write();
        state.consumed_kinds.insert(kind);
        state
            .consumed_annotations
            .extend(annotations.into_iter().cloned());
    }

    /// Whether `annotation` was consumed by a compiled symbol.
    #[must_use]
    pub fn is_consumed(&self, annotation: &AnnotationRef) -> bool {
        self.state.read().consumed_annotations.contains(annotation)
    }
}

#[cfg(test)]
mod tests {
    use weft_core::value::Value;

    use super::*;
    use crate::advice::Advice;
    use crate::aspect::AspectDef;
    use crate::pointcut::on;

    fn token(name: &str) -> AnnotationRef {
        AnnotationRef::new("t", name)
    }

    fn logging(annotation: AnnotationRef) -> Aspect {
        AspectDef::new("Logging")
            .advice(
                Advice::before("enter", |_| Ok(Value::Undefined))
                    .on(on::any().with_annotation(annotation)),
            )
            .build()
    }

    #[test]
    fn duplicate_aspect_ids_are_rejected() {
        let registry = AdviceRegistry::new();
        let aspect = logging(token("Log"));
        registry.register(&aspect).unwrap();
        let err = registry.register(&aspect).err().unwrap();
        assert!(matches!(err, WeavingError::DuplicateAspect(id) if id == "Logging"));
    }

    #[test]
    fn any_kind_entries_are_shared_across_buckets() {
        let registry = AdviceRegistry::new();
        registry.register(&logging(token("Log"))).unwrap();
        assert_eq!(registry.len(), 1);

        let state = registry.state.read();
        let entries: Vec<_> = SymbolKind::ALL
            .iter()
            .map(|kind| Arc::clone(&state.buckets[kind][&Phase::Before]["Logging"][0]))
            .collect();
        assert!(entries.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn inherited_advice_is_registered_once() {
        let registry = AdviceRegistry::new();
        let base = logging(token("Log"));
        let child = AspectDef::new("VerboseLogging").extends(&base).build();
        registry.register(&base).unwrap().register(&child).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.aspects().len(), 2);
    }

    #[test]
    fn unregister_restores_shadowed_advice() {
        let registry = AdviceRegistry::new();
        let base = logging(token("Log"));
        let child = AspectDef::new("VerboseLogging").extends(&base).build();
        registry.register(&base).unwrap().register(&child).unwrap();

        assert!(registry.unregister("Logging"));
        assert!(!registry.unregister("Logging"));
        assert_eq!(registry.len(), 1);
        let state = registry.state.read();
        assert!(state.buckets[&SymbolKind::Method][&Phase::Before].contains_key("VerboseLogging"));
    }

    #[test]
    fn consumed_annotations_block_registration() {
        let registry = AdviceRegistry::new();
        registry.mark_consumed(SymbolKind::Method, [&token("Log")]);

        let err = registry.register(&logging(token("Log"))).err().unwrap();
        assert!(matches!(err, WeavingError::AnnotationConsumed { .. }));
        assert!(registry.is_empty());
        assert!(!registry.contains("Logging"));

        registry.register(&logging(token("Trace")).with_id("tracing")).unwrap();
    }

    #[test]
    fn unrestricted_pointcuts_on_consumed_kinds_are_refused() {
        let registry = AdviceRegistry::new();
        registry.mark_consumed(SymbolKind::Property, []);
        let aspect = AspectDef::new("Everything")
            .advice(Advice::after("all", |_| Ok(Value::Undefined)).on(on::properties()))
            .build();
        let err = registry.register(&aspect).err().unwrap();
        assert!(matches!(err, WeavingError::KindConsumed { kind: SymbolKind::Property, .. }));
    }

    #[test]
    fn clear_keeps_consumption_marks() {
        let registry = AdviceRegistry::new();
        registry.register(&logging(token("Log"))).unwrap();
        registry.mark_consumed(SymbolKind::Class, [&token("Entity")]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.is_consumed(&token("Entity")));
    }
}
