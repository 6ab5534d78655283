//! Querying the registry.
//!
//! [`AdviceRegistry::find`] is the raw query: it walks the requested buckets
//! and yields each matching entry once. [`AdviceRegistry::select`] builds the
//! ordered list of advice that applies to a symbol at one phase.

use core::slice;
use std::sync::Arc;

use hashbrown::HashSet;
use indexmap::IndexSet;
use weft_core::annotation::{Annotation, AnnotationRef};
use weft_core::symbol::{Accessor, SymbolKind};

use crate::aspect::AdviceId;
use crate::entry::AdviceEntry;
use crate::phase::Phase;
use crate::registry::AdviceRegistry;
use crate::sorter::AdviceSorter;

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// One symbol kind plus the annotations a symbol of that kind carries.
///
/// A method is selected with a method scope and, when it has parameters, a
/// parameter scope holding the union of its parameters' annotations. A
/// property read or write is selected with a scope naming its accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    kind: SymbolKind,
    annotations: IndexSet<AnnotationRef>,
    accessor: Option<Accessor>,
}

impl Scope {
    /// Creates a scope.
    #[must_use]
    pub fn new(kind: SymbolKind, annotations: impl IntoIterator<Item = AnnotationRef>) -> Self {
        Self {
            kind,
            annotations: annotations.into_iter().collect(),
            accessor: None,
        }
    }

    /// Narrows the scope to one property accessor.
    #[must_use]
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Creates a scope from applied annotations.
    #[must_use]
    pub fn of(kind: SymbolKind, annotations: &[Annotation]) -> Self {
        Self::new(kind, annotations.iter().map(|a| a.reference().clone()))
    }

    /// Symbol kind.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Annotations carried by the symbol.
    #[must_use]
    pub fn annotations(&self) -> &IndexSet<AnnotationRef> {
        &self.annotations
    }

    /// Accessor being selected for, if any.
    #[must_use]
    pub fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AdviceSelection
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, duplicate-free advice for one symbol at one phase.
#[derive(Debug, Clone, Default)]
pub struct AdviceSelection {
    phase: Option<Phase>,
    entries: Vec<Arc<AdviceEntry>>,
}

impl AdviceSelection {
    /// Phase the selection was resolved for.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Entries in dispatch order.
    #[must_use]
    pub fn entries(&self) -> &[Arc<AdviceEntry>] {
        &self.entries
    }

    /// Iterates entries in dispatch order.
    pub fn iter(&self) -> slice::Iter<'_, Arc<AdviceEntry>> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no advice applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities of the selected entries, in dispatch order.
    #[must_use]
    pub fn ids(&self) -> Vec<AdviceId> {
        self.entries.iter().map(|e| e.id().clone()).collect()
    }
}

impl<'a> IntoIterator for &'a AdviceSelection {
    type Item = &'a Arc<AdviceEntry>;
    type IntoIter = slice::Iter<'a, Arc<AdviceEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

impl AdviceRegistry {
    /// Yields entries registered for any of `kinds` at any of `phases`.
    ///
    /// With a `filter`, an entry matches when its pointcut for the bucket
    /// shares an annotation with the filter, or when either set is empty.
    /// Entries are yielded in bucket order (kinds, then phases, then enable
    /// order) and each at most once per call.
    ///
    /// The buckets are snapshotted up front; the registry lock is not held
    /// while the caller iterates.
    pub fn find(
        &self,
        kinds: &[SymbolKind],
        phases: &[Phase],
        filter: Option<&IndexSet<AnnotationRef>>,
    ) -> impl Iterator<Item = Arc<AdviceEntry>> + use<> {
        let snapshot: Vec<(SymbolKind, Phase, Arc<AdviceEntry>)> = {
            let state = self.state.read();
            let mut snapshot = Vec::new();
            for kind in kinds {
                let Some(by_phase) = state.buckets.get(kind) else {
                    continue;
                };
                for phase in phases {
                    let Some(by_aspect) = by_phase.get(phase) else {
                        continue;
                    };
                    for entry in by_aspect.values().flatten() {
                        snapshot.push((*kind, *phase, Arc::clone(entry)));
                    }
                }
            }
            snapshot
        };
        let filter = filter.cloned();
        let mut visited: HashSet<AdviceId> = HashSet::new();
        snapshot.into_iter().filter_map(move |(kind, phase, entry)| {
            let pointcut = entry.pointcut(kind, phase)?;
            let matches = match &filter {
                None => true,
                Some(filter) => {
                    filter.is_empty()
                        || pointcut.is_unrestricted()
                        || pointcut.matches(filter.iter())
                }
            };
            (matches && visited.insert(entry.id().clone())).then_some(entry)
        })
    }

    /// Resolves the ordered advice applying at `phase` to a symbol described
    /// by `scopes`.
    ///
    /// A scope without annotations only matches unrestricted pointcuts. A
    /// scope naming an accessor skips pointcuts limited to the other one.
    #[must_use]
    pub fn select(&self, phase: Phase, scopes: &[Scope]) -> AdviceSelection {
        let mut seen: HashSet<AdviceId> = HashSet::new();
        let mut entries = Vec::new();
        for scope in scopes {
            let matched = self
                .find(slice::from_ref(&scope.kind), &[phase], Some(&scope.annotations))
                .filter(|entry| {
                    let Some(pointcut) = entry.pointcut(scope.kind, phase) else {
                        return false;
                    };
                    pointcut.accepts(scope.accessor)
                        && (!scope.annotations.is_empty() || pointcut.is_unrestricted())
                });
            for entry in matched {
                if seen.insert(entry.id().clone()) {
                    entries.push(entry);
                }
            }
        }
        AdviceSorter::sort(&mut entries);
        AdviceSelection {
            phase: Some(phase),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use weft_core::value::Value;

    use super::*;
    use crate::advice::{Advice, Order};
    use crate::aspect::{Aspect, AspectDef};
    use crate::pointcut::on;

    fn token(name: &str) -> AnnotationRef {
        AnnotationRef::new("t", name)
    }

    fn before(name: &str, expr: crate::pointcut::PointcutExpr) -> Advice {
        Advice::before(name, |_| Ok(Value::Undefined)).on(expr)
    }

    fn aspect(name: &str, priority: i32, advice: Vec<Advice>) -> Aspect {
        advice
            .into_iter()
            .fold(AspectDef::new(name).priority(priority), AspectDef::advice)
            .build()
    }

    fn names(selection: &AdviceSelection) -> Vec<String> {
        selection.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn find_yields_each_entry_once() {
        let registry = AdviceRegistry::new();
        registry
            .register(&aspect("A", 0, vec![before("all", on::any())]))
            .unwrap();
        let found: Vec<_> = registry
            .find(&SymbolKind::ALL, &[Phase::Before], None)
            .collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn find_treats_empty_sets_as_wildcards() {
        let registry = AdviceRegistry::new();
        registry
            .register(&aspect(
                "A",
                0,
                vec![before("logged", on::methods().with_annotation(token("Log")))],
            ))
            .unwrap();

        let empty = IndexSet::new();
        let other: IndexSet<_> = [token("Other")].into_iter().collect();
        let kinds = [SymbolKind::Method];
        assert_eq!(registry.find(&kinds, &[Phase::Before], Some(&empty)).count(), 1);
        assert_eq!(registry.find(&kinds, &[Phase::Before], Some(&other)).count(), 0);
        assert_eq!(registry.find(&kinds, &[Phase::After], None).count(), 0);
    }

    #[test]
    fn select_matches_by_annotation() {
        let registry = AdviceRegistry::new();
        registry
            .register(&aspect(
                "A",
                0,
                vec![
                    before("logged", on::methods().with_annotation(token("Log"))),
                    before("everything", on::methods()),
                ],
            ))
            .unwrap();

        let annotated = registry.select(Phase::Before, &[Scope::new(SymbolKind::Method, [token("Log")])]);
        assert_eq!(names(&annotated), ["A.logged", "A.everything"]);

        let bare = registry.select(Phase::Before, &[Scope::new(SymbolKind::Method, [])]);
        assert_eq!(names(&bare), ["A.everything"]);
    }

    #[test]
    fn select_orders_by_priority_then_enable_order() {
        let registry = AdviceRegistry::new();
        let expr = || on::classes().with_annotation(token("Entity"));
        registry
            .register(&aspect("B", 9, vec![before("b", expr())]))
            .unwrap()
            .register(&aspect("A", 10, vec![before("a", expr())]))
            .unwrap()
            .register(&aspect("C", 9, vec![before("c", expr())]))
            .unwrap();

        let selection = registry.select(Phase::Before, &[Scope::new(SymbolKind::Class, [token("Entity")])]);
        assert_eq!(names(&selection), ["A.a", "B.b", "C.c"]);
    }

    #[test]
    fn explicit_order_beats_priority() {
        let registry = AdviceRegistry::new();
        let expr = on::methods;
        registry
            .register(&aspect("High", 100, vec![before("late", expr())]))
            .unwrap()
            .register(&aspect(
                "Low",
                -5,
                vec![
                    before("second", expr()).order(2),
                    before("first", expr()).order(Order::Highest),
                ],
            ))
            .unwrap();

        let selection = registry.select(Phase::Before, &[Scope::new(SymbolKind::Method, [])]);
        assert_eq!(names(&selection), ["Low.first", "Low.second", "High.late"]);
    }

    #[test]
    fn select_merges_scopes_without_duplicates() {
        let registry = AdviceRegistry::new();
        registry
            .register(&aspect(
                "V",
                0,
                vec![
                    before("both", on::any().with_annotation(token("Check"))),
                    before("param", on::parameters().with_annotation(token("NotNull"))),
                ],
            ))
            .unwrap();

        let selection = registry.select(
            Phase::Before,
            &[
                Scope::new(SymbolKind::Method, [token("Check")]),
                Scope::new(SymbolKind::Parameter, [token("NotNull"), token("Check")]),
            ],
        );
        assert_eq!(names(&selection), ["V.both", "V.param"]);
    }

    #[test]
    fn accessor_scopes_skip_the_other_accessor() {
        let registry = AdviceRegistry::new();
        registry
            .register(&aspect(
                "P",
                0,
                vec![
                    before("reads", on::properties().getters()),
                    before("writes", on::properties().setters()),
                    before("both", on::properties()),
                ],
            ))
            .unwrap();

        let read = Scope::new(SymbolKind::Property, []).with_accessor(Accessor::Get);
        assert_eq!(names(&registry.select(Phase::Before, &[read])), ["P.reads", "P.both"]);

        let write = Scope::new(SymbolKind::Property, []).with_accessor(Accessor::Set);
        assert_eq!(names(&registry.select(Phase::Before, &[write])), ["P.writes", "P.both"]);

        let any = Scope::new(SymbolKind::Property, []);
        assert_eq!(registry.select(Phase::Before, &[any]).len(), 3);
    }
}
