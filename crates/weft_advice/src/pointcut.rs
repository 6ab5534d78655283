//! Pointcuts: which symbols, at which phase, an advice applies to.
//!
//! Advice declares where it applies with a [`PointcutExpr`], built from the
//! [`on`] helpers:
//!
//! ```
//! use weft_advice::pointcut::on;
//! use weft_core::annotation::AnnotationRef;
//!
//! let log = AnnotationRef::new("demo", "Log");
//! let expr = on::methods().with_annotation(log);
//! assert_eq!(expr.kinds().len(), 1);
//! ```
//!
//! The registry expands an expression into one [`Pointcut`] per symbol kind,
//! tagged with the advice's phase.
//!
//! Property pointcuts can be narrowed to one accessor:
//!
//! ```
//! use weft_advice::phase::Phase;
//! use weft_advice::pointcut::on;
//! use weft_core::symbol::Accessor;
//!
//! let reads = on::properties().getters().pointcuts(Phase::AfterReturn);
//! assert!(reads[0].accepts(Some(Accessor::Get)));
//! assert!(!reads[0].accepts(Some(Accessor::Set)));
//! ```

use core::fmt;

use indexmap::IndexSet;
use weft_core::annotation::{Annotation, AnnotationRef};
use weft_core::symbol::{Accessor, SymbolKind};

use crate::phase::Phase;

// ─────────────────────────────────────────────────────────────────────────────
// Pointcut
// ─────────────────────────────────────────────────────────────────────────────

/// A (symbol kind, phase, annotation filter) predicate.
///
/// An empty annotation set matches every symbol of the kind. Property
/// pointcuts may also be limited to one [`Accessor`]; `None` covers both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointcut {
    phase: Phase,
    kind: SymbolKind,
    annotations: IndexSet<AnnotationRef>,
    accessor: Option<Accessor>,
}

impl Pointcut {
    /// Creates a pointcut.
    #[must_use]
    pub fn new(
        phase: Phase,
        kind: SymbolKind,
        annotations: impl IntoIterator<Item = AnnotationRef>,
    ) -> Self {
        Self {
            phase,
            kind,
            annotations: annotations.into_iter().collect(),
            accessor: None,
        }
    }

    /// Limits the pointcut to one property accessor.
    #[must_use]
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Phase the pointcut applies to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Symbol kind the pointcut applies to.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Annotation filter, in declaration order.
    #[must_use]
    pub fn annotations(&self) -> &IndexSet<AnnotationRef> {
        &self.annotations
    }

    /// Accessor the pointcut is limited to, if any.
    #[must_use]
    pub fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }

    /// Whether the pointcut applies to `accessor`.
    ///
    /// A query that names no accessor (compiling a property, or any other
    /// symbol kind) is accepted by every pointcut.
    #[must_use]
    pub fn accepts(&self, accessor: Option<Accessor>) -> bool {
        match (self.accessor, accessor) {
            (Some(own), Some(queried)) => own == queried,
            _ => true,
        }
    }

    /// Whether the pointcut matches any annotation of its kind.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Whether `other` targets the same symbol kind and phase.
    #[must_use]
    pub fn is_assignable_from(&self, other: &Pointcut) -> bool {
        self.kind == other.kind && self.phase == other.phase
    }

    /// Folds `other` into `self`.
    ///
    /// The result is the union of both filters, except that an unrestricted
    /// side makes the result unrestricted. Accessors are unioned the same
    /// way: two different accessors widen to both. Callers are expected to
    /// check [`is_assignable_from`](Self::is_assignable_from) first.
    pub fn merge(&mut self, other: &Pointcut) {
        debug_assert!(self.is_assignable_from(other));
        if self.accessor != other.accessor {
            self.accessor = None;
        }
        if self.is_unrestricted() {
            return;
        }
        if other.is_unrestricted() {
            self.annotations.clear();
            return;
        }
        self.annotations.extend(other.annotations.iter().cloned());
    }

    /// Whether any of `annotations` passes the filter.
    ///
    /// An unrestricted pointcut matches any annotation list, including an
    /// empty one.
    #[must_use]
    pub fn matches<'a>(&self, annotations: impl IntoIterator<Item = &'a AnnotationRef>) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        annotations
            .into_iter()
            .any(|reference| self.annotations.contains(reference))
    }

    /// Whether any of the applied `annotations` passes the filter.
    #[must_use]
    pub fn matches_applied(&self, annotations: &[Annotation]) -> bool {
        self.matches(annotations.iter().map(Annotation::reference))
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase, self.kind)?;
        match self.accessor {
            Some(Accessor::Get) => f.write_str(" get")?,
            Some(Accessor::Set) => f.write_str(" set")?,
            None => {}
        }
        if self.annotations.is_empty() {
            return f.write_str(" *");
        }
        for (i, annotation) in self.annotations.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { " | " })?;
            write!(f, "{annotation}")?;
        }
        Ok(())
    }
}

/// Adds `pointcut` to `pointcuts`, merging it into an assignable one if any.
pub fn merge_into(pointcuts: &mut Vec<Pointcut>, pointcut: Pointcut) {
    match pointcuts.iter_mut().find(|p| p.is_assignable_from(&pointcut)) {
        Some(existing) => existing.merge(&pointcut),
        None => pointcuts.push(pointcut),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PointcutExpr
// ─────────────────────────────────────────────────────────────────────────────

/// Phase-less description of the symbols an advice targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointcutExpr {
    kinds: Vec<SymbolKind>,
    annotations: IndexSet<AnnotationRef>,
    accessor: Option<Accessor>,
}

impl PointcutExpr {
    /// Targets symbols of the given kinds.
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = SymbolKind>) -> Self {
        let mut unique: Vec<SymbolKind> = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self {
            kinds: unique,
            annotations: IndexSet::new(),
            accessor: None,
        }
    }

    /// Restricts the expression to symbols carrying `annotation`.
    ///
    /// Several calls widen the filter: a symbol matches if it carries any of
    /// the listed annotations.
    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationRef) -> Self {
        self.annotations.insert(annotation);
        self
    }

    /// Restricts the expression to symbols carrying any of `annotations`.
    #[must_use]
    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = AnnotationRef>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Restricts property targets to reads.
    #[must_use]
    pub fn getters(mut self) -> Self {
        self.accessor = Some(Accessor::Get);
        self
    }

    /// Restricts property targets to writes.
    #[must_use]
    pub fn setters(mut self) -> Self {
        self.accessor = Some(Accessor::Set);
        self
    }

    /// Targeted symbol kinds.
    #[must_use]
    pub fn kinds(&self) -> &[SymbolKind] {
        &self.kinds
    }

    /// Annotation filter.
    #[must_use]
    pub fn annotations(&self) -> &IndexSet<AnnotationRef> {
        &self.annotations
    }

    /// Accessor restriction for property targets.
    #[must_use]
    pub fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }

    /// Expands the expression into one pointcut per kind for `phase`. The
    /// accessor restriction only lands on the property pointcut.
    #[must_use]
    pub fn pointcuts(&self, phase: Phase) -> Vec<Pointcut> {
        self.kinds
            .iter()
            .map(|&kind| {
                let pointcut = Pointcut::new(phase, kind, self.annotations.iter().cloned());
                match self.accessor {
                    Some(accessor) if kind == SymbolKind::Property => pointcut.with_accessor(accessor),
                    _ => pointcut,
                }
            })
            .collect()
    }
}

/// Builders for [`PointcutExpr`].
pub mod on {
    use weft_core::symbol::SymbolKind;

    use super::PointcutExpr;

    /// Targets classes (their constructors).
    #[must_use]
    pub fn classes() -> PointcutExpr {
        PointcutExpr::new([SymbolKind::Class])
    }

    /// Targets methods, static or not.
    #[must_use]
    pub fn methods() -> PointcutExpr {
        PointcutExpr::new([SymbolKind::Method])
    }

    /// Targets property accessors.
    #[must_use]
    pub fn properties() -> PointcutExpr {
        PointcutExpr::new([SymbolKind::Property])
    }

    /// Targets method parameters.
    #[must_use]
    pub fn parameters() -> PointcutExpr {
        PointcutExpr::new([SymbolKind::Parameter])
    }

    /// Targets every symbol kind.
    #[must_use]
    pub fn any() -> PointcutExpr {
        PointcutExpr::new(SymbolKind::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str) -> AnnotationRef {
        AnnotationRef::new("test", name)
    }

    #[test]
    fn assignability_requires_same_kind_and_phase() {
        let a = Pointcut::new(Phase::Before, SymbolKind::Method, [token("A")]);
        let b = Pointcut::new(Phase::Before, SymbolKind::Method, [token("B")]);
        let c = Pointcut::new(Phase::After, SymbolKind::Method, [token("A")]);
        let d = Pointcut::new(Phase::Before, SymbolKind::Class, [token("A")]);
        assert!(a.is_assignable_from(&b));
        assert!(!a.is_assignable_from(&c));
        assert!(!a.is_assignable_from(&d));
    }

    #[test]
    fn merge_is_a_union() {
        let mut a = Pointcut::new(Phase::Before, SymbolKind::Method, [token("A")]);
        a.merge(&Pointcut::new(Phase::Before, SymbolKind::Method, [token("B"), token("A")]));
        let names: Vec<_> = a.annotations().iter().map(AnnotationRef::name).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn merge_with_unrestricted_stays_unrestricted() {
        let mut restricted = Pointcut::new(Phase::Before, SymbolKind::Method, [token("A")]);
        restricted.merge(&Pointcut::new(Phase::Before, SymbolKind::Method, []));
        assert!(restricted.is_unrestricted());

        let mut unrestricted = Pointcut::new(Phase::Before, SymbolKind::Method, []);
        unrestricted.merge(&Pointcut::new(Phase::Before, SymbolKind::Method, [token("A")]));
        assert!(unrestricted.is_unrestricted());
    }

    #[test]
    fn matching_intersects_filters() {
        let pointcut = Pointcut::new(Phase::Around, SymbolKind::Method, [token("A"), token("B")]);
        assert!(pointcut.matches([&token("B")]));
        assert!(!pointcut.matches([&token("C")]));
        assert!(!pointcut.matches([]));
        assert!(Pointcut::new(Phase::Around, SymbolKind::Method, []).matches([]));
    }

    #[test]
    fn any_expands_to_every_kind() {
        let pointcuts = on::any().with_annotation(token("A")).pointcuts(Phase::After);
        let kinds: Vec<_> = pointcuts.iter().map(Pointcut::kind).collect();
        assert_eq!(kinds, SymbolKind::ALL);
        assert!(pointcuts.iter().all(|p| p.phase() == Phase::After));
    }

    #[test]
    fn accessor_restriction_only_applies_to_properties() {
        let pointcuts = on::any().setters().pointcuts(Phase::Before);
        for pointcut in &pointcuts {
            let expected = (pointcut.kind() == SymbolKind::Property).then_some(Accessor::Set);
            assert_eq!(pointcut.accessor(), expected);
        }
    }

    #[test]
    fn accessor_queries() {
        let getter = Pointcut::new(Phase::Around, SymbolKind::Property, []).with_accessor(Accessor::Get);
        assert!(getter.accepts(Some(Accessor::Get)));
        assert!(!getter.accepts(Some(Accessor::Set)));
        assert!(getter.accepts(None));
        assert!(Pointcut::new(Phase::Around, SymbolKind::Property, []).accepts(Some(Accessor::Set)));
    }

    #[test]
    fn merging_different_accessors_covers_both() {
        let mut getter = Pointcut::new(Phase::Before, SymbolKind::Property, [token("A")]).with_accessor(Accessor::Get);
        getter.merge(&Pointcut::new(Phase::Before, SymbolKind::Property, [token("B")]).with_accessor(Accessor::Set));
        assert_eq!(getter.accessor(), None);

        let mut same = Pointcut::new(Phase::Before, SymbolKind::Property, []).with_accessor(Accessor::Set);
        same.merge(&Pointcut::new(Phase::Before, SymbolKind::Property, []).with_accessor(Accessor::Set));
        assert_eq!(same.accessor(), Some(Accessor::Set));
    }

    #[test]
    fn merge_into_folds_assignable_pointcuts() {
        let mut pointcuts = Vec::new();
        merge_into(&mut pointcuts, Pointcut::new(Phase::Before, SymbolKind::Method, [token("A")]));
        merge_into(&mut pointcuts, Pointcut::new(Phase::Before, SymbolKind::Class, [token("A")]));
        merge_into(&mut pointcuts, Pointcut::new(Phase::Before, SymbolKind::Method, [token("B")]));
        assert_eq!(pointcuts.len(), 2);
        assert_eq!(pointcuts[0].annotations().len(), 2);
    }
}
