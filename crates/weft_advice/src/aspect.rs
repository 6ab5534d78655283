//! Aspects: named, prioritized bundles of advice.
//!
//! An [`AspectDef`] describes an aspect prototype; [`AspectDef::build`] turns
//! it into an [`Aspect`] handle that can be enabled on a weaver. Aspects may
//! extend other aspects, inheriting their advice and priority.
//!
//! ```
//! use weft_advice::advice::Advice;
//! use weft_advice::aspect::AspectDef;
//! use weft_advice::pointcut::on;
//! use weft_core::value::Value;
//!
//! let logging = AspectDef::new("Logging")
//!     .priority(10)
//!     .advice(Advice::after("done", |_| Ok(Value::Undefined)).on(on::methods()))
//!     .build();
//!
//! let verbose = AspectDef::new("VerboseLogging").extends(&logging).build();
//! assert_eq!(verbose.priority(), 10);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::advice::Advice;
use crate::pointcut::{Pointcut, merge_into};

/// Identity of an enabled aspect.
pub type AspectId = Arc<str>;

static NEXT_PROTOTYPE: AtomicU64 = AtomicU64::new(1);

// ─────────────────────────────────────────────────────────────────────────────
// AdviceId
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identity of an advice: the declaring prototype plus the advice name.
///
/// An advice inherited by a derived aspect keeps the identity of the
/// prototype that declared it, so enabling both aspects registers it once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdviceId {
    prototype: u64,
    aspect: Arc<str>,
    advice: Arc<str>,
}

impl AdviceId {
    /// Name of the aspect prototype that declared the advice.
    #[must_use]
    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    /// Advice name.
    #[must_use]
    pub fn advice(&self) -> &str {
        &self.advice
    }
}

impl fmt::Display for AdviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.aspect, self.advice)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AspectDef
// ─────────────────────────────────────────────────────────────────────────────

struct Prototype {
    serial: u64,
    name: Arc<str>,
    parent: Option<Arc<Prototype>>,
    priority: Option<i32>,
    advice: Vec<Advice>,
}

impl Prototype {
    fn priority(&self) -> i32 {
        match (self.priority, &self.parent) {
            (Some(priority), _) => priority,
            (None, Some(parent)) => parent.priority(),
            (None, None) => 0,
        }
    }

    /// Prototypes from the root ancestor down to `self`.
    fn lineage(self: &Arc<Self>) -> Vec<Arc<Prototype>> {
        let mut chain = vec![Arc::clone(self)];
        let mut current = self.parent.clone();
        while let Some(proto) = current {
            current = proto.parent.clone();
            chain.push(proto);
        }
        chain.reverse();
        chain
    }
}

/// Builder for an aspect prototype.
pub struct AspectDef {
    name: Arc<str>,
    parent: Option<Arc<Prototype>>,
    priority: Option<i32>,
    advice: Vec<Advice>,
}

impl AspectDef {
    /// Starts an aspect named `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            priority: None,
            advice: Vec::new(),
        }
    }

    /// Inherits advice and priority from `parent`.
    #[must_use]
    pub fn extends(mut self, parent: &Aspect) -> Self {
        self.parent = Some(Arc::clone(&parent.prototype));
        self
    }

    /// Sets the priority. Higher priorities run first among advice of equal
    /// explicit order.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Declares an advice. Declaring a name the parent already declares
    /// overrides the parent's handler.
    #[must_use]
    pub fn advice(mut self, advice: Advice) -> Self {
        self.advice.push(advice);
        self
    }

    /// Finishes the prototype. The resulting aspect's id is its name.
    #[must_use]
    pub fn build(self) -> Aspect {
        let prototype = Arc::new(Prototype {
            serial: NEXT_PROTOTYPE.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            parent: self.parent,
            priority: self.priority,
            advice: self.advice,
        });
        Aspect {
            id: Arc::clone(&prototype.name),
            prototype,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aspect
// ─────────────────────────────────────────────────────────────────────────────

/// An advice resolved through an aspect's inheritance chain.
#[derive(Debug, Clone)]
pub struct ResolvedAdvice {
    /// Identity of the winning declaration.
    pub id: AdviceId,
    /// The winning declaration.
    pub advice: Advice,
    /// Pointcuts gathered from every declaration of that name.
    pub pointcuts: Vec<Pointcut>,
}

/// A built aspect, cheap to clone.
#[derive(Clone)]
pub struct Aspect {
    id: AspectId,
    prototype: Arc<Prototype>,
}

impl Aspect {
    /// Identity used by the registry.
    #[must_use]
    pub fn id(&self) -> &AspectId {
        &self.id
    }

    /// Prototype name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.prototype.name
    }

    /// Returns an equivalent aspect registered under another id.
    #[must_use]
    pub fn with_id(&self, id: impl Into<AspectId>) -> Self {
        Self {
            id: id.into(),
            prototype: Arc::clone(&self.prototype),
        }
    }

    /// Effective priority: own, else inherited, else `0`.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.prototype.priority()
    }

    /// Whether this aspect's prototype extends `other`'s.
    #[must_use]
    pub fn extends(&self, other: &Aspect) -> bool {
        let mut current = self.prototype.parent.as_ref();
        while let Some(proto) = current {
            if Arc::ptr_eq(proto, &other.prototype) {
                return true;
            }
            current = proto.parent.as_ref();
        }
        false
    }

    /// Advice declared directly on this aspect's prototype.
    #[must_use]
    pub fn own_advice(&self) -> &[Advice] {
        &self.prototype.advice
    }

    /// Resolves the advice visible on this aspect, ancestors first.
    ///
    /// A derived declaration with the same name replaces the handler and
    /// order of the inherited one and takes over its identity; pointcuts of
    /// every declaration are merged when assignable. Pointcuts whose phase no
    /// longer matches the winning handler are dropped.
    #[must_use]
    pub fn resolve(&self) -> Vec<ResolvedAdvice> {
        let mut resolved: IndexMap<Arc<str>, ResolvedAdvice> = IndexMap::new();
        for proto in self.prototype.lineage() {
            for advice in &proto.advice {
                let id = AdviceId {
                    prototype: proto.serial,
                    aspect: Arc::clone(&proto.name),
                    advice: Arc::clone(advice.shared_name()),
                };
                match resolved.get_mut(advice.name()) {
                    Some(existing) => {
                        existing.id = id;
                        existing.advice = advice.clone();
                        for pointcut in advice.pointcuts() {
                            merge_into(&mut existing.pointcuts, pointcut);
                        }
                    }
                    None => {
                        resolved.insert(
                            Arc::clone(advice.shared_name()),
                            ResolvedAdvice {
                                id,
                                advice: advice.clone(),
                                pointcuts: advice.pointcuts(),
                            },
                        );
                    }
                }
            }
        }
        resolved
            .into_values()
            .map(|mut item| {
                let phase = item.advice.phase();
                item.pointcuts.retain(|p| p.phase() == phase);
                item
            })
            .collect()
    }
}

impl fmt::Debug for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aspect")
            .field("id", &self.id)
            .field("name", &self.prototype.name)
            .field("priority", &self.priority())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use weft_core::annotation::AnnotationRef;
    use weft_core::value::Value;

    use super::*;
    use crate::phase::Phase;
    use crate::pointcut::on;

    fn noop_after(name: &str) -> Advice {
        Advice::after(name, |_| Ok(Value::Undefined))
    }

    #[test]
    fn priority_is_inherited_unless_overridden() {
        let base = AspectDef::new("Base").priority(7).build();
        let child = AspectDef::new("Child").extends(&base).build();
        let other = AspectDef::new("Other").extends(&base).priority(1).build();
        let plain = AspectDef::new("Plain").build();

        assert_eq!(child.priority(), 7);
        assert_eq!(other.priority(), 1);
        assert_eq!(plain.priority(), 0);
        assert!(child.extends(&base));
        assert!(!base.extends(&child));
    }

    #[test]
    fn with_id_keeps_the_prototype() {
        let aspect = AspectDef::new("Cache").advice(noop_after("store").on(on::methods())).build();
        let copy = aspect.with_id("cache-2");
        assert_eq!(copy.id().as_ref(), "cache-2");
        assert_eq!(copy.name(), "Cache");
        assert_eq!(aspect.resolve()[0].id, copy.resolve()[0].id);
    }

    #[test]
    fn inherited_advice_keeps_the_declaring_identity() {
        let a = AnnotationRef::new("t", "A");
        let base = AspectDef::new("Base")
            .advice(noop_after("log").on(on::methods().with_annotation(a)))
            .build();
        let child = AspectDef::new("Child").extends(&base).build();

        let resolved = child.resolve();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, base.resolve()[0].id);
        assert_eq!(resolved[0].id.aspect(), "Base");
    }

    #[test]
    fn overriding_advice_merges_pointcuts_and_takes_over_identity() {
        let a = AnnotationRef::new("t", "A");
        let b = AnnotationRef::new("t", "B");
        let base = AspectDef::new("Base")
            .advice(noop_after("log").on(on::methods().with_annotation(a)))
            .build();
        let child = AspectDef::new("Child")
            .extends(&base)
            .advice(noop_after("log").on(on::methods().with_annotation(b)))
            .build();

        let resolved = child.resolve();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id.aspect(), "Child");
        assert_eq!(resolved[0].pointcuts.len(), 1);
        assert_eq!(resolved[0].pointcuts[0].annotations().len(), 2);
        assert_eq!(resolved[0].pointcuts[0].phase(), Phase::After);
    }

    #[test]
    fn overriding_with_another_phase_drops_stale_pointcuts() {
        let base = AspectDef::new("Base")
            .advice(noop_after("hook").on(on::classes()))
            .build();
        let child = AspectDef::new("Child")
            .extends(&base)
            .advice(Advice::before("hook", |_| Ok(Value::Undefined)).on(on::methods()))
            .build();

        let resolved = child.resolve();
        assert_eq!(resolved[0].pointcuts.len(), 1);
        assert_eq!(resolved[0].pointcuts[0].phase(), Phase::Before);
    }
}
