//! Reusable aspect sets.
//!
//! An [`AspectProfile`] is an ordered list of aspects that can be customized
//! and then merged into a weaver as a unit. Libraries expose their profiles
//! through [`AspectGroup`].
//!
//! ```
//! use weft_advice::advice::Advice;
//! use weft_advice::aspect::AspectDef;
//! use weft_advice::pointcut::on;
//! use weft_core::value::Value;
//! use weft_weaver::profile::AspectProfile;
//!
//! let logging = AspectDef::new("Logging")
//!     .advice(Advice::after("log", |_| Ok(Value::Undefined)).on(on::methods()))
//!     .build();
//! let metrics = AspectDef::new("Metrics").build();
//! let audit = AspectDef::new("Audit").build();
//!
//! let profile = AspectProfile::new()
//!     .add(logging)
//!     .add(metrics)
//!     .add_before("Metrics", audit)
//!     .disable("Logging");
//! assert_eq!(profile.ids(), ["Audit", "Metrics"]);
//! ```

use weft_advice::aspect::Aspect;

// ─────────────────────────────────────────────────────────────────────────────
// IntoAspects
// ─────────────────────────────────────────────────────────────────────────────

/// Types accepted by [`Weaver::enable`](crate::weaver::Weaver::enable):
/// a single aspect, a list of aspects, or a profile.
pub trait IntoAspects {
    /// The aspects, in enable order.
    fn into_aspects(self) -> Vec<Aspect>;
}

impl IntoAspects for Aspect {
    fn into_aspects(self) -> Vec<Aspect> {
        vec![self]
    }
}

impl IntoAspects for &Aspect {
    fn into_aspects(self) -> Vec<Aspect> {
        vec![self.clone()]
    }
}

impl IntoAspects for Vec<Aspect> {
    fn into_aspects(self) -> Vec<Aspect> {
        self
    }
}

impl<const N: usize> IntoAspects for [Aspect; N] {
    fn into_aspects(self) -> Vec<Aspect> {
        self.into()
    }
}

impl IntoAspects for AspectProfile {
    fn into_aspects(self) -> Vec<Aspect> {
        self.aspects
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AspectGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A named bundle of aspects that users can customize before merging.
pub trait AspectGroup {
    /// Returns the aspects of this group.
    fn build(self) -> AspectProfile;
}

// ─────────────────────────────────────────────────────────────────────────────
// AspectProfile
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered set of aspects, keyed by aspect id.
#[derive(Debug, Clone, Default)]
pub struct AspectProfile {
    aspects: Vec<Aspect>,
}

impl AspectProfile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an aspect, replacing any aspect with the same id in place.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add(mut self, aspect: Aspect) -> Self {
        match self.position(aspect.id()) {
            Some(index) => self.aspects[index] = aspect,
            None => self.aspects.push(aspect),
        }
        self
    }

    /// Inserts an aspect before the aspect with id `target`.
    ///
    /// If `target` is not found, the aspect is added at the beginning.
    #[must_use]
    pub fn add_before(mut self, target: &str, aspect: Aspect) -> Self {
        self.aspects.retain(|a| a.id() != aspect.id());
        let position = self.position(target).unwrap_or(0);
        self.aspects.insert(position, aspect);
        self
    }

    /// Inserts an aspect after the aspect with id `target`.
    ///
    /// If `target` is not found, the aspect is added at the end.
    #[must_use]
    pub fn add_after(mut self, target: &str, aspect: Aspect) -> Self {
        self.aspects.retain(|a| a.id() != aspect.id());
        let position = self
            .position(target)
            .map_or(self.aspects.len(), |i| i + 1);
        self.aspects.insert(position, aspect);
        self
    }

    /// Removes the aspect with id `id`. No-op if absent.
    #[must_use]
    pub fn disable(mut self, id: &str) -> Self {
        self.aspects.retain(|a| a.id().as_ref() != id);
        self
    }

    /// Appends every aspect of `other`.
    #[must_use]
    pub fn extend(self, other: impl IntoAspects) -> Self {
        other.into_aspects().into_iter().fold(self, Self::add)
    }

    /// Aspects in enable order.
    #[must_use]
    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    /// Aspect ids in enable order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.aspects.iter().map(|a| a.id().as_ref()).collect()
    }

    /// Number of aspects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    /// Returns true if the profile holds no aspect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.aspects.iter().position(|a| a.id().as_ref() == id)
    }
}
