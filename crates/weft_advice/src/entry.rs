//! Registered advice.

use core::fmt;

use weft_core::symbol::SymbolKind;

use crate::advice::{Advice, AdviceHandler, Order};
use crate::aspect::{AdviceId, Aspect};
use crate::phase::Phase;
use crate::pointcut::Pointcut;

/// An advice as stored in the registry.
///
/// Built once when its aspect is enabled and shared behind `Arc` afterwards.
/// `seq` records registration order and breaks the last ordering ties.
#[derive(Clone)]
pub struct AdviceEntry {
    id: AdviceId,
    advice: Advice,
    pointcuts: Vec<Pointcut>,
    aspect: Aspect,
    seq: u64,
}

impl AdviceEntry {
    pub(crate) fn new(
        id: AdviceId,
        advice: Advice,
        pointcuts: Vec<Pointcut>,
        aspect: Aspect,
        seq: u64,
    ) -> Self {
        Self {
            id,
            advice,
            pointcuts,
            aspect,
            seq,
        }
    }

    /// Stable advice identity.
    #[must_use]
    pub fn id(&self) -> &AdviceId {
        &self.id
    }

    /// Advice name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.advice.name()
    }

    /// The declaration.
    #[must_use]
    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    /// Phase-tagged handler.
    #[must_use]
    pub fn handler(&self) -> &AdviceHandler {
        self.advice.handler()
    }

    /// Phase of the advice.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.advice.phase()
    }

    /// Explicit precedence, if any.
    #[must_use]
    pub fn order(&self) -> Option<Order> {
        self.advice.precedence()
    }

    /// Merged pointcuts, at most one per symbol kind.
    #[must_use]
    pub fn pointcuts(&self) -> &[Pointcut] {
        &self.pointcuts
    }

    /// The pointcut for `kind` at `phase`, if the entry has one.
    #[must_use]
    pub fn pointcut(&self, kind: SymbolKind, phase: Phase) -> Option<&Pointcut> {
        self.pointcuts
            .iter()
            .find(|p| p.kind() == kind && p.phase() == phase)
    }

    /// Owning aspect.
    #[must_use]
    pub fn aspect(&self) -> &Aspect {
        &self.aspect
    }

    /// Registration sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Debug for AdviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceEntry")
            .field("id", &self.id)
            .field("aspect", &self.aspect.id())
            .field("order", &self.order())
            .field("seq", &self.seq)
            .field("pointcuts", &self.pointcuts)
            .finish()
    }
}

impl fmt::Display for AdviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.aspect.id(), self.advice.name())
    }
}
