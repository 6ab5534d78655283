//! Advice engine for weft (Layer 2).
//!
//! `weft_advice` stores enabled aspects and answers "which advice applies to
//! this symbol, at this phase, in which order":
//!
//! - [`phase`] - Advice phases
//! - [`pointcut`] - Pointcuts, pointcut expressions and the [`on`](pointcut::on) builders
//! - [`advice`] - Advice declarations and explicit precedence
//! - [`aspect`] - Aspect prototypes, inheritance and identity
//! - [`registry`] - Bucketed registry of enabled advice
//! - [`selection`] - Registry queries and ordered selections
//! - [`sorter`] - Total order over advice
//! - [`joinpoint`] - Single-use join points
//! - [`context`] - Per-invocation context and phase views
//!
//! Weaving symbols with the selected advice is done by `weft_weaver`.

/// Advice declarations.
pub mod advice;

/// Aspects.
pub mod aspect;

/// Per-invocation context and phase views.
pub mod context;

/// Registered advice entries.
pub mod entry;

/// Join points.
pub mod joinpoint;

/// Advice phases.
pub mod phase;

/// Pointcuts.
pub mod pointcut;

/// Advice registry.
pub mod registry;

/// Registry queries.
pub mod selection;

/// Advice ordering.
pub mod sorter;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::advice::*;
    pub use crate::aspect::*;
    pub use crate::context::*;
    pub use crate::entry::*;
    pub use crate::joinpoint::*;
    pub use crate::phase::*;
    pub use crate::pointcut::*;
    pub use crate::registry::*;
    pub use crate::selection::*;
    pub use crate::sorter::*;
}
