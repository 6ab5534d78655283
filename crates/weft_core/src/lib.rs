//! Foundational types for weft (Layer 1).
//!
//! `weft_core` provides what both the advice engine and the weaver build on:
//!
//! - [`value`] - Dynamic values passed to bodies and advice
//! - [`annotation`] - Annotation tokens and their applications
//! - [`symbol`] - Symbol kinds, identity keys and target descriptions
//! - [`object`] - Host object model (class tables, installed classes, instances)
//! - [`compiled`] - Compiled symbol definitions
//! - [`error`] - Error taxonomy
//!
//! # Architecture
//!
//! - **Layer 1** (`weft_core`): data model (this crate)
//! - **Layer 2** (`weft_advice`, `weft_weaver`): advice registry and weaving
//! - **Layer 3** (`weft_tracing`): subscriber setup for the engine's events

/// Annotation tokens and annotation instances.
pub mod annotation;

/// Compiled symbol definitions.
pub mod compiled;

/// Errors raised by bodies, advice and the weaver.
pub mod error;

/// Host object model.
pub mod object;

/// Symbol identity and targets.
pub mod symbol;

/// Dynamic values.
pub mod value;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::annotation::*;
    pub use crate::compiled::*;
    pub use crate::error::*;
    pub use crate::object::*;
    pub use crate::symbol::*;
    pub use crate::value::*;
}
