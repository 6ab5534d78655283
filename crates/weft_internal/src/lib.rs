//! # weft Internal Library
//!
//! Re-exports the core weft crates for convenience.

/// Layer 1: values, annotations, symbols and the host object model.
pub use weft_core;

/// Layer 2: aspects, pointcuts and the advice registry.
pub use weft_advice;

/// Layer 2: the weaver.
pub use weft_weaver;

/// Layer 3: subscriber setup.
#[cfg(feature = "tracing")]
pub use weft_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use weft_advice::prelude::*;
    pub use weft_core::prelude::*;
    pub use weft_weaver::prelude::*;
}
