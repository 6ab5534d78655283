//! An aspect-oriented weaving engine.
//!
//! Declare classes through a registration table, bundle advice into aspects,
//! and let a [`Weaver`](prelude::Weaver) install definitions that run the
//! advice around the original behavior.

pub use weft_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use weft_internal::prelude::*;
}
