//! Weaving for weft (Layer 2).
//!
//! `weft_weaver` turns a class registration table into an installed class
//! whose symbols run their matching advice:
//!
//! - [`weaver`] - The weaver context: enable, disable, seal, define
//! - [`config`] - Weaver configuration
//! - [`profile`] - Reusable aspect sets
//!
//! Every symbol goes through two steps. The compile fixed point applies
//! compile advice until no new advice matches; linking then installs a
//! dispatch pipeline that runs, per call:
//!
//! ```text
//! before* -> around (onion) -> body -> after_return* | after_throw* -> after*
//! ```
//!
//! # Example
//!
//! ```
//! use weft_advice::prelude::*;
//! use weft_core::prelude::*;
//! use weft_weaver::prelude::*;
//!
//! let weaver = Weaver::with_config(WeaverConfig::new().with_trace_advice(true));
//! weaver
//!     .enable(
//!         AspectDef::new("Greeting")
//!             .advice(
//!                 Advice::after_return("shout", |_, value| {
//!                     let text = value.as_str().unwrap_or_default().to_uppercase();
//!                     Ok(Value::from(text))
//!                 })
//!                 .on(on::methods()),
//!             )
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let greeter = weaver
//!     .define(ClassDef::new("Greeter").method(MethodDef::new("hello", |_, _| Ok(Value::from("hi")))))
//!     .unwrap();
//! let greeter = greeter.construct(&[]).unwrap();
//! assert_eq!(greeter.invoke("hello", &[]).unwrap(), Value::from("HI"));
//! ```

mod around;
mod compile;
mod pipeline;
mod strategy;

/// Weaver configuration.
pub mod config;

/// Aspect profiles.
pub mod profile;

/// The weaver context.
pub mod weaver;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::profile::*;
    pub use crate::weaver::*;
}
