//! Weaver configuration.
//!
//! ```
//! use weft_weaver::config::WeaverConfig;
//!
//! let config = WeaverConfig::from_json(r#"{ "trace_advice": true }"#).unwrap();
//! assert!(config.trace_advice());
//! assert_eq!(config.max_compile_passes(), WeaverConfig::DEFAULT_MAX_COMPILE_PASSES);
//! ```

use serde::{Deserialize, Serialize};

/// Error loading a [`WeaverConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not a valid configuration.
    #[error("invalid weaver configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A compile pass limit of zero would refuse every symbol.
    #[error("max_compile_passes must be at least 1")]
    ZeroCompilePasses,
}

/// Settings of a [`Weaver`](crate::weaver::Weaver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    max_compile_passes: usize,
    trace_advice: bool,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            max_compile_passes: Self::DEFAULT_MAX_COMPILE_PASSES,
            trace_advice: false,
        }
    }
}

impl WeaverConfig {
    /// Default bound of the compile fixed point.
    pub const DEFAULT_MAX_COMPILE_PASSES: usize = 64;

    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or sets
    /// `max_compile_passes` to zero.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_compile_passes == 0 {
            return Err(ConfigError::ZeroCompilePasses);
        }
        Ok(config)
    }

    /// Sets how many passes the compile fixed point may take per symbol.
    /// Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_compile_passes(mut self, max: usize) -> Self {
        self.max_compile_passes = max.max(1);
        self
    }

    /// Emits a `trace` event for every advice invocation.
    #[must_use]
    pub fn with_trace_advice(mut self, enabled: bool) -> Self {
        self.trace_advice = enabled;
        self
    }

    /// Bound of the compile fixed point.
    #[must_use]
    pub fn max_compile_passes(&self) -> usize {
        self.max_compile_passes
    }

    /// Whether advice invocations are traced.
    #[must_use]
    pub fn trace_advice(&self) -> bool {
        self.trace_advice
    }
}
