//! Subscriber setup for weft (Layer 3).
//!
//! The engine only emits `tracing` events; it never installs a subscriber.
//! [`TracingConfig`] is the one-call setup for binaries and tests that want
//! to see them:
//!
//! | Level | Events |
//! |-------|--------|
//! | `debug` | aspects enabled and disabled, weaver sealed, classes defined |
//! | `trace` | compile passes, pipelines resolved, advice invoked (with `trace_advice`) |
//! | `warn` | structural errors at the point they are raised |
//!
//! # Example
//!
//! ```
//! use tracing::Level;
//! use weft_tracing::{TracingConfig, TracingFormat};
//!
//! let config = TracingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("weft_weaver=trace,weft_advice=debug");
//! assert!(config.filter().is_ok());
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingInitError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingInitError {
    /// The filter directives do not parse.
    #[error("invalid tracing filter: {0}")]
    InvalidFilter(#[from] ParseError),
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// # Environment Filter
///
/// Without an explicit filter every target is enabled up to `level`. Use
/// [`with_env_filter`](Self::with_env_filter) for per-crate levels:
///
/// ```
/// use weft_tracing::TracingConfig;
///
/// TracingConfig::new().with_env_filter("weft_weaver=trace,weft_advice=warn")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets filter directives, `target=level,target=level,...`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Configured maximum level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Configured output format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the filter layer.
    ///
    /// # Errors
    ///
    /// Returns [`TracingInitError::InvalidFilter`] if the directives set by
    /// [`with_env_filter`](Self::with_env_filter) do not parse.
    pub fn filter(&self) -> Result<EnvFilter, TracingInitError> {
        match &self.env_filter {
            Some(directives) => Ok(EnvFilter::try_new(directives)?),
            None => Ok(EnvFilter::new(self.level.as_str())),
        }
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// - [`TracingInitError::InvalidFilter`] if the filter does not parse.
    /// - [`TracingInitError::AlreadyInitialized`] if a global subscriber is
    ///   already installed.
    pub fn init(&self) -> Result<(), TracingInitError> {
        let filter = self.filter()?;
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            TracingFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().pretty().with_span_events(span_events))
                .try_init()?,
            TracingFormat::Compact => registry
                .with(tracing_subscriber::fmt::layer().compact().with_span_events(span_events))
                .try_init()?,
            TracingFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_span_events(span_events))
                .try_init()?,
        }

        tracing::debug!(level = %self.level, format = ?self.format, "tracing initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_info_and_pretty() {
        let config = TracingConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(config.format(), TracingFormat::Pretty);
        assert!(!config.span_events);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn builders_set_fields() {
        let config = TracingConfig::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("weft_weaver=trace")
            .with_span_events(true);
        assert_eq!(config.level(), Level::TRACE);
        assert_eq!(config.format(), TracingFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("weft_weaver=trace"));
        assert!(config.span_events);
    }

    #[test]
    fn invalid_filter_is_reported() {
        let config = TracingConfig::new().with_env_filter("weft_weaver=loudest");
        assert!(matches!(config.filter(), Err(TracingInitError::InvalidFilter(_))));
        assert!(matches!(config.init(), Err(TracingInitError::InvalidFilter(_))));
    }

    #[test]
    fn second_init_is_refused() {
        let config = TracingConfig::new().with_format(TracingFormat::Compact);
        let _first = config.init();
        assert!(matches!(
            config.init(),
            Err(TracingInitError::AlreadyInitialized(_))
        ));
    }
}
