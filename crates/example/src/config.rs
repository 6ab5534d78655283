//! Run configuration of the `audit` binary.

use serde::Deserialize;
use weft_weaver::config::{ConfigError, WeaverConfig};

/// Error loading an [`AuditConfig`].
#[derive(Debug, thiserror::Error)]
pub enum AuditConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The document is not a valid configuration.
    #[error("invalid audit configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The engine settings are out of range.
    #[error(transparent)]
    Weaver(#[from] ConfigError),
}

/// Settings of one run.
///
/// ```json
/// { "owner": "ada", "opening_balance": 100, "weaver": { "trace_advice": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Owner of the demo account.
    pub owner: String,
    /// Balance the account opens with.
    pub opening_balance: i64,
    /// Filter directives handed to the tracing subscriber.
    pub log_filter: String,
    /// Engine settings.
    pub weaver: WeaverConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            owner: "ada".to_owned(),
            opening_balance: 100,
            log_filter: "info,weft_weaver=debug".to_owned(),
            weaver: WeaverConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Parses a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuditConfigError::Json`] if the document does not parse and
    /// [`AuditConfigError::Weaver`] if the engine settings are out of range.
    pub fn from_json(json: &str) -> Result<Self, AuditConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.weaver.max_compile_passes() == 0 {
            return Err(ConfigError::ZeroCompilePasses.into());
        }
        Ok(config)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, AuditConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| AuditConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&json)
    }
}
