//! Error types and result aliases for Sprig operations.
//!
//! Provides a unified error type covering every failure class the bump
//! pipeline can hit, with an explicit tag per class so callers match on
//! kinds instead of probing error shapes.

use thiserror::Error;

/// Unified error type for all Sprig operations
#[derive(Error, Debug)]
pub enum SprigError {
    // Payload errors
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Failed to parse job body: {message}")]
    JsonParse { message: String },

    // Version errors
    #[error("Invalid version format: {input} (expected 'major.minor.patch')")]
    VersionFormat { input: String },

    #[error("Invalid value in version: {component}")]
    VersionComponent { component: String },

    // Registry errors
    #[error("Registry store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Git write errors
    #[error("Branch '{branch}' in {repo} moved since its tip was read")]
    RefConflict { repo: String, branch: String },

    #[error("Rate limit not lifted after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Unexpected API status {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    // Manifest tool errors
    #[error("Manifest update tool failed: {message}")]
    ManifestTool { message: String },

    // Configuration errors
    #[error("Missing required configuration: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Sprig operations
pub type SprigResult<T> = Result<T, SprigError>;

impl SprigError {
    /// Create a network error from any error type
    pub fn network<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a store error from any backend error type
    pub fn store<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-payload error
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Whether the batch as a whole must be failed rather than a single item.
    ///
    /// Only configuration errors escalate past job scope; everything else is
    /// isolated to the item that produced it.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, SprigError::Configuration { .. })
    }
}

impl From<serde_json::Error> for SprigError {
    fn from(err: serde_json::Error) -> Self {
        SprigError::JsonParse {
            message: err.to_string(),
        }
    }
}
