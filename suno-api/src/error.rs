//! Error types for the Suno API client.

use thiserror::Error;

/// Message carried by every "cookie missing" failure and by the fallback
/// credit snapshot.
pub const NOT_CONFIGURED: &str = "SUNO_COOKIE not configured properly";

/// Errors that can occur when interacting with the Suno API.
#[derive(Debug, Error)]
pub enum SunoError {
    /// No cookie was supplied, or it was blank.
    #[error("{}", NOT_CONFIGURED)]
    NotConfigured,

    /// The cookie or bearer token was rejected by upstream.
    ///
    /// Raised when session acquisition fails, and when a request is still
    /// rejected (401/403) after one forced session refresh.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Upstream reason, or a description of the failed step.
        reason: String,
    },

    /// Network-level failure (timeout, connection reset, DNS, TLS).
    ///
    /// Never retried by the client: generation requests are billed and
    /// side-effectful, so retry policy belongs to the caller.
    #[error("transient network failure: {0}")]
    Transient(String),

    /// Upstream answered with a non-auth error status, or with a success
    /// status and a body that could not be understood.
    #[error("upstream error (HTTP {status}): {message}")]
    Upstream {
        /// HTTP status returned by upstream.
        status: u16,
        /// Status context plus a snippet of the response body.
        message: String,
    },

    /// The caller's parameters were rejected before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// File I/O error (cookie store read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error outside of response normalization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. missing config directory).
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by the boundary adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Authentication,
    Transient,
    Upstream,
}

impl SunoError {
    /// Classify this error for the fail-open policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured => ErrorKind::Configuration,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Upstream { .. } | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ErrorKind::Upstream
            }
        }
    }

    pub(crate) fn auth(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }
}

/// Convenience alias for `Result<T, SunoError>`.
pub type Result<T> = std::result::Result<T, SunoError>;
