//! Error types for the wharf gateway

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, malformed, or unverifiable credential. Always rendered as a
    /// 401 challenge at the transport edge, never retried.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Malformed or contradictory tool parameters. Rendered as an error
    /// envelope with a successful HTTP status.
    #[error("validation error: {0}")]
    Validation(String),

    /// A platform API call failed. Retrying is a caller decision.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A resource URI did not match any recognized shape.
    #[error("invalid resource URI: {0}")]
    InvalidUri(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Error::Auth(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::Upstream(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid URI error
    pub fn invalid_uri(msg: impl Into<String>) -> Self {
        Error::InvalidUri(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// True when the error came from the caller's input rather than the
    /// platform or the gateway itself.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::InvalidUri(_)
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}
