//! Error types for reposync-host.

use thiserror::Error;

/// A failed host call, already classified by [`crate::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// 401: the bearer token is missing, expired, or revoked.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// 403 that is not a rate limit.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// 403/429 rate limiting.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// 404: repository, branch, or ref absent (or invisible to this token).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// 422: the name is already taken on the account.
    #[error("already exists: {message}")]
    AlreadyExists { message: String },

    /// 422: a non-forced ref update that is not a fast-forward.
    #[error("not a fast forward: {message}")]
    NonFastForward { message: String },

    /// Any other non-success status.
    #[error("host returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Network-level failure before a status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl HostError {
    /// The human-readable reason, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            HostError::Unauthorized { message }
            | HostError::Forbidden { message }
            | HostError::RateLimited { message }
            | HostError::NotFound { message }
            | HostError::AlreadyExists { message }
            | HostError::NonFastForward { message }
            | HostError::Status { message, .. } => message,
            HostError::Transport(message) | HostError::Decode(message) => message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HostError::Unauthorized { .. })
    }
}
