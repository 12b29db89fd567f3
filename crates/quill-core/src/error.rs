use thiserror::Error;

/// Protocol-wide error types for Quill.
#[derive(Debug, Error)]
pub enum QuillError {
    /// Bad admin credential presented when establishing a Connection.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Untrusted origin attempting a feed push, or an unverifiable reply.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Reply rejected after a failed reverse-trust probe.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any I/O failure talking to a remote instance.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Referenced post or feed entry is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed origin, empty title, and similar caller mistakes.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness constraint would be violated (e.g. slug already taken).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage layer error (RocksDB).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QuillError {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            QuillError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            QuillError::Unauthorized(_) => "UNAUTHORIZED",
            QuillError::Forbidden(_) => "FORBIDDEN",
            QuillError::NetworkUnavailable(_) => "NETWORK_UNAVAILABLE",
            QuillError::NotFound(_) => "NOT_FOUND",
            QuillError::InvalidInput(_) => "INVALID_INPUT",
            QuillError::Conflict(_) => "CONFLICT",
            QuillError::Storage(_) => "STORAGE_ERROR",
            QuillError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error is an authorization rejection that must be
    /// surfaced to the immediate caller with a stable status.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QuillError::AuthenticationFailed
                | QuillError::Unauthorized(_)
                | QuillError::Forbidden(_)
        )
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(e: serde_json::Error) -> Self {
        QuillError::Serialization(e.to_string())
    }
}
