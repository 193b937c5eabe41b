//! Storage error types.

use thiserror::Error;

/// Errors reported by an [`ObjectStore`](super::ObjectStore) implementation.
///
/// Backends classify their raw failures into these variants at the client
/// boundary, so the orchestration layer never inspects error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend's access control rejected the operation.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Backend-provided reason.
        message: String,
    },

    /// Bucket or object does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Backend-provided reason.
        message: String,
    },

    /// The resource being created already exists.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Backend-provided reason.
        message: String,
    },

    /// Any other non-success response.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Backend-provided reason.
        message: String,
    },

    /// The request never produced a response (connect, timeout, body I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// Client configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already exists error.
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create a rejected error.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the error is an access-control rejection.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Whether the error reports a resource that already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Storage orchestration errors surfaced to callers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File size exceeds the bucket size limit.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Storage configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Every storage target failed; carries the last observed failure.
    #[error("upload failed after {attempts} attempts: {last}")]
    UploadFailed {
        /// Number of single-shot uploads attempted.
        attempts: u32,
        /// Last error observed during the cascade.
        #[source]
        last: StoreError,
    },

    /// Every storage target failed without any error being captured.
    #[error("exhausted all storage targets after {attempts} attempts")]
    Exhausted {
        /// Number of single-shot uploads attempted.
        attempts: u32,
    },
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build the terminal error of an exhausted upload cascade.
    #[must_use]
    pub fn exhausted(attempts: u32, last: Option<StoreError>) -> Self {
        match last {
            Some(last) => Self::UploadFailed { attempts, last },
            None => Self::Exhausted { attempts },
        }
    }
}
