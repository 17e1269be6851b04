//! Error types for the voxserve voice registry.

/// Result type alias for voxserve operations
pub type VoxResult<T> = Result<T, VoxError>;

/// Main error type for voice registry operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VoxError {
    /// Request field missing or malformed, including invalid model-name grammar
    #[error("Invalid input: {message}")]
    Validation {
        /// Error message describing the invalid input
        message: String,
    },

    /// Voice, model or alias does not exist
    #[error("'{name}' not found")]
    NotFound {
        /// The voice, model or alias name that was not found
        name: String,
    },

    /// Attempt to mutate a builtin alias or a builtin-aliased model
    #[error("'{name}' is builtin and cannot be removed")]
    Immutable {
        /// The builtin alias or model name
        name: String,
    },

    /// Durable write of the custom alias table failed
    #[error("Persistence failed: {message}")]
    Persistence {
        /// Error message describing the failed write
        message: String,
    },

    /// Remote fetch of a model artifact failed or timed out
    #[error("Download failed: {message}")]
    Download {
        /// Error message describing the fetch failure
        message: String,
    },

    /// Artifact present on disk but could not be instantiated (transient)
    #[error("Failed to load voice model: {message}")]
    LoadFailed {
        /// Error message describing the load failure
        message: String,
    },

    /// The synthesis engine collaborator failed
    #[error("Synthesis failed: {message}")]
    Synthesis {
        /// Error message describing the synthesis failure
        message: String,
    },
}

impl VoxError {
    /// Create a new validation error
    #[must_use]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    #[must_use]
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a new immutable error
    #[must_use]
    pub fn immutable<S: Into<String>>(name: S) -> Self {
        Self::Immutable { name: name.into() }
    }

    /// Create a new persistence error
    #[must_use]
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a new download error
    #[must_use]
    pub fn download<S: Into<String>>(message: S) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Create a new load-failed error
    #[must_use]
    pub fn load_failed<S: Into<String>>(message: S) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    /// Create a new synthesis error
    #[must_use]
    pub fn synthesis<S: Into<String>>(message: S) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    /// Check if this error is transient: an identical retry may succeed
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Download { .. } | Self::LoadFailed { .. })
    }

    /// Check if this error is due to invalid user input
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::Immutable { .. }
        )
    }

    /// Get the error category for logging/metrics
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Immutable { .. } => "immutable",
            Self::Persistence { .. } => "persistence",
            Self::Download { .. } => "download",
            Self::LoadFailed { .. } => "load",
            Self::Synthesis { .. } => "synthesis",
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for VoxError {
    fn from(err: std::io::Error) -> Self {
        Self::load_failed(err.to_string())
    }
}

impl From<serde_json::Error> for VoxError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(format!("JSON serialization error: {err}"))
    }
}

impl From<tokio::time::error::Elapsed> for VoxError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::download(format!("operation timed out: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoxError::not_found("emma");
        assert_eq!(err.to_string(), "'emma' not found");

        let err = VoxError::immutable("emma");
        assert_eq!(err.to_string(), "'emma' is builtin and cannot be removed");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(VoxError::validation("x").category(), "validation");
        assert_eq!(VoxError::not_found("x").category(), "not_found");
        assert_eq!(VoxError::immutable("x").category(), "immutable");
        assert_eq!(VoxError::persistence("x").category(), "persistence");
        assert_eq!(VoxError::download("x").category(), "download");
        assert_eq!(VoxError::load_failed("x").category(), "load");
        assert_eq!(VoxError::synthesis("x").category(), "synthesis");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(VoxError::download("x").is_retriable());
        assert!(VoxError::load_failed("x").is_retriable());
        assert!(!VoxError::validation("x").is_retriable());
        assert!(!VoxError::persistence("x").is_retriable());
    }

    #[test]
    fn test_user_errors() {
        assert!(VoxError::validation("x").is_user_error());
        assert!(VoxError::not_found("x").is_user_error());
        assert!(VoxError::immutable("x").is_user_error());
        assert!(!VoxError::download("x").is_user_error());
        assert!(!VoxError::load_failed("x").is_user_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = VoxError::from(io_err);
        assert!(matches!(err, VoxError::LoadFailed { .. }));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(VoxError::download("a"), VoxError::download("a"));
        assert_ne!(VoxError::download("a"), VoxError::download("b"));
    }
}
