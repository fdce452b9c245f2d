//! Error types module
//!
//! `AppError` is the outward-facing error of the media pipeline. Component
//! errors in the processing crate convert into it at the ingestion boundary,
//! and binaries use [`AppError::log_level`] to decide how loudly to report.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for degraded collaborators such as missing tools
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Media validation failed: {0}")]
    ValidationFailed(String),

    #[error("Required tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::ValidationFailed(_) => LogLevel::Debug,
            AppError::ToolUnavailable(_) => LogLevel::Warn,
            AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. }
            | AppError::Io(_) => LogLevel::Error,
        }
    }

    /// Whether the submitter caused the failure (as opposed to the service).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_) | AppError::ValidationFailed(_)
        )
    }

    pub fn internal_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: message.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failures_are_debug_level() {
        let err = AppError::ValidationFailed("File type not allowed".to_string());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Media validation failed: File type not allowed"
        );
    }

    #[test]
    fn test_storage_failures_are_error_level() {
        let err = AppError::Storage("disk full".to_string());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
