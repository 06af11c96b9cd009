//! Error types for photojournal.
//!
//! Most failures in the journal degrade to a safe default at the call site
//! (fallback quote, empty photo list, camera error screen). The variants
//! here are what is left to report: storage that cannot be opened or
//! written, bad configuration, and camera or encoding failures.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for photojournal operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Camera Errors ===
    /// No camera could be opened: permission denied, no device, or an
    /// unreadable source.
    #[error("camera unavailable: {message}")]
    CameraUnavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// A camera operation was requested in the wrong state.
    #[error("camera is {state}, cannot {operation}")]
    CameraState {
        /// The state the camera was in.
        state: String,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Encoding a captured frame failed.
    #[error("image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),

    // === Quote Errors ===
    /// The quote service returned something unusable.
    #[error("quote fetch failed: {message}")]
    QuoteFetch {
        /// Description of what went wrong.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for photojournal operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a camera unavailable error.
    #[must_use]
    pub fn camera_unavailable(message: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            message: message.into(),
        }
    }

    /// Create a quote fetch error.
    #[must_use]
    pub fn quote_fetch(message: impl Into<String>) -> Self {
        Self::QuoteFetch {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the camera could not be opened.
    #[must_use]
    pub fn is_camera_unavailable(&self) -> bool {
        matches!(self, Self::CameraUnavailable { .. })
    }

    /// Check if this error came from the quote service.
    #[must_use]
    pub fn is_quote_failure(&self) -> bool {
        matches!(
            self,
            Self::QuoteFetch { .. } | Self::Http(_) | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_unavailable_display() {
        let err = Error::camera_unavailable("permission denied");
        assert_eq!(err.to_string(), "camera unavailable: permission denied");
        assert!(err.is_camera_unavailable());
        assert!(!Error::internal("x").is_camera_unavailable());
    }

    #[test]
    fn test_camera_state_display() {
        let err = Error::CameraState {
            state: "idle".to_string(),
            operation: "capture",
        };
        assert_eq!(err.to_string(), "camera is idle, cannot capture");
    }

    #[test]
    fn test_quote_failure_predicate() {
        assert!(Error::quote_fetch("status 503").is_quote_failure());
        assert!(Error::Timeout {
            operation: "quote fetch".to_string()
        }
        .is_quote_failure());
        assert!(!Error::camera_unavailable("x").is_quote_failure());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/journal.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "jpeg_quality out of range".to_string(),
        };
        assert!(err.to_string().contains("jpeg_quality"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
