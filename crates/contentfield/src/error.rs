//! Error types for contentfield.
//!
//! This module defines all error types used throughout the contentfield crate.
//! Every failure here is local and recoverable by the person editing, so the
//! messages name the field, index or file involved.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for contentfield operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Schema Errors ===
    /// A field with this key already exists in the schema.
    #[error("field '{key}' already exists in the schema")]
    DuplicateField {
        /// The conflicting key.
        key: String,
    },

    /// No field with this key exists in the schema.
    #[error("unknown field '{key}'")]
    UnknownField {
        /// The missing key.
        key: String,
    },

    /// The key is empty or does not match the configured key pattern.
    #[error("invalid field key '{key}': {reason}")]
    InvalidFieldKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The type tag is not one of the structured field types.
    #[error("unknown field type '{tag}'")]
    UnknownFieldType {
        /// The unrecognized tag.
        tag: String,
    },

    // === Store Errors ===
    /// An item index was outside the list.
    #[error("item index {index} out of range (list has {len} items)")]
    ItemOutOfRange {
        /// The requested index.
        index: usize,
        /// Current number of items.
        len: usize,
    },

    /// A rename would overwrite values items keep under the new key.
    #[error("cannot rename to '{key}': {count} item(s) already hold a value under that key")]
    RenameCollision {
        /// The target key.
        key: String,
        /// Number of items holding it.
        count: usize,
    },

    /// The addressed field does not hold a list.
    #[error("field '{key}' is not a list")]
    NotAList {
        /// The field key.
        key: String,
    },

    /// The addressed field does not hold a media value.
    #[error("field '{key}' is not a media field")]
    NotMedia {
        /// The field key.
        key: String,
    },

    /// Nesting went deeper than the configured maximum.
    #[error("nesting depth {depth} exceeds maximum of {max}")]
    MaxDepthExceeded {
        /// Depth that was requested.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A document did not have the expected top-level shape.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },

    // === Upload Errors ===
    /// The upload collaborator rejected or failed the upload.
    #[error("upload of '{filename}' failed: {message}")]
    Upload {
        /// Name of the file being uploaded.
        filename: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The file's MIME type is not accepted for upload.
    #[error("unsupported media type '{mimetype}' for '{filename}'")]
    UnsupportedMediaType {
        /// Name of the file.
        filename: String,
        /// Detected MIME type.
        mimetype: String,
    },

    /// The file exceeds the configured size limit.
    #[error("'{filename}' is {size} bytes, larger than the {max} byte limit")]
    UploadTooLarge {
        /// Name of the file.
        filename: String,
        /// Size of the file.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    // === Media Library Errors ===
    /// Failed to open or create the media library database.
    #[error("failed to open media library at {path}: {source}")]
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

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

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
}

/// A specialized Result type for contentfield operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a duplicate field error.
    #[must_use]
    pub fn duplicate_field(key: impl Into<String>) -> Self {
        Self::DuplicateField { key: key.into() }
    }

    /// Create an unknown field error.
    #[must_use]
    pub fn unknown_field(key: impl Into<String>) -> Self {
        Self::UnknownField { key: key.into() }
    }

    /// Create an invalid field key error.
    #[must_use]
    pub fn invalid_field_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an upload failure error.
    #[must_use]
    pub fn upload(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an invalid document error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Check if this error came from a schema operation.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateField { .. }
                | Self::RenameCollision { .. }
                | Self::UnknownField { .. }
                | Self::InvalidFieldKey { .. }
                | Self::UnknownFieldType { .. }
        )
    }

    /// Check if this error came from the upload collaborator.
    #[must_use]
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. } | Self::UnsupportedMediaType { .. } | Self::UploadTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_field("title");
        assert_eq!(err.to_string(), "field 'title' already exists in the schema");

        let err = Error::unknown_field("body");
        assert_eq!(err.to_string(), "unknown field 'body'");
    }

    #[test]
    fn test_item_out_of_range_display() {
        let err = Error::ItemOutOfRange { index: 4, len: 2 };
        assert_eq!(
            err.to_string(),
            "item index 4 out of range (list has 2 items)"
        );
    }

    #[test]
    fn test_is_schema_error() {
        assert!(Error::duplicate_field("a").is_schema_error());
        assert!(Error::invalid_field_key("", "empty").is_schema_error());
        assert!(!Error::ItemOutOfRange { index: 0, len: 0 }.is_schema_error());
    }

    #[test]
    fn test_is_upload_error() {
        assert!(Error::upload("a.png", "refused").is_upload_error());
        let err = Error::UploadTooLarge {
            filename: "big.mp4".to_string(),
            size: 10,
            max: 5,
        };
        assert!(err.is_upload_error());
        assert!(!Error::unknown_field("x").is_upload_error());
    }

    #[test]
    fn test_upload_too_large_display() {
        let err = Error::UploadTooLarge {
            filename: "big.mp4".to_string(),
            size: 2048,
            max: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("big.mp4"));
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
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
            "/nonexistent/path/media.db",
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
            message: "max_depth must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn test_file_read_error_display() {
        let err = Error::FileRead {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));
    }
}
