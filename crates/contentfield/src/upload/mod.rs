//! The upload collaborator.
//!
//! Media fields do not handle bytes themselves. They hand an [`UploadFile`] to
//! an [`Uploader`] and store the URL it answers with. Upload is the only
//! asynchronous step in editing: one request, one response, no retry.
//!
//! [`LocalUploader`] is the bundled implementation, writing files into a
//! media directory and indexing them in the [media library](crate::media).

mod local;
mod mime;

pub use local::LocalUploader;
pub use mime::{detect_mimetype, extension_for};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Broad category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Still image.
    Image,
    /// Video.
    Video,
    /// Anything else.
    Document,
}

impl UploadKind {
    /// Categorize a MIME type.
    #[must_use]
    pub fn from_mimetype(mimetype: &str) -> Self {
        match mimetype.split_once('/').map(|(family, _)| family) {
            Some("image") => Self::Image,
            Some("video") => Self::Video,
            _ => Self::Document,
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Document => write!(f, "document"),
        }
    }
}

impl FromStr for UploadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            other => Err(Error::invalid_document(format!("unknown upload kind: {other}"))),
        }
    }
}

/// A file waiting to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// MIME type, if the caller knows it.
    pub mimetype: Option<String>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .field("mimetype", &self.mimetype)
            .finish()
    }
}

impl UploadFile {
    /// Create an upload from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            mimetype: None,
        }
    }

    /// Set the MIME type explicitly.
    #[must_use]
    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(filename, bytes))
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the upload collaborator answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Where the file is served from.
    pub url: String,
    /// Stored file name.
    pub filename: String,
    /// Detected MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Broad category.
    #[serde(rename = "type")]
    pub kind: UploadKind,
}

/// Accepts files and returns where they can be fetched.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Upload one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is rejected or cannot be stored.
    async fn upload(&self, file: UploadFile) -> Result<UploadedFile>;
}

/// A transient notification about an upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The file was uploaded and attached.
    Uploaded(UploadedFile),
    /// The upload failed; nothing changed.
    Failed {
        /// What to show the user.
        message: String,
    },
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn uploaded(file: UploadedFile) -> Self {
        Self::Uploaded(file)
    }

    /// A failure notice.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Check whether the upload succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }

    /// Text to show the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Uploaded(file) => format!("Uploaded {} ({} bytes)", file.filename, file.size),
            Self::Failed { message } => format!("Upload failed: {message}"),
        }
    }
}
