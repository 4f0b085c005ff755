//! Filesystem-backed uploader.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use super::mime::{detect_mimetype, extension_for};
use super::{UploadFile, UploadKind, UploadedFile, Uploader};
use crate::config::{Config, UploadConfig};
use crate::error::{Error, Result};
use crate::media::{MediaLibrary, MediaRecord};

/// Number of hash hex characters used in stored file names.
const STORED_NAME_HASH_LEN: usize = 16;

/// Writes uploads into a media directory under content-hash names.
///
/// Identical content is stored once: when a media library is attached, a
/// repeated upload answers with the existing file's URL.
#[derive(Debug)]
pub struct LocalUploader {
    media_dir: PathBuf,
    config: UploadConfig,
    library: Option<Mutex<MediaLibrary>>,
}

impl LocalUploader {
    /// Create an uploader writing into `media_dir`.
    #[must_use]
    pub fn new(media_dir: impl Into<PathBuf>, config: UploadConfig) -> Self {
        Self {
            media_dir: media_dir.into(),
            config,
            library: None,
        }
    }

    /// Create an uploader from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.media_dir(), config.upload.clone())
    }

    /// Record every upload in a media library.
    #[must_use]
    pub fn with_library(mut self, library: MediaLibrary) -> Self {
        self.library = Some(Mutex::new(library));
        self
    }

    /// The directory files are written to.
    #[must_use]
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    fn with_index<R>(&self, f: impl FnOnce(&MediaLibrary) -> Result<R>) -> Result<Option<R>> {
        match &self.library {
            Some(library) => {
                let library = library.lock().unwrap_or_else(PoisonError::into_inner);
                f(&library).map(Some)
            }
            None => Ok(None),
        }
    }

    fn url_for(&self, stored_name: &str) -> String {
        format!("{}/{stored_name}", self.config.base_url.trim_end_matches('/'))
    }

    fn check(&self, file: &UploadFile) -> Result<String> {
        let size = file.size();
        if size > self.config.max_size_bytes {
            return Err(Error::UploadTooLarge {
                filename: file.filename.clone(),
                size,
                max: self.config.max_size_bytes,
            });
        }

        let mimetype = file
            .mimetype
            .clone()
            .unwrap_or_else(|| detect_mimetype(&file.filename, &file.bytes));
        if !self.config.allows(&mimetype) {
            return Err(Error::UnsupportedMediaType {
                filename: file.filename.clone(),
                mimetype,
            });
        }
        Ok(mimetype)
    }
}

/// Build `<hash prefix>.<ext>`, preferring the original extension.
fn stored_name(hash: &str, filename: &str, mimetype: &str) -> String {
    let original_ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    let ext = original_ext
        .or_else(|| extension_for(mimetype).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string());
    let prefix = &hash[..STORED_NAME_HASH_LEN.min(hash.len())];
    format!("{prefix}.{ext}")
}

#[async_trait::async_trait]
impl Uploader for LocalUploader {
    async fn upload(&self, file: UploadFile) -> Result<UploadedFile> {
        let mimetype = self.check(&file)?;
        let content_hash = blake3::hash(&file.bytes).to_hex().to_string();

        if let Some(existing) = self
            .with_index(|library| library.find_by_hash(&content_hash))?
            .flatten()
        {
            info!(
                filename = %file.filename,
                url = %existing.url,
                "Upload matches an existing file, reusing it"
            );
            return Ok(existing.to_uploaded());
        }

        let name = stored_name(&content_hash, &file.filename, &mimetype);
        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.media_dir.clone(),
                source,
            })?;
        let path = self.media_dir.join(&name);
        tokio::fs::write(&path, &file.bytes).await?;
        debug!(path = %path.display(), size = file.size(), "Wrote upload");

        let uploaded = UploadedFile {
            url: self.url_for(&name),
            filename: name,
            kind: UploadKind::from_mimetype(&mimetype),
            mimetype,
            size: file.size(),
        };

        let record = MediaRecord::new(&uploaded, &file.filename, content_hash);
        self.with_index(|library| library.insert(&record))?;

        info!(filename = %file.filename, url = %uploaded.url, "Uploaded file");
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn uploader(dir: &Path) -> LocalUploader {
        LocalUploader::new(dir, UploadConfig::default())
    }

    #[test]
    fn test_stored_name() {
        let hash = "0123456789abcdef0123456789abcdef";
        assert_eq!(stored_name(hash, "Team Photo.PNG", "image/png"), "0123456789abcdef.png");
        assert_eq!(stored_name(hash, "blob", "video/mp4"), "0123456789abcdef.mp4");
        assert_eq!(stored_name(hash, "weird.p?g", "text/plain"), "0123456789abcdef.bin");
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let media_dir = dir.path().join("uploads");
        let uploaded = uploader(&media_dir)
            .upload(UploadFile::new("hero.png", PNG.to_vec()))
            .await
            .unwrap();

        assert_eq!(uploaded.mimetype, "image/png");
        assert_eq!(uploaded.kind, UploadKind::Image);
        assert_eq!(uploaded.size, PNG.len() as u64);
        assert!(uploaded.url.starts_with("/uploads/"));
        assert!(uploaded.filename.ends_with(".png"));

        let written = std::fs::read(media_dir.join(&uploaded.filename)).unwrap();
        assert_eq!(written, PNG);
    }

    #[tokio::test]
    async fn test_upload_rejects_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            max_size_bytes: 4,
            ..UploadConfig::default()
        };
        let err = LocalUploader::new(dir.path(), config)
            .upload(UploadFile::new("hero.png", PNG.to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadTooLarge { max: 4, .. }));
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_types() {
        let dir = tempfile::tempdir().unwrap();
        let err = uploader(dir.path())
            .upload(UploadFile::new("archive.zip", b"PK\x03\x04".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType { .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_explicit_mimetype_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let uploaded = uploader(dir.path())
            .upload(UploadFile::new("clip", vec![0, 1, 2]).with_mimetype("video/mp4"))
            .await
            .unwrap();
        assert_eq!(uploaded.kind, UploadKind::Video);
        assert!(uploaded.filename.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            base_url: "https://cdn.example.com/media/".to_string(),
            ..UploadConfig::default()
        };
        let uploaded = LocalUploader::new(dir.path(), config)
            .upload(UploadFile::new("a.png", PNG.to_vec()))
            .await
            .unwrap();
        assert!(uploaded.url.starts_with("https://cdn.example.com/media/"));
        assert!(!uploaded.url.contains("media//"));
    }

    #[tokio::test]
    async fn test_library_records_and_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let uploader =
            uploader(dir.path()).with_library(MediaLibrary::open_in_memory().unwrap());

        let first = uploader
            .upload(UploadFile::new("first.png", PNG.to_vec()))
            .await
            .unwrap();
        let second = uploader
            .upload(UploadFile::new("second-name.png", PNG.to_vec()))
            .await
            .unwrap();

        assert_eq!(first, second);
        let count = uploader
            .with_index(MediaLibrary::count)
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);

        let record = uploader
            .with_index(|library| library.find_by_hash(&blake3::hash(PNG).to_hex().to_string()))
            .unwrap()
            .flatten()
            .unwrap();
        assert_eq!(record.original_name, "first.png");
    }
}
