//! The media library.
//!
//! An `SQLite` index of every file the [`LocalUploader`](crate::upload::LocalUploader)
//! has stored, keyed by content hash so identical uploads share one file.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::upload::{UploadKind, UploadedFile};
use schema::RECORD_COLUMNS;

const IN_MEMORY: &str = ":memory:";

/// One stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    /// Row id, `None` until inserted.
    pub id: Option<i64>,
    /// When the file was first uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Name in the media directory.
    pub filename: String,
    /// Name the file was uploaded under.
    pub original_name: String,
    /// Where the file is served from.
    pub url: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// BLAKE3 hex digest of the contents.
    pub content_hash: String,
    /// Broad category.
    pub kind: UploadKind,
}

impl MediaRecord {
    /// Describe a freshly stored upload.
    #[must_use]
    pub fn new(uploaded: &UploadedFile, original_name: &str, content_hash: String) -> Self {
        Self {
            id: None,
            uploaded_at: Utc::now(),
            filename: uploaded.filename.clone(),
            original_name: original_name.to_string(),
            url: uploaded.url.clone(),
            mimetype: uploaded.mimetype.clone(),
            size: uploaded.size,
            content_hash,
            kind: uploaded.kind,
        }
    }

    /// The upload answer for this file.
    #[must_use]
    pub fn to_uploaded(&self) -> UploadedFile {
        UploadedFile {
            url: self.url.clone(),
            filename: self.filename.clone(),
            mimetype: self.mimetype.clone(),
            size: self.size,
            kind: self.kind,
        }
    }
}

/// Summary of the library's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaStats {
    /// Number of files.
    pub total_files: i64,
    /// Combined size of all files.
    pub total_bytes: u64,
    /// Earliest upload.
    pub oldest: Option<DateTime<Utc>>,
    /// Latest upload.
    pub newest: Option<DateTime<Utc>>,
    /// Size of the database file, 0 in memory.
    pub db_size_bytes: u64,
}

/// Persistent index of uploaded files.
#[derive(Debug)]
pub struct MediaLibrary {
    path: PathBuf,
    conn: Connection,
}

impl MediaLibrary {
    /// Open or create a library database, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening media library at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Media library opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Open a throwaway in-memory library.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(IN_MEMORY),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(IN_MEMORY),
            conn,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a stored file.
    ///
    /// Returns the new id, or `None` if a file with the same content hash is
    /// already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, record: &MediaRecord) -> Result<Option<i64>> {
        if self.find_by_hash(&record.content_hash)?.is_some() {
            debug!(hash = %record.content_hash, "Skipping duplicate media record");
            return Ok(None);
        }

        self.conn.execute(
            r"
            INSERT INTO media (uploaded_at, filename, original_name, url, mimetype, size, content_hash, kind)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                record.uploaded_at.to_rfc3339(),
                record.filename,
                record.original_name,
                record.url,
                record.mimetype,
                i64::try_from(record.size).unwrap_or(i64::MAX),
                record.content_hash,
                record.kind.to_string(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, url = %record.url, "Recorded media file");
        Ok(Some(id))
    }

    /// Look a file up by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<MediaRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM media WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_record).optional()?)
    }

    /// Look a file up by content hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_hash(&self, content_hash: &str) -> Result<Option<MediaRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM media WHERE content_hash = ?1");
        Ok(self
            .conn
            .query_row(&sql, [content_hash], row_to_record)
            .optional()?)
    }

    /// Most recent uploads first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<MediaRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM media ORDER BY uploaded_at DESC, id DESC LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([to_limit(limit)], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Most recent uploads of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_by_kind(&self, kind: UploadKind, limit: usize) -> Result<Vec<MediaRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM media WHERE kind = ?1 \
             ORDER BY uploaded_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![kind.to_string(), to_limit(limit)], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Case-insensitive substring search over original file names.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<MediaRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM media WHERE original_name LIKE ?1 \
             ORDER BY uploaded_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![format!("%{query}%"), to_limit(limit)], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of recorded files.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?)
    }

    /// Remove a record, returning it if it existed.
    ///
    /// The file in the media directory is left for the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<Option<MediaRecord>> {
        let Some(record) = self.get(id)? else {
            return Ok(None);
        };
        self.conn.execute("DELETE FROM media WHERE id = ?1", [id])?;
        info!(id, url = %record.url, "Deleted media record");
        Ok(Some(record))
    }

    /// Summarize the library.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<MediaStats> {
        let (total_files, total_bytes, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0), MIN(uploaded_at), MAX(uploaded_at) FROM media",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let db_size_bytes = if self.path.as_os_str() == IN_MEMORY {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(MediaStats {
            total_files,
            total_bytes: u64::try_from(total_bytes).unwrap_or(0),
            oldest: oldest.as_deref().and_then(parse_timestamp),
            newest: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MediaRecord> {
    let uploaded_at: String = row.get(1)?;
    let size: i64 = row.get(6)?;
    let kind: String = row.get(8)?;

    let kind = kind.parse().unwrap_or_else(|_| {
        warn!("Unknown media kind: {}, treating as document", kind);
        UploadKind::Document
    });

    Ok(MediaRecord {
        id: Some(row.get(0)?),
        uploaded_at: parse_timestamp(&uploaded_at).unwrap_or_else(Utc::now),
        filename: row.get(2)?,
        original_name: row.get(3)?,
        url: row.get(4)?,
        mimetype: row.get(5)?,
        size: u64::try_from(size).unwrap_or(0),
        content_hash: row.get(7)?,
        kind,
    })
}
