//! SQL for the media library.

/// Uploaded files, one row per distinct content hash.
pub const CREATE_MEDIA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uploaded_at TEXT NOT NULL,
    filename TEXT NOT NULL,
    original_name TEXT NOT NULL,
    url TEXT NOT NULL,
    mimetype TEXT NOT NULL,
    size INTEGER NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL
)
";

/// Newest-first listing.
pub const CREATE_UPLOADED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_media_uploaded_at ON media(uploaded_at DESC)
";

/// Filtering by kind.
pub const CREATE_KIND_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_media_kind ON media(kind)
";

/// Key-value pairs such as the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Columns selected for a [`MediaRecord`](super::MediaRecord), in row order.
pub const RECORD_COLUMNS: &str =
    "id, uploaded_at, filename, original_name, url, mimetype, size, content_hash, kind";

/// Statements creating the base schema, in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MEDIA_TABLE,
    CREATE_UPLOADED_AT_INDEX,
    CREATE_KIND_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_table_columns() {
        for column in RECORD_COLUMNS.split(", ") {
            assert!(
                CREATE_MEDIA_TABLE.contains(&format!("{column} ")),
                "missing column {column}"
            );
        }
        assert!(CREATE_MEDIA_TABLE.contains("content_hash TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_metadata_comes_last() {
        assert_eq!(SCHEMA_STATEMENTS.last(), Some(&CREATE_METADATA_TABLE));
    }
}
