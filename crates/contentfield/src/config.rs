//! Configuration management for contentfield.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::content::schema::DEFAULT_KEY_PATTERN;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "contentfield";

/// Default media library database file name.
const DATABASE_FILE_NAME: &str = "media.db";

/// Default media directory name inside the data directory.
const MEDIA_DIR_NAME: &str = "uploads";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CONTENTFIELD_`, sections split on `__`)
/// 2. TOML config file at `~/.config/contentfield/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema inference configuration.
    pub inference: InferenceConfig,
    /// Editor configuration.
    pub editor: EditorConfig,
    /// Upload configuration.
    pub upload: UploadConfig,
    /// Media library configuration.
    pub media: MediaConfig,
}

/// Schema inference configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Strings longer than this many characters are inferred as long text.
    pub long_text_threshold: usize,
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum nesting depth for list-of-list editing.
    pub max_depth: usize,
    /// Regex every field key must match.
    pub key_pattern: String,
    /// Prefix for auto-generated placeholder keys.
    pub field_prefix: String,
}

/// Upload configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    /// Defaults to `~/.local/share/contentfield/uploads`
    pub media_dir: Option<PathBuf>,
    /// URL prefix under which uploaded files are served.
    pub base_url: String,
    /// Maximum upload size in bytes.
    pub max_size_bytes: u64,
    /// Accepted MIME types. A trailing `/*` matches a whole family.
    pub allowed_mimetypes: Vec<String>,
}

/// Media library configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to the media library database.
    /// Defaults to `~/.local/share/contentfield/media.db`
    pub database_path: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            long_text_threshold: 60,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            key_pattern: DEFAULT_KEY_PATTERN.to_string(),
            field_prefix: "field".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_dir: None,
            base_url: "/uploads".to_string(),
            max_size_bytes: 50 * 1024 * 1024,
            allowed_mimetypes: default_allowed_mimetypes(),
        }
    }
}

/// MIME types accepted for upload by default.
fn default_allowed_mimetypes() -> Vec<String> {
    vec![
        "image/*".to_string(),
        "video/*".to_string(),
        "application/pdf".to_string(),
    ]
}

impl UploadConfig {
    /// Check whether a MIME type is accepted.
    #[must_use]
    pub fn allows(&self, mimetype: &str) -> bool {
        self.allowed_mimetypes.iter().any(|allowed| {
            match allowed.strip_suffix("/*") {
                Some(family) => mimetype
                    .split_once('/')
                    .is_some_and(|(head, _)| head.eq_ignore_ascii_case(family)),
                None => allowed.eq_ignore_ascii_case(mimetype),
            }
        })
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CONTENTFIELD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.inference.long_text_threshold == 0 {
            return Err(Error::ConfigValidation {
                message: "long_text_threshold must be greater than 0".to_string(),
            });
        }

        if self.editor.max_depth == 0 {
            return Err(Error::ConfigValidation {
                message: "max_depth must be greater than 0".to_string(),
            });
        }

        if regex::Regex::new(&self.editor.key_pattern).is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid regex pattern: {}", self.editor.key_pattern),
            });
        }

        if self.editor.field_prefix.is_empty() {
            return Err(Error::ConfigValidation {
                message: "field_prefix cannot be empty".to_string(),
            });
        }

        if self.upload.base_url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "base_url cannot be empty".to_string(),
            });
        }

        if self.upload.max_size_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_size_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the media directory, resolving defaults if not set.
    #[must_use]
    pub fn media_dir(&self) -> PathBuf {
        self.upload
            .media_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(MEDIA_DIR_NAME))
    }

    /// Get the media library database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.media
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.inference.long_text_threshold, 60);
        assert_eq!(config.editor.max_depth, 8);
        assert_eq!(config.editor.field_prefix, "field");
        assert_eq!(config.upload.base_url, "/uploads");
        assert!(config.media.database_path.is_none());
    }

    #[test]
    fn test_default_upload_config() {
        let upload = UploadConfig::default();

        assert!(upload.media_dir.is_none());
        assert_eq!(upload.max_size_bytes, 50 * 1024 * 1024);
        assert!(!upload.allowed_mimetypes.is_empty());
    }

    #[test]
    fn test_upload_allows_families() {
        let upload = UploadConfig::default();

        assert!(upload.allows("image/png"));
        assert!(upload.allows("video/mp4"));
        assert!(upload.allows("IMAGE/JPEG"));
        assert!(upload.allows("application/pdf"));
        assert!(!upload.allows("application/zip"));
        assert!(!upload.allows("imagepng"));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_threshold() {
        let mut config = Config::default();
        config.inference.long_text_threshold = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("long_text_threshold"));
    }

    #[test]
    fn test_validate_zero_depth() {
        let mut config = Config::default();
        config.editor.max_depth = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_depth"));
    }

    #[test]
    fn test_validate_invalid_regex() {
        let mut config = Config::default();
        config.editor.key_pattern = "[invalid".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid regex"));
    }

    #[test]
    fn test_validate_empty_base_url() {
        let mut config = Config::default();
        config.upload.base_url = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_validate_zero_upload_size() {
        let mut config = Config::default();
        config.upload.max_size_bytes = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("media.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.media.database_path = Some(PathBuf::from("/custom/media.sqlite"));

        assert_eq!(config.database_path(), PathBuf::from("/custom/media.sqlite"));
    }

    #[test]
    fn test_media_dir_default() {
        let path = Config::default().media_dir();
        assert!(path.to_string_lossy().contains("uploads"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("contentfield"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[inference]\nlong_text_threshold = 120\n\n[editor]\nmax_depth = 3\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.inference.long_text_threshold, 120);
        assert_eq!(config.editor.max_depth, 3);
        assert_eq!(config.upload, UploadConfig::default());
    }

    #[test]
    fn test_load_reads_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[editor]
field_prefix = "col"

[upload]
base_url = "https://cdn.example.com"
allowed_mimetypes = ["image/png"]

[media]
database_path = "/srv/media.db"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.editor.field_prefix, "col");
        assert_eq!(config.editor.max_depth, 8);
        assert_eq!(config.upload.base_url, "https://cdn.example.com");
        assert_eq!(config.upload.allowed_mimetypes, vec!["image/png"]);
        assert_eq!(config.database_path(), PathBuf::from("/srv/media.db"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[editor]\nmax_depth = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("long_text_threshold"));
        assert!(json.contains("allowed_mimetypes"));
    }

    #[test]
    fn test_editor_config_deserialize_partial() {
        let json = r#"{"max_depth": 2}"#;
        let editor: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(editor.max_depth, 2);
        assert_eq!(editor.field_prefix, "field");
    }
}
