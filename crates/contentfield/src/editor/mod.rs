//! Headless editors for content values.
//!
//! - [`store`]: the list item store, with schema edits cascading into items
//! - [`dispatch`]: picking a widget for a type tag, recursively for lists
//! - [`raw`]: the parse-validated JSON fallback editor
//! - [`session`]: binding a store to the host form's change callback

pub mod dispatch;
pub mod raw;
pub mod session;
pub mod store;

pub use dispatch::{Dispatcher, FieldWidget, ItemWidget, MediaKind, Widget};
pub use raw::RawEditor;
pub use session::{ChangeSink, EditSession};
pub use store::ListStore;

use crate::config::Config;
use crate::content::{Inferencer, KeyValidator};
use crate::error::Result;

/// Settings shared by every editor in a session.
#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// Schema inference settings.
    pub inferencer: Inferencer,
    /// Field key validation.
    pub keys: KeyValidator,
    /// Prefix for placeholder keys of newly added fields.
    pub field_prefix: String,
    /// Deepest list nesting level that can be edited.
    pub max_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            inferencer: Inferencer::default(),
            keys: KeyValidator::default(),
            field_prefix: "field".to_string(),
            max_depth: 8,
        }
    }
}

impl EditorOptions {
    /// Build editor options from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key pattern is not a valid regex.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            inferencer: Inferencer::from_config(config),
            keys: KeyValidator::new(&config.editor.key_pattern)?,
            field_prefix: config.editor.field_prefix.clone(),
            max_depth: config.editor.max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_default_config() {
        let options = EditorOptions::from_config(&Config::default()).unwrap();
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.field_prefix, "field");
        assert!(options.keys.validate("title").is_ok());
    }

    #[test]
    fn test_options_from_config_with_bad_pattern() {
        let mut config = Config::default();
        config.editor.key_pattern = "(".to_string();
        assert!(EditorOptions::from_config(&config).is_err());
    }
}
