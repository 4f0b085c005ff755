//! Best-effort schema inference from existing list data.
//!
//! Only the first item is inspected. The result is a guess the user can
//! correct by hand, so inference never fails: anything ambiguous becomes
//! short text, and data with nothing to inspect gets
//! [`Schema::default_schema`].

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::content::schema::{Field, FieldType, Schema};
use crate::content::value::{FieldValue, Item};

/// Classifies list data into a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inferencer {
    long_text_threshold: usize,
    max_depth: usize,
}

impl Default for Inferencer {
    fn default() -> Self {
        Self {
            long_text_threshold: 60,
            max_depth: 8,
        }
    }
}

impl Inferencer {
    /// Create an inferencer.
    ///
    /// Strings with more than `long_text_threshold` characters become long
    /// text. Nested schemas are inferred down to `max_depth` levels.
    #[must_use]
    pub fn new(long_text_threshold: usize, max_depth: usize) -> Self {
        Self {
            long_text_threshold,
            max_depth,
        }
    }

    /// Create an inferencer from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.inference.long_text_threshold,
            config.editor.max_depth,
        )
    }

    /// Infer the schema of a list value.
    #[must_use]
    pub fn infer(&self, items: &[Item]) -> Schema {
        self.infer_at(items, 1)
    }

    /// Infer the schema of a list value that sits `depth` levels deep.
    #[must_use]
    pub fn infer_at(&self, items: &[Item], depth: usize) -> Schema {
        let Some(first) = items.first() else {
            debug!(depth, "Empty list, using default schema");
            return Schema::default_schema();
        };
        if first.is_empty() {
            warn!(depth, "First item has no keys, using default schema");
            return Schema::default_schema();
        }

        let fields = first
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| self.infer_field(key, value, depth))
            .collect();

        // Non-empty and unique, so this cannot fail
        Schema::new(fields).unwrap_or_else(|_| Schema::default_schema())
    }

    fn infer_field(&self, key: &str, value: &FieldValue, depth: usize) -> Field {
        let field_type = self.classify(key, value);
        let item_schema = match value {
            FieldValue::List(nested) if depth < self.max_depth => {
                Some(self.infer_at(nested, depth + 1))
            }
            _ => None,
        };
        Field {
            key: key.to_string(),
            field_type,
            item_schema,
        }
    }

    /// Guess the type of one value stored under `key`.
    #[must_use]
    pub fn classify(&self, key: &str, value: &FieldValue) -> FieldType {
        match value {
            FieldValue::Text(text) => self.classify_text(text),
            FieldValue::List(_) => FieldType::List,
            FieldValue::Media(_) => media_type_for(key),
            FieldValue::Button(_) => FieldType::Button,
            FieldValue::Raw(raw) => self.classify_raw(key, raw),
        }
    }

    fn classify_text(&self, text: &str) -> FieldType {
        if text.chars().count() > self.long_text_threshold {
            FieldType::LongText
        } else {
            FieldType::Text
        }
    }

    fn classify_raw(&self, key: &str, raw: &Value) -> FieldType {
        match raw {
            Value::String(text) => self.classify_text(text),
            Value::Array(_) => FieldType::List,
            Value::Object(map) if map.contains_key("url") => media_type_for(key),
            Value::Object(map) if map.contains_key("link") => FieldType::Button,
            _ => FieldType::Text,
        }
    }
}

fn media_type_for(key: &str) -> FieldType {
    if key.to_ascii_lowercase().contains("video") {
        FieldType::Video
    } else {
        FieldType::Image
    }
}
