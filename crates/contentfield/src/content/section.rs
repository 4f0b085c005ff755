//! Content sections and list documents as they are stored on disk.
//!
//! A [`Section`] is a named, reusable block of page content made of typed
//! components (`{name, type, value}`). The `type` is kept as the raw tag so
//! unknown or `custom` components survive a load/save cycle.
//!
//! A [`ListDocument`] is the on-disk form of one list value. It is either a
//! bare JSON array of items or an object carrying a hand-edited schema next
//! to the items.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::schema::{FieldType, Schema};
use crate::content::value::{FieldValue, Item};
use crate::error::{Error, Result};

/// One typed component of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentComponent {
    /// Component name, unique within its section.
    pub name: String,
    /// Type tag (`text`, `longText`, `image`, `video`, `button`, `list`, or anything else).
    #[serde(rename = "type")]
    pub kind: String,
    /// Current value.
    #[serde(default)]
    pub value: FieldValue,
}

impl ContentComponent {
    /// Create a component.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// The structured type, or `None` for custom/unknown tags.
    #[must_use]
    pub fn field_type(&self) -> Option<FieldType> {
        self.kind.parse().ok()
    }
}

/// A named section of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section name.
    pub name: String,
    /// Components, in display order.
    #[serde(default)]
    pub components: Vec<ContentComponent>,
}

impl Section {
    /// Parse a section from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid section.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a section from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = read_file(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Look up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ContentComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Look up a component by name for editing.
    pub fn component_mut(&mut self, name: &str) -> Option<&mut ContentComponent> {
        self.components.iter_mut().find(|c| c.name == name)
    }
}

/// The on-disk form of a list value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDocument {
    /// Hand-edited schema, if one was saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// The items.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ListDocument {
    /// Parse either a bare item array or a `{schema, items}` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is neither shape.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Array(_) => Ok(Self {
                schema: None,
                items: serde_json::from_str(json)?,
            }),
            serde_json::Value::Object(_) => Ok(serde_json::from_str(json)?),
            other => Err(Error::invalid_document(format!(
                "expected an array of items or an object with \"items\", found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Load a list document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_file(path)?;
        let document = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            items = document.items.len(),
            has_schema = document.schema.is_some(),
            "Loaded list document"
        );
        Ok(document)
    }

    /// Serialize back to pretty JSON. A document without a schema is written
    /// as a bare array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        if self.schema.is_some() {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string_pretty(&self.items)?)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
