//! Raw JSON editor for custom and unrecognized content types.

use serde_json::Value;
use tracing::warn;

use crate::content::value::FieldValue;

/// A text buffer of JSON that only commits when it parses.
///
/// While the buffer holds invalid JSON, [`RawEditor::value`] keeps returning
/// the last valid value and [`RawEditor::error`] carries the message to show
/// inline.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEditor {
    source: String,
    value: Value,
    error: Option<String>,
}

impl RawEditor {
    /// Start editing a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        let source = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        Self {
            source,
            value,
            error: None,
        }
    }

    /// Start editing a field value as JSON.
    #[must_use]
    pub fn from_field_value(value: &FieldValue) -> Self {
        Self::new(serde_json::to_value(value).unwrap_or(Value::Null))
    }

    /// Replace the buffer text. Returns `true` if it parsed and was committed.
    pub fn set_source(&mut self, source: impl Into<String>) -> bool {
        self.source = source.into();
        match serde_json::from_str::<Value>(&self.source) {
            Ok(value) => {
                self.value = value;
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Invalid JSON in raw editor, keeping last valid value");
                self.error = Some(format!("Invalid JSON: {e}"));
                false
            }
        }
    }

    /// The current buffer text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The last valid value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The inline validation message, if the buffer is invalid.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check whether the buffer currently parses.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// The last valid value as a field value.
    #[must_use]
    pub fn to_field_value(&self) -> FieldValue {
        FieldValue::from_json(self.value.clone())
    }
}
