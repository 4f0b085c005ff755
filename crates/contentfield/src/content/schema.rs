//! Field types and the per-list record schema.
//!
//! A [`Schema`] is an ordered list of [`Field`]s describing one level of a
//! list's items. It is never persisted on its own; it is inferred from data or
//! edited by hand for the length of an editing session. Schema methods only
//! touch the schema itself. Cascading changes into item data is the job of
//! [`ListStore`](crate::editor::ListStore).

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::content::value::{Button, FieldValue, Media};
use crate::error::{Error, Result};

/// Key pattern used when none is configured.
pub const DEFAULT_KEY_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_-]*$";

/// The declared type of a structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line or rich text.
    LongText,
    /// An image reference.
    Image,
    /// A video reference.
    Video,
    /// A call-to-action button.
    Button,
    /// A nested list of records.
    List,
}

impl FieldType {
    /// All field types, in the order editors offer them.
    pub const ALL: [FieldType; 6] = [
        Self::Text,
        Self::LongText,
        Self::Image,
        Self::Video,
        Self::Button,
        Self::List,
    ];

    /// The wire tag for this type.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "longText",
            Self::Image => "image",
            Self::Video => "video",
            Self::Button => "button",
            Self::List => "list",
        }
    }

    /// The empty value a freshly appended item gets for this type.
    #[must_use]
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Text | Self::LongText => FieldValue::Text(String::new()),
            Self::Image | Self::Video => FieldValue::Media(Media::default()),
            Self::Button => FieldValue::Button(Button::default()),
            Self::List => FieldValue::List(Vec::new()),
        }
    }

    /// Check whether this type holds a media reference.
    #[must_use]
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| Error::UnknownFieldType { tag: s.to_string() })
    }
}

/// A named, typed slot within a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Key under which items store this field's value.
    pub key: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Schema of the nested level, for list fields.
    #[serde(
        rename = "itemSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub item_schema: Option<Schema>,
}

impl Field {
    /// Create a field without a nested schema.
    #[must_use]
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            field_type,
            item_schema: None,
        }
    }

    /// Create a list field with a known nested schema.
    #[must_use]
    pub fn list(key: impl Into<String>, item_schema: Schema) -> Self {
        Self {
            key: key.into(),
            field_type: FieldType::List,
            item_schema: Some(item_schema),
        }
    }
}

/// Ordered set of fields describing one level of a list's items.
///
/// Deserialization goes through [`Schema::new`], so a saved schema with a
/// repeated or empty key is rejected at every nesting level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Field>", into = "Vec<Field>")]
pub struct Schema(Vec<Field>);

impl TryFrom<Vec<Field>> for Schema {
    type Error = Error;

    fn try_from(fields: Vec<Field>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<Schema> for Vec<Field> {
    fn from(schema: Schema) -> Self {
        schema.0
    }
}

impl Schema {
    /// Create a schema from fields.
    ///
    /// # Errors
    ///
    /// Returns an error if two fields share a key.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut schema = Self::default();
        for field in fields {
            schema.push(field)?;
        }
        Ok(schema)
    }

    /// The schema used when there is no data to infer from.
    #[must_use]
    pub fn default_schema() -> Self {
        Self(vec![
            Field::new("title", FieldType::Text),
            Field::new("description", FieldType::LongText),
        ])
    }

    /// The fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    /// Iterate over field keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|f| f.key.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.key == key)
    }

    /// Check whether a key is part of the schema.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.0
            .iter()
            .position(|f| f.key == key)
            .ok_or_else(|| Error::unknown_field(key))
    }

    /// Append a field.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or already present.
    pub fn push(&mut self, field: Field) -> Result<()> {
        if field.key.is_empty() {
            return Err(Error::invalid_field_key("", "key cannot be empty"));
        }
        if self.contains(&field.key) {
            return Err(Error::duplicate_field(field.key));
        }
        self.0.push(field);
        Ok(())
    }

    /// Generate an unused placeholder key such as `field_3`.
    ///
    /// Numbering starts at the position the new field would take.
    #[must_use]
    pub fn placeholder_key(&self, prefix: &str) -> String {
        (self.0.len() + 1..)
            .map(|n| format!("{prefix}_{n}"))
            .find(|key| !self.contains(key))
            .unwrap_or_else(|| format!("{prefix}_new"))
    }

    /// Rename a field in place, keeping its position and type.
    ///
    /// # Errors
    ///
    /// Returns an error if `old` is unknown, `new` is empty, or `new` is
    /// already taken by another field.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.position(old)?;
        if old == new {
            return Ok(());
        }
        if new.is_empty() {
            return Err(Error::invalid_field_key(new, "key cannot be empty"));
        }
        if self.contains(new) {
            return Err(Error::duplicate_field(new));
        }
        self.0[index].key = new.to_string();
        Ok(())
    }

    /// Remove a field, returning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn remove(&mut self, key: &str) -> Result<Field> {
        let index = self.position(key)?;
        Ok(self.0.remove(index))
    }

    /// Change a field's type. A nested schema is dropped when the field stops
    /// being a list.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn retype(&mut self, key: &str, field_type: FieldType) -> Result<()> {
        let index = self.position(key)?;
        let field = &mut self.0[index];
        field.field_type = field_type;
        if field_type != FieldType::List {
            field.item_schema = None;
        }
        Ok(())
    }

    /// Replace the nested schema of a list field.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the field is not a list.
    pub fn set_item_schema(&mut self, key: &str, item_schema: Schema) -> Result<()> {
        let index = self.position(key)?;
        let field = &mut self.0[index];
        if field.field_type != FieldType::List {
            return Err(Error::NotAList {
                key: key.to_string(),
            });
        }
        field.item_schema = Some(item_schema);
        Ok(())
    }
}

/// Validates field keys against the configured pattern.
///
/// The default validator applies the rule [`DEFAULT_KEY_PATTERN`] spells out
/// without compiling it; a configured pattern goes through [`Regex`].
#[derive(Debug, Clone, Default)]
pub struct KeyValidator {
    pattern: Option<Regex>,
}

impl KeyValidator {
    /// Create a validator from a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::ConfigValidation {
            message: format!("invalid regex pattern: {e}"),
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Check a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or does not match the pattern.
    pub fn validate(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::invalid_field_key(key, "key cannot be empty"));
        }
        let matches = match &self.pattern {
            Some(pattern) => pattern.is_match(key),
            None => is_default_key(key),
        };
        if !matches {
            let pattern = self
                .pattern
                .as_ref()
                .map_or(DEFAULT_KEY_PATTERN, Regex::as_str);
            return Err(Error::invalid_field_key(key, format!("must match {pattern}")));
        }
        Ok(())
    }
}

/// `^[A-Za-z_][A-Za-z0-9_-]*$`
fn is_default_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            Field::new("title", FieldType::Text),
            Field::new("image", FieldType::Image),
        ])
        .unwrap()
    }

    #[test]
    fn test_field_type_tags() {
        for field_type in FieldType::ALL {
            assert_eq!(field_type.tag().parse::<FieldType>().unwrap(), field_type);
        }
        assert_eq!(FieldType::LongText.to_string(), "longText");
        assert!("custom".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_type_serde_uses_tags() {
        let json = serde_json::to_string(&FieldType::LongText).unwrap();
        assert_eq!(json, "\"longText\"");
        let parsed: FieldType = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, FieldType::Video);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(FieldType::Text.default_value(), FieldValue::text(""));
        assert_eq!(FieldType::LongText.default_value(), FieldValue::text(""));
        assert_eq!(FieldType::Image.default_value(), FieldValue::media(""));
        assert_eq!(FieldType::Video.default_value(), FieldValue::media(""));
        assert_eq!(
            FieldType::Button.default_value(),
            FieldValue::button("Button", "#")
        );
        assert_eq!(FieldType::List.default_value(), FieldValue::List(Vec::new()));
    }

    #[test]
    fn test_default_schema() {
        let schema = Schema::default_schema();
        let keys: Vec<_> = schema.keys().collect();
        assert_eq!(keys, vec!["title", "description"]);
        assert_eq!(schema.get("description").unwrap().field_type, FieldType::LongText);
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = Schema::new(vec![
            Field::new("title", FieldType::Text),
            Field::new("title", FieldType::LongText),
        ]);
        assert!(matches!(result, Err(Error::DuplicateField { .. })));
    }

    #[test]
    fn test_deserialize_rejects_duplicate_keys() {
        let json = r#"[{"key": "a", "type": "text"}, {"key": "a", "type": "image"}]"#;
        let err = serde_json::from_str::<Schema>(json).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_deserialize_rejects_duplicate_nested_keys() {
        let json = r#"[{"key": "slides", "type": "list", "itemSchema": [
            {"key": "caption", "type": "text"},
            {"key": "caption", "type": "longText"}
        ]}]"#;
        assert!(serde_json::from_str::<Schema>(json).is_err());
    }

    #[test]
    fn test_serialized_form_is_a_field_array() {
        let json = serde_json::to_value(sample_schema()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"key": "title", "type": "text"},
                {"key": "image", "type": "image"}
            ])
        );
        let again: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(again, sample_schema());
    }

    #[test]
    fn test_placeholder_key_skips_taken() {
        let mut schema = sample_schema();
        assert_eq!(schema.placeholder_key("field"), "field_3");

        schema.push(Field::new("field_3", FieldType::Text)).unwrap();
        assert_eq!(schema.placeholder_key("field"), "field_4");

        schema.push(Field::new("field_5", FieldType::Text)).unwrap();
        assert_eq!(schema.placeholder_key("field"), "field_6");
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut schema = sample_schema();
        schema.rename("title", "heading").unwrap();
        let keys: Vec<_> = schema.keys().collect();
        assert_eq!(keys, vec!["heading", "image"]);
    }

    #[test]
    fn test_rename_errors() {
        let mut schema = sample_schema();
        assert!(matches!(
            schema.rename("missing", "x"),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            schema.rename("title", "image"),
            Err(Error::DuplicateField { .. })
        ));
        assert!(schema.rename("title", "").is_err());
        assert!(schema.rename("title", "title").is_ok());
    }

    #[test]
    fn test_remove_and_retype() {
        let mut schema = sample_schema();
        schema.retype("image", FieldType::Video).unwrap();
        assert_eq!(schema.get("image").unwrap().field_type, FieldType::Video);

        let removed = schema.remove("title").unwrap();
        assert_eq!(removed.key, "title");
        assert_eq!(schema.len(), 1);
        assert!(schema.remove("title").is_err());
    }

    #[test]
    fn test_retype_drops_item_schema() {
        let mut schema =
            Schema::new(vec![Field::list("slides", Schema::default_schema())]).unwrap();
        schema.retype("slides", FieldType::Text).unwrap();
        assert!(schema.get("slides").unwrap().item_schema.is_none());
    }

    #[test]
    fn test_set_item_schema_requires_list() {
        let mut schema = sample_schema();
        assert!(matches!(
            schema.set_item_schema("title", Schema::default_schema()),
            Err(Error::NotAList { .. })
        ));
    }

    #[test]
    fn test_schema_json_shape() {
        let schema = Schema::new(vec![
            Field::new("title", FieldType::Text),
            Field::list("slides", Schema::default_schema()),
        ])
        .unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json[0], serde_json::json!({"key": "title", "type": "text"}));
        assert_eq!(json[1]["type"], "list");
        assert_eq!(json[1]["itemSchema"][1]["type"], "longText");

        let parsed: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_key_validator() {
        let validator = KeyValidator::default();
        assert!(validator.validate("title").is_ok());
        assert!(validator.validate("hero_image-2").is_ok());
        assert!(validator.validate("").is_err());
        assert!(validator.validate("2fast").is_err());
        assert!(validator.validate("has space").is_err());
    }

    #[test]
    fn test_default_validator_agrees_with_default_pattern() {
        let compiled = KeyValidator::new(DEFAULT_KEY_PATTERN).unwrap();
        let builtin = KeyValidator::default();
        for key in ["a", "_x", "Title2", "kebab-case", "-lead", "9", "dot.ted", "é", "a b", ""] {
            assert_eq!(
                builtin.validate(key).is_ok(),
                compiled.validate(key).is_ok(),
                "disagreement on {key:?}"
            );
        }
    }

    #[test]
    fn test_key_validator_rejects_bad_pattern() {
        assert!(KeyValidator::new("[oops").is_err());
    }
}
