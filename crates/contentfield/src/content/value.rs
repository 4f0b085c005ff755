//! The recursive value tree behind every content field.
//!
//! A [`FieldValue`] is what a form stores for one field: a string, a media
//! reference, a call-to-action button, a nested list of [`Item`]s, or any
//! other JSON shape kept verbatim as [`FieldValue::Raw`].
//!
//! JSON (de)serialization is untagged and lossless. Media and button objects
//! only match when they carry exactly their known keys; anything else falls
//! through to `Raw` so unknown data survives an edit untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A media reference (image or video).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Media {
    /// Where the file is served from.
    pub url: String,
    /// Optional caption shown under the media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Optional alternative text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Media {
    /// Create a media reference with only a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: None,
            alt: None,
        }
    }
}

/// A call-to-action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Button {
    /// Button label.
    pub text: String,
    /// Target of the button.
    pub link: String,
    /// Optional style variant (e.g. `primary`, `outline`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Button {
    /// Create a button without a variant.
    #[must_use]
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
            variant: None,
        }
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new("Button", "#")
    }
}

/// The value stored for one content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain or long text.
    Text(String),
    /// A nested list of records.
    List(Vec<Item>),
    /// A call-to-action button.
    Button(Button),
    /// An image or video reference.
    Media(Media),
    /// Any other JSON shape.
    Raw(serde_json::Value),
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Raw(serde_json::Value::Null)
    }
}

impl FieldValue {
    /// Create a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a media value with only a URL.
    #[must_use]
    pub fn media(url: impl Into<String>) -> Self {
        Self::Media(Media::new(url))
    }

    /// Create a button value.
    #[must_use]
    pub fn button(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self::Button(Button::new(text, link))
    }

    /// Classify an arbitrary JSON value into the matching variant.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Self::Raw(value))
    }

    /// Convert back to plain JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Short name of the shape, for log and error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Button(_) => "button",
            Self::Media(_) => "media",
            Self::Raw(_) => "raw",
        }
    }

    /// Get the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the nested items, if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the media reference, if this is a media value.
    #[must_use]
    pub fn as_media(&self) -> Option<&Media> {
        match self {
            Self::Media(media) => Some(media),
            _ => None,
        }
    }

    /// Get the button, if this is a button value.
    #[must_use]
    pub fn as_button(&self) -> Option<&Button> {
        match self {
            Self::Button(button) => Some(button),
            _ => None,
        }
    }

    /// Depth of list nesting below this value (0 for leaves).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::List(items) => {
                1 + items
                    .iter()
                    .flat_map(Item::values)
                    .map(FieldValue::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Media> for FieldValue {
    fn from(value: Media) -> Self {
        Self::Media(value)
    }
}

impl From<Button> for FieldValue {
    fn from(value: Button) -> Self {
        Self::Button(value)
    }
}

impl From<Vec<Item>> for FieldValue {
    fn from(value: Vec<Item>) -> Self {
        Self::List(value)
    }
}

/// One record of a list value, keyed by field key.
///
/// Keys keep the order they were read or inserted in, so a saved list comes
/// back out the way it went in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(IndexMap<String, FieldValue>);

impl Item {
    /// Create an empty item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Get a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.0.get_mut(key)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a key entirely. Later keys keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.shift_remove(key)
    }

    /// Move the value under `old` to `new`, in the same position.
    /// Returns `false` if `old` was absent.
    ///
    /// A value already stored under `new` is replaced; callers that must not
    /// lose it check [`Item::contains_key`] first.
    pub fn rename_key(&mut self, old: &str, new: &str) -> bool {
        match self.0.shift_remove_full(old) {
            Some((index, _, value)) => {
                self.0.shift_remove(new);
                let index = index.min(self.0.len());
                self.0.shift_insert(index, new.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Check whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over values.
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.0.values()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|k, _| keep(k));
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the item has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Item {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Parse a list value from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a JSON array of objects.
pub fn parse_list(json: &str) -> Result<Vec<Item>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_shapes() {
        assert_eq!(FieldValue::from_json(json!("hi")), FieldValue::text("hi"));
        assert_eq!(
            FieldValue::from_json(json!({"url": "/a.png"})),
            FieldValue::media("/a.png")
        );
        assert_eq!(
            FieldValue::from_json(json!({"text": "Go", "link": "/go"})),
            FieldValue::button("Go", "/go")
        );
        assert!(matches!(
            FieldValue::from_json(json!([{"title": "x"}])),
            FieldValue::List(_)
        ));
        assert_eq!(FieldValue::from_json(json!(42)), FieldValue::Raw(json!(42)));
    }

    #[test]
    fn test_extra_keys_fall_through_to_raw() {
        let value = json!({"url": "/a.png", "width": 300});
        assert_eq!(FieldValue::from_json(value.clone()), FieldValue::Raw(value));

        let value = json!({"url": "/a", "link": "/b"});
        assert_eq!(FieldValue::from_json(value.clone()), FieldValue::Raw(value));
    }

    #[test]
    fn test_array_of_scalars_is_raw() {
        let value = json!([1, 2, 3]);
        assert_eq!(FieldValue::from_json(value.clone()), FieldValue::Raw(value));
    }

    #[test]
    fn test_media_with_caption() {
        let value = FieldValue::from_json(json!({"url": "/v.mp4", "caption": "Intro"}));
        let media = value.as_media().unwrap();
        assert_eq!(media.url, "/v.mp4");
        assert_eq!(media.caption.as_deref(), Some("Intro"));
        assert!(media.alt.is_none());
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let source = r#"[
            {"title": "First", "hero": {"url": "/1.png", "alt": "one"}},
            {"title": "Second", "cta": {"text": "Buy", "link": "/buy", "variant": "primary"}},
            {"title": "Third", "slides": [{"caption": "a"}, {"caption": "b"}], "count": 3}
        ]"#;
        let items = parse_list(source).unwrap();
        let text = serde_json::to_string(&items).unwrap();
        let reparsed = parse_list(&text).unwrap();

        assert_eq!(items, reparsed);
        assert_eq!(reparsed[0].get("title"), Some(&FieldValue::text("First")));
        assert_eq!(reparsed[2].get("title"), Some(&FieldValue::text("Third")));
        assert_eq!(
            reparsed[2].keys().collect::<Vec<_>>(),
            vec!["title", "slides", "count"]
        );
    }

    #[test]
    fn test_serialization_keeps_key_order() {
        let source = r#"[{"title":"Hello","image":{"url":""},"extra":{"z":1,"a":2}}]"#;
        let items = parse_list(source).unwrap();
        assert_eq!(serde_json::to_string(&items).unwrap(), source);
    }

    #[test]
    fn test_item_rename_key() {
        let mut item: Item = [("title", "Hello")].into_iter().collect();
        assert!(item.rename_key("title", "heading"));
        assert!(!item.contains_key("title"));
        assert_eq!(item.get("heading"), Some(&FieldValue::text("Hello")));
        assert!(!item.rename_key("missing", "other"));
    }

    #[test]
    fn test_item_rename_key_keeps_position() {
        let mut item: Item = [("title", "T"), ("body", "B"), ("note", "N")]
            .into_iter()
            .collect();
        assert!(item.rename_key("body", "summary"));
        assert_eq!(item.keys().collect::<Vec<_>>(), vec!["title", "summary", "note"]);

        assert!(item.remove("title").is_some());
        assert_eq!(item.keys().collect::<Vec<_>>(), vec!["summary", "note"]);
    }

    #[test]
    fn test_depth() {
        assert_eq!(FieldValue::text("x").depth(), 0);
        let inner: Item = [("a", "b")].into_iter().collect();
        let middle: Item = [("inner", FieldValue::List(vec![inner]))].into_iter().collect();
        assert_eq!(FieldValue::List(vec![middle]).depth(), 2);
        assert_eq!(FieldValue::List(Vec::new()).depth(), 1);
    }

    #[test]
    fn test_button_default() {
        let button = Button::default();
        assert_eq!(button.text, "Button");
        assert_eq!(button.link, "#");
        let json = serde_json::to_value(FieldValue::Button(button)).unwrap();
        assert_eq!(json, json!({"text": "Button", "link": "#"}));
    }

    #[test]
    fn test_parse_list_rejects_non_array() {
        assert!(parse_list(r#"{"title": "x"}"#).is_err());
    }
}
