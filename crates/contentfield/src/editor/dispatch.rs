//! Field-type dispatch: from a type tag and a value to an editor widget.
//!
//! Rendering is headless. A [`Widget`] describes which input to show and
//! what it currently holds; a UI layer (or the CLI's tree printer) draws it.
//! Lists recurse through their schema, so a list of lists produces nested
//! [`Widget::ListEditor`]s down to the configured depth, below which the
//! value is shown in the raw JSON editor.
//!
//! Values whose shape does not match the declared type (typically after a
//! retype) are shown through the declared type's widget as well as they fit.
//! Stored data is never converted here.

use std::fmt;

use serde::Serialize;

use crate::content::infer::Inferencer;
use crate::content::schema::{FieldType, Schema};
use crate::content::section::ContentComponent;
use crate::content::value::{Button, FieldValue, Item, Media};
use crate::editor::raw::RawEditor;
use crate::editor::store::ListStore;
use crate::editor::EditorOptions;

/// Which kind of media a picker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still images.
    Image,
    /// Video files.
    Video,
}

/// A rendered editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "camelCase")]
pub enum Widget {
    /// Single-line text input.
    TextInput {
        /// Current text.
        value: String,
    },
    /// Rich/long text editor.
    RichText {
        /// Current text.
        value: String,
    },
    /// Image or video picker with upload.
    MediaPicker {
        /// Accepted media kind.
        kind: MediaKind,
        /// Current URL.
        url: String,
        /// Current caption.
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        /// Current alt text.
        #[serde(skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    /// Call-to-action editor.
    ButtonEditor {
        /// Label.
        text: String,
        /// Target.
        link: String,
        /// Style variant.
        #[serde(skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
    },
    /// Editor for a list of records.
    ListEditor {
        /// Schema driving the item editors.
        schema: Schema,
        /// One entry per item.
        items: Vec<ItemWidget>,
    },
    /// Raw JSON text editor.
    JsonEditor {
        /// Buffer text.
        source: String,
        /// Inline validation message.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// The editors for one list item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemWidget {
    /// Position in the list.
    pub index: usize,
    /// One editor per schema field, in schema order.
    pub fields: Vec<FieldWidget>,
}

/// The editor for one field of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWidget {
    /// Field key.
    pub key: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the item actually stores this key.
    pub present: bool,
    /// The editor.
    pub widget: Widget,
}

/// Picks and builds widgets.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    inferencer: Inferencer,
    max_depth: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::from_options(&EditorOptions::default())
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(inferencer: Inferencer, max_depth: usize) -> Self {
        Self {
            inferencer,
            max_depth,
        }
    }

    /// Create a dispatcher sharing an editor's options.
    #[must_use]
    pub fn from_options(options: &EditorOptions) -> Self {
        Self::new(options.inferencer, options.max_depth)
    }

    /// Render a value for a raw type tag. Unknown tags get the JSON editor.
    #[must_use]
    pub fn render(&self, tag: &str, value: &FieldValue) -> Widget {
        match tag.parse::<FieldType>() {
            Ok(field_type) => self.render_typed(field_type, value, None, 1),
            Err(_) => json_editor(&RawEditor::from_field_value(value)),
        }
    }

    /// Render one section component.
    #[must_use]
    pub fn render_component(&self, component: &ContentComponent) -> Widget {
        self.render(&component.kind, &component.value)
    }

    /// Render a list store with its own schema.
    #[must_use]
    pub fn render_store(&self, store: &ListStore) -> Widget {
        self.render_list(store.items(), store.schema(), store.depth())
    }

    /// Render a value of a known type.
    ///
    /// `item_schema` is used for list values; without it the schema is
    /// inferred from the value. `depth` is the nesting level a list value
    /// would have.
    #[must_use]
    pub fn render_typed(
        &self,
        field_type: FieldType,
        value: &FieldValue,
        item_schema: Option<&Schema>,
        depth: usize,
    ) -> Widget {
        match field_type {
            FieldType::Text => Widget::TextInput {
                value: text_of(value),
            },
            FieldType::LongText => Widget::RichText {
                value: text_of(value),
            },
            FieldType::Image => media_picker(MediaKind::Image, media_of(value)),
            FieldType::Video => media_picker(MediaKind::Video, media_of(value)),
            FieldType::Button => {
                let Button {
                    text,
                    link,
                    variant,
                } = button_of(value);
                Widget::ButtonEditor {
                    text,
                    link,
                    variant,
                }
            }
            FieldType::List => {
                if depth > self.max_depth {
                    return json_editor(&RawEditor::from_field_value(value));
                }
                let items = value.as_list().unwrap_or_default();
                match item_schema {
                    Some(schema) => self.render_list(items, schema, depth),
                    None => {
                        let schema = self.inferencer.infer_at(items, depth);
                        self.render_list(items, &schema, depth)
                    }
                }
            }
        }
    }

    fn render_list(&self, items: &[Item], schema: &Schema, depth: usize) -> Widget {
        let items = items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemWidget {
                index,
                fields: schema
                    .fields()
                    .iter()
                    .map(|field| {
                        let stored = item.get(&field.key);
                        let default;
                        let value = match stored {
                            Some(value) => value,
                            None => {
                                default = field.field_type.default_value();
                                &default
                            }
                        };
                        FieldWidget {
                            key: field.key.clone(),
                            field_type: field.field_type,
                            present: stored.is_some(),
                            widget: self.render_typed(
                                field.field_type,
                                value,
                                field.item_schema.as_ref(),
                                depth + 1,
                            ),
                        }
                    })
                    .collect(),
            })
            .collect();

        Widget::ListEditor {
            schema: schema.clone(),
            items,
        }
    }
}

fn json_editor(editor: &RawEditor) -> Widget {
    Widget::JsonEditor {
        source: editor.source().to_string(),
        error: editor.error().map(str::to_string),
    }
}

fn media_picker(kind: MediaKind, media: Media) -> Widget {
    Widget::MediaPicker {
        kind,
        url: media.url,
        caption: media.caption,
        alt: media.alt,
    }
}

fn text_of(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Media(media) => media.url.clone(),
        FieldValue::Button(button) => button.text.clone(),
        FieldValue::Raw(serde_json::Value::Null) => String::new(),
        FieldValue::Raw(raw) => raw.to_string(),
        FieldValue::List(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn raw_str(raw: &serde_json::Value, key: &str) -> Option<String> {
    raw.get(key).and_then(serde_json::Value::as_str).map(str::to_string)
}

fn media_of(value: &FieldValue) -> Media {
    match value {
        FieldValue::Media(media) => media.clone(),
        FieldValue::Text(url) => Media::new(url.clone()),
        FieldValue::Raw(raw) => Media {
            url: raw_str(raw, "url").unwrap_or_default(),
            caption: raw_str(raw, "caption"),
            alt: raw_str(raw, "alt"),
        },
        FieldValue::Button(_) | FieldValue::List(_) => Media::default(),
    }
}

fn button_of(value: &FieldValue) -> Button {
    match value {
        FieldValue::Button(button) => button.clone(),
        FieldValue::Text(text) => Button {
            text: text.clone(),
            ..Button::default()
        },
        FieldValue::Raw(raw) => {
            let fallback = Button::default();
            Button {
                text: raw_str(raw, "text").unwrap_or(fallback.text),
                link: raw_str(raw, "link").unwrap_or(fallback.link),
                variant: raw_str(raw, "variant"),
            }
        }
        FieldValue::Media(_) | FieldValue::List(_) => Button::default(),
    }
}

const PREVIEW_CHARS: usize = 48;

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

impl Widget {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Self::TextInput { value } => writeln!(f, "text input: {:?}", preview(value)),
            Self::RichText { value } => writeln!(f, "rich text: {:?}", preview(value)),
            Self::MediaPicker {
                kind,
                url,
                caption,
                alt,
            } => {
                let kind = match kind {
                    MediaKind::Image => "image",
                    MediaKind::Video => "video",
                };
                let url = if url.is_empty() { "(none)" } else { url.as_str() };
                write!(f, "{kind} picker: {url}")?;
                if let Some(caption) = caption {
                    write!(f, " caption={caption:?}")?;
                }
                if let Some(alt) = alt {
                    write!(f, " alt={alt:?}")?;
                }
                writeln!(f)
            }
            Self::ButtonEditor {
                text,
                link,
                variant,
            } => {
                write!(f, "button: {text:?} -> {link}")?;
                if let Some(variant) = variant {
                    write!(f, " [{variant}]")?;
                }
                writeln!(f)
            }
            Self::ListEditor { schema, items } => {
                writeln!(
                    f,
                    "list editor: {} fields, {} items",
                    schema.len(),
                    items.len()
                )?;
                for item in items {
                    writeln!(f, "{pad}  [{}]", item.index)?;
                    for field in &item.fields {
                        let marker = if field.present { "" } else { " (unset)" };
                        write!(
                            f,
                            "{pad}    {} <{}>{marker}: ",
                            field.key, field.field_type
                        )?;
                        field.widget.fmt_indented(f, indent + 2)?;
                    }
                }
                Ok(())
            }
            Self::JsonEditor { source, error } => {
                let compact = source.split_whitespace().collect::<Vec<_>>().join(" ");
                write!(f, "json editor: {}", preview(&compact))?;
                if let Some(error) = error {
                    write!(f, " ! {error}")?;
                }
                writeln!(f)
            }
        }
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
