//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and how a
//! [`ListOp`] is carried out against a store.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand, ValueEnum};

use crate::content::{FieldType, FieldValue};
use crate::editor::ListStore;
use crate::error::Result;
use crate::upload::UploadKind;

/// Infer command arguments.
#[derive(Debug, Args)]
pub struct InferCommand {
    /// List value file (bare array or `{schema, items}`)
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Render command arguments.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Section file with `{name, components}`
    pub section: PathBuf,

    /// Only render this component
    #[arg(long)]
    pub component: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// JSON document to validate
    pub file: PathBuf,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// List value file to edit in place
    pub file: PathBuf,

    /// Print the result instead of writing it back
    #[arg(long)]
    pub dry_run: bool,

    /// Descend into a nested list first (repeatable, outermost first)
    #[arg(long, value_name = "INDEX:KEY")]
    pub at: Vec<NestedStep>,

    /// The edit to apply
    #[command(subcommand)]
    pub op: ListOp,
}

/// One step into a nested list: item index and list field key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedStep {
    /// Item index in the enclosing list.
    pub index: usize,
    /// Key of the list field on that item.
    pub key: String,
}

impl FromStr for NestedStep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (index, key) = s
            .split_once(':')
            .ok_or_else(|| format!("expected INDEX:KEY, got '{s}'"))?;
        let index = index
            .parse()
            .map_err(|_| format!("invalid item index '{index}'"))?;
        if key.is_empty() {
            return Err("field key is empty".to_string());
        }
        Ok(Self {
            index,
            key: key.to_string(),
        })
    }
}

/// Edits applicable to a list value.
#[derive(Debug, Clone, Subcommand)]
pub enum ListOp {
    /// Append an item with default values
    Append,

    /// Remove the item at INDEX
    Remove {
        /// Item index
        index: usize,
    },

    /// Move an item
    Move {
        /// Current index
        from: usize,
        /// New index
        to: usize,
    },

    /// Set one field of one item
    Set {
        /// Item index
        index: usize,
        /// Field key
        key: String,
        /// New value (a URL for media fields)
        value: String,
        /// Parse VALUE as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a field to the schema
    AddField {
        /// Field key (a placeholder is generated when omitted)
        key: Option<String>,
        /// Field type
        #[arg(short = 't', long = "type", value_enum, default_value = "text")]
        field_type: FieldTypeArg,
    },

    /// Rename a field in the schema and every item
    RenameField {
        /// Current key
        old: String,
        /// New key
        new: String,
    },

    /// Remove a field from the schema and every item
    RemoveField {
        /// Field key
        key: String,
    },

    /// Change a field's type
    RetypeField {
        /// Field key
        key: String,
        /// New type
        #[arg(value_enum)]
        field_type: FieldTypeArg,
    },

    /// Drop item keys that are not in the schema
    Prune,
}

impl ListOp {
    /// Apply the edit, returning a one-line summary.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the edit is rejected.
    pub fn apply(&self, store: &mut ListStore) -> Result<String> {
        match self {
            Self::Append => {
                let index = store.append_item();
                Ok(format!("Appended item {index}"))
            }
            Self::Remove { index } => {
                store.remove_item(*index)?;
                Ok(format!("Removed item {index}"))
            }
            Self::Move { from, to } => {
                store.move_item(*from, *to)?;
                Ok(format!("Moved item {from} to {to}"))
            }
            Self::Set {
                index,
                key,
                value,
                json,
            } => {
                let is_media = store
                    .schema()
                    .get(key)
                    .is_some_and(|field| field.field_type.is_media());
                if *json {
                    let parsed = FieldValue::from_json(serde_json::from_str(value)?);
                    store.update_field(*index, key, parsed)?;
                } else if is_media {
                    store.set_media_url(*index, key, value.as_str())?;
                } else {
                    store.update_field(*index, key, value.as_str())?;
                }
                Ok(format!("Set {key} on item {index}"))
            }
            Self::AddField {
                key: Some(key),
                field_type,
            } => {
                store.add_field_with(key, (*field_type).into())?;
                Ok(format!("Added field {key}"))
            }
            Self::AddField {
                key: None,
                field_type,
            } => {
                let key = store.add_field()?;
                let field_type = FieldType::from(*field_type);
                if field_type != FieldType::Text {
                    store.retype_field(&key, field_type)?;
                }
                Ok(format!("Added field {key}"))
            }
            Self::RenameField { old, new } => {
                let changed = store.rename_field(old, new)?;
                Ok(format!("Renamed {old} to {new} ({changed} items changed)"))
            }
            Self::RemoveField { key } => {
                let changed = store.remove_field(key)?;
                Ok(format!("Removed field {key} ({changed} items changed)"))
            }
            Self::RetypeField { key, field_type } => {
                let field_type = FieldType::from(*field_type);
                store.retype_field(key, field_type)?;
                Ok(format!("Changed {key} to {field_type}"))
            }
            Self::Prune => {
                let removed = store.prune_orphans();
                Ok(format!("Removed {removed} orphaned values"))
            }
        }
    }
}

/// Apply `op` to the list reached by following `path` from `store`.
///
/// # Errors
///
/// Returns an error if a step does not lead to a list or the edit is
/// rejected. Nothing changes in that case.
pub fn apply_at(store: &mut ListStore, path: &[NestedStep], op: &ListOp) -> Result<String> {
    match path.split_first() {
        None => op.apply(store),
        Some((step, rest)) => store.with_nested(step.index, &step.key, |nested| {
            apply_at(nested, rest, op)
        }),
    }
}

/// Upload command arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// File to upload
    pub file: PathBuf,

    /// MIME type (detected from content when omitted)
    #[arg(long)]
    pub mimetype: Option<String>,

    /// List value file to attach the upload to
    #[arg(long, requires_all = ["item", "key"])]
    pub into: Option<PathBuf>,

    /// Item index in the list
    #[arg(long, requires = "into")]
    pub item: Option<usize>,

    /// Media field key on the item
    #[arg(long, requires = "into")]
    pub key: Option<String>,
}

/// Media library commands.
#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    /// List recorded files
    List {
        /// Only files of this kind
        #[arg(short, long, value_enum)]
        kind: Option<UploadKindArg>,

        /// Search original file names
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show library statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a file from the library
    Delete {
        /// Record id
        id: i64,

        /// Leave the stored file on disk
        #[arg(long)]
        keep_file: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

/// Field type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldTypeArg {
    /// Single-line text
    Text,
    /// Rich text
    #[value(alias = "longText")]
    LongText,
    /// Image
    Image,
    /// Video
    Video,
    /// Button
    Button,
    /// Nested list
    List,
}

impl From<FieldTypeArg> for FieldType {
    fn from(arg: FieldTypeArg) -> Self {
        match arg {
            FieldTypeArg::Text => Self::Text,
            FieldTypeArg::LongText => Self::LongText,
            FieldTypeArg::Image => Self::Image,
            FieldTypeArg::Video => Self::Video,
            FieldTypeArg::Button => Self::Button,
            FieldTypeArg::List => Self::List,
        }
    }
}

/// Upload kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadKindArg {
    /// Images
    Image,
    /// Videos
    Video,
    /// Everything else
    Document,
}

impl From<UploadKindArg> for UploadKind {
    fn from(arg: UploadKindArg) -> Self {
        match arg {
            UploadKindArg::Image => Self::Image,
            UploadKindArg::Video => Self::Video,
            UploadKindArg::Document => Self::Document,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Plain,
    /// JSON
    Json,
}
