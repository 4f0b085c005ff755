//! `contentfield` - Schema-driven editing of dynamic content values
//!
//! This library provides the pieces behind a headless CMS dashboard's value
//! editors: a type-tag dispatcher, a schema inferencer for list values, a
//! list item store whose schema edits cascade into the data, and an upload
//! path for media fields.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod content;
pub mod editor;
pub mod error;
pub mod logging;
pub mod media;
pub mod upload;

pub use config::Config;
pub use content::{Field, FieldType, FieldValue, Inferencer, Item, ListDocument, Schema, Section};
pub use editor::{Dispatcher, EditSession, EditorOptions, ListStore, Widget};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use media::{MediaLibrary, MediaRecord, MediaStats};
pub use upload::{LocalUploader, Notice, UploadFile, UploadedFile, Uploader};
