//! Content data model.
//!
//! - [`value`]: the recursive [`FieldValue`] tree and list [`Item`]s
//! - [`schema`]: [`FieldType`], [`Field`] and [`Schema`]
//! - [`infer`]: guessing a schema from existing data
//! - [`section`]: sections and list documents on disk

pub mod infer;
pub mod schema;
pub mod section;
pub mod value;

pub use infer::Inferencer;
pub use schema::{Field, FieldType, KeyValidator, Schema};
pub use section::{ContentComponent, ListDocument, Section};
pub use value::{parse_list, Button, FieldValue, Item, Media};
