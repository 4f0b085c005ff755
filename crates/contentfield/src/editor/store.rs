//! The list item store.
//!
//! A [`ListStore`] owns one list value together with its current [`Schema`].
//! Item operations replace one item (or one item field) at a time. Schema
//! operations cascade into the data: a rename moves every item's value to the
//! new key, a removal deletes the key from every item.
//!
//! Nested lists are edited through [`ListStore::with_nested`], which opens
//! one item's nested list as a store of its own. A nested list field has a
//! single schema shared by every parent item, so renames and removals made at
//! a nested level are replayed over the same field of every sibling item.

use tracing::debug;

use crate::content::schema::{Field, FieldType, Schema};
use crate::content::section::ListDocument;
use crate::content::value::{FieldValue, Item, Media};
use crate::editor::EditorOptions;
use crate::error::{Error, Result};

/// A data-moving schema change, kept so nested edits can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyChange {
    Renamed { old: String, new: String },
    Removed { key: String },
}

/// A [`KeyChange`] plus the list-field path (relative to the store that
/// recorded it) of the level it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cascade {
    path: Vec<String>,
    change: KeyChange,
}

/// An editable list value with its schema.
#[derive(Debug, Clone)]
pub struct ListStore {
    schema: Schema,
    items: Vec<Item>,
    options: EditorOptions,
    depth: usize,
    cascades: Vec<Cascade>,
}

impl ListStore {
    /// Create a store with an explicit schema.
    #[must_use]
    pub fn new(schema: Schema, items: Vec<Item>, options: EditorOptions) -> Self {
        Self::at_depth(schema, items, options, 1)
    }

    fn at_depth(schema: Schema, items: Vec<Item>, options: EditorOptions, depth: usize) -> Self {
        Self {
            schema,
            items,
            options,
            depth,
            cascades: Vec::new(),
        }
    }

    /// Create a store, inferring the schema from the items.
    #[must_use]
    pub fn from_items(items: Vec<Item>, options: EditorOptions) -> Self {
        let schema = options.inferencer.infer(&items);
        debug!(fields = schema.len(), items = items.len(), "Inferred list schema");
        Self::new(schema, items, options)
    }

    /// Create a store from a list document, inferring the schema if the
    /// document has none.
    #[must_use]
    pub fn from_document(document: ListDocument, options: EditorOptions) -> Self {
        match document.schema {
            Some(schema) => Self::new(schema, document.items, options),
            None => Self::from_items(document.items, options),
        }
    }

    /// Snapshot the store as a list document that keeps its schema.
    #[must_use]
    pub fn to_document(&self) -> ListDocument {
        ListDocument {
            schema: Some(self.schema.clone()),
            items: self.items.clone(),
        }
    }

    /// The current schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The items, in order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Consume the store, returning the items.
    #[must_use]
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Nesting level of this store (1 for a top-level list).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The editor options in use.
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get one item.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn item(&self, index: usize) -> Result<&Item> {
        self.check_index(index)?;
        Ok(&self.items[index])
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(Error::ItemOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn field(&self, key: &str) -> Result<&Field> {
        self.schema.get(key).ok_or_else(|| Error::unknown_field(key))
    }

    // === Item operations ===

    /// Append an item with the default value of every schema field.
    ///
    /// Returns the new item's index.
    pub fn append_item(&mut self) -> usize {
        let item: Item = self
            .schema
            .fields()
            .iter()
            .map(|field| (field.key.clone(), field.field_type.default_value()))
            .collect();
        self.items.push(item);
        let index = self.items.len() - 1;
        debug!(index, depth = self.depth, "Appended item");
        index
    }

    /// Remove the item at `index`; later items shift down by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn remove_item(&mut self, index: usize) -> Result<Item> {
        self.check_index(index)?;
        debug!(index, depth = self.depth, "Removed item");
        Ok(self.items.remove(index))
    }

    /// Move the item at `from` so that it ends up at `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either index is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let item = self.items.remove(from);
        self.items.insert(to, item);
        debug!(from, to, depth = self.depth, "Moved item");
        Ok(())
    }

    /// Replace the value of one field of one item.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the key is not in
    /// the schema.
    pub fn update_field(
        &mut self,
        index: usize,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        self.check_index(index)?;
        self.field(key)?;
        self.items[index].insert(key, value);
        debug!(index, key, depth = self.depth, "Updated item field");
        Ok(())
    }

    /// Point a media field of one item at a new URL, keeping its caption and
    /// alt text.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range, the key is unknown, or
    /// the field is not an image or video field.
    pub fn set_media_url(&mut self, index: usize, key: &str, url: impl Into<String>) -> Result<()> {
        self.check_media_target(index, key)?;
        let url = url.into();
        let item = &mut self.items[index];
        match item.get_mut(key) {
            Some(FieldValue::Media(media)) => media.url = url,
            Some(FieldValue::Raw(serde_json::Value::Object(map))) => {
                map.insert("url".to_string(), serde_json::Value::String(url));
            }
            _ => {
                item.insert(key, Media::new(url));
            }
        }
        debug!(index, key, "Set media url");
        Ok(())
    }

    /// Check that `(index, key)` addresses a media field.
    ///
    /// # Errors
    ///
    /// Returns an error if it does not.
    pub fn check_media_target(&self, index: usize, key: &str) -> Result<()> {
        self.check_index(index)?;
        if self.field(key)?.field_type.is_media() {
            Ok(())
        } else {
            Err(Error::NotMedia {
                key: key.to_string(),
            })
        }
    }

    // === Schema operations ===

    /// Add a short text field under a generated placeholder key.
    ///
    /// Items are left untouched; the key stays absent until edited.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder key does not pass key validation.
    pub fn add_field(&mut self) -> Result<String> {
        let key = self.schema.placeholder_key(&self.options.field_prefix);
        self.add_field_with(&key, FieldType::Text)?;
        Ok(key)
    }

    /// Add a field with a chosen key and type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or already in the schema.
    pub fn add_field_with(&mut self, key: &str, field_type: FieldType) -> Result<()> {
        self.options.keys.validate(key)?;
        self.schema.push(Field::new(key, field_type))?;
        debug!(key, %field_type, depth = self.depth, "Added field");
        Ok(())
    }

    /// Rename a field and move every item's value to the new key.
    ///
    /// Returns the number of items whose data moved.
    ///
    /// # Errors
    ///
    /// Returns an error if `old` is unknown, `new` is invalid or taken, or
    /// some item already keeps an unlisted value under `new`.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<usize> {
        if old == new {
            self.field(old)?;
            return Ok(0);
        }
        self.options.keys.validate(new)?;
        self.field(old)?;
        if self.schema.contains(new) {
            return Err(Error::duplicate_field(new));
        }
        let count = holders(&self.items, &[], new);
        if count > 0 {
            return Err(Error::RenameCollision {
                key: new.to_string(),
                count,
            });
        }
        self.schema.rename(old, new)?;
        let change = KeyChange::Renamed {
            old: old.to_string(),
            new: new.to_string(),
        };
        let moved = cascade(&mut self.items, &[], &change);
        self.cascades.push(Cascade {
            path: Vec::new(),
            change,
        });
        debug!(old, new, moved, depth = self.depth, "Renamed field");
        Ok(moved)
    }

    /// Remove a field from the schema and its key from every item.
    ///
    /// Returns the number of items that held the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn remove_field(&mut self, key: &str) -> Result<usize> {
        self.schema.remove(key)?;
        let change = KeyChange::Removed {
            key: key.to_string(),
        };
        let removed = cascade(&mut self.items, &[], &change);
        self.cascades.push(Cascade {
            path: Vec::new(),
            change,
        });
        debug!(key, removed, depth = self.depth, "Removed field");
        Ok(removed)
    }

    /// Change a field's declared type. Item data is left as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn retype_field(&mut self, key: &str, field_type: FieldType) -> Result<()> {
        self.schema.retype(key, field_type)?;
        debug!(key, %field_type, depth = self.depth, "Retyped field");
        Ok(())
    }

    /// Drop every item key that is not part of the schema, at this level and
    /// in nested lists with a known schema.
    ///
    /// Returns the number of keys dropped.
    pub fn prune_orphans(&mut self) -> usize {
        let pruned = prune(&mut self.items, &self.schema);
        debug!(pruned, depth = self.depth, "Pruned orphan keys");
        pruned
    }

    // === Nesting ===

    /// Edit the nested list stored under `key` in item `index`.
    ///
    /// The closure gets a store for that nested list, using the field's
    /// nested schema (inferred if there is none yet). When the closure
    /// succeeds, the nested items and schema are written back, and renames
    /// or removals it made are replayed over the same field of every other
    /// item. When it fails, nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or key is invalid, the field is not a
    /// list, the nesting limit is reached, or the closure fails.
    pub fn with_nested<R>(
        &mut self,
        index: usize,
        key: &str,
        edit: impl FnOnce(&mut ListStore) -> Result<R>,
    ) -> Result<R> {
        let depth = self.depth + 1;
        if depth > self.options.max_depth {
            return Err(Error::MaxDepthExceeded {
                depth,
                max: self.options.max_depth,
            });
        }
        self.check_index(index)?;
        let field = self.field(key)?;
        if field.field_type != FieldType::List {
            return Err(Error::NotAList {
                key: key.to_string(),
            });
        }

        let nested_items = match self.items[index].get(key) {
            Some(FieldValue::List(items)) => items.clone(),
            None => Vec::new(),
            Some(_) => {
                return Err(Error::NotAList {
                    key: key.to_string(),
                })
            }
        };
        let nested_schema = field
            .item_schema
            .clone()
            .unwrap_or_else(|| self.options.inferencer.infer_at(&nested_items, depth));

        let mut nested = Self::at_depth(nested_schema, nested_items, self.options.clone(), depth);
        let result = edit(&mut nested)?;

        let Self {
            schema: nested_schema,
            items: nested_items,
            cascades: nested_cascades,
            ..
        } = nested;

        // Replay on copies; commit only if every sibling accepts the changes.
        let mut schema = self.schema.clone();
        schema.set_item_schema(key, nested_schema)?;
        let mut items = self.items.clone();
        items[index].insert(key, FieldValue::List(nested_items));

        let mut replayed_cascades = Vec::with_capacity(nested_cascades.len());
        for Cascade { path, change } in nested_cascades {
            let mut full_path = Vec::with_capacity(path.len() + 1);
            full_path.push(key.to_string());
            full_path.extend(path);

            if let KeyChange::Renamed { new, .. } = &change {
                let count: usize = items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, item)| holders(std::slice::from_ref(item), &full_path, new))
                    .sum();
                if count > 0 {
                    return Err(Error::RenameCollision {
                        key: new.clone(),
                        count,
                    });
                }
            }

            let replayed: usize = items
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, item)| cascade(std::slice::from_mut(item), &full_path, &change))
                .sum();
            if replayed > 0 {
                debug!(path = ?full_path, replayed, "Replayed nested schema change on siblings");
            }
            replayed_cascades.push(Cascade {
                path: full_path,
                change,
            });
        }

        self.schema = schema;
        self.items = items;
        self.cascades.extend(replayed_cascades);
        Ok(result)
    }
}

/// Apply a key change to every item reached by following `path` through
/// nested lists. Returns the number of items whose data changed.
fn cascade(items: &mut [Item], path: &[String], change: &KeyChange) -> usize {
    match path.split_first() {
        None => items
            .iter_mut()
            .map(|item| match change {
                KeyChange::Renamed { old, new } => item.rename_key(old, new),
                KeyChange::Removed { key } => item.remove(key).is_some(),
            })
            .filter(|changed| *changed)
            .count(),
        Some((head, rest)) => items
            .iter_mut()
            .filter_map(|item| match item.get_mut(head) {
                Some(FieldValue::List(nested)) => Some(cascade(nested, rest, change)),
                _ => None,
            })
            .sum(),
    }
}

/// Count the items reached by following `path` that hold `key`.
fn holders(items: &[Item], path: &[String], key: &str) -> usize {
    match path.split_first() {
        None => items.iter().filter(|item| item.contains_key(key)).count(),
        Some((head, rest)) => items
            .iter()
            .filter_map(|item| match item.get(head) {
                Some(FieldValue::List(nested)) => Some(holders(nested, rest, key)),
                _ => None,
            })
            .sum(),
    }
}

fn prune(items: &mut [Item], schema: &Schema) -> usize {
    let mut pruned = 0;
    for item in items.iter_mut() {
        let before = item.len();
        item.retain(|key| schema.contains(key));
        pruned += before - item.len();

        for field in schema.fields() {
            if let (Some(nested_schema), Some(FieldValue::List(nested))) =
                (&field.item_schema, item.get_mut(&field.key))
            {
                pruned += prune(nested, nested_schema);
            }
        }
    }
    pruned
}
