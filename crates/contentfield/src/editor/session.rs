//! Binding a list store to the host form.
//!
//! The host form owns the value; the editor never persists anything. Every
//! successful mutation made through an [`EditSession`] is followed by one
//! synchronous call to the form's [`ChangeSink`] with the whole new list.
//! Failed mutations leave the store untouched and do not notify.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::content::schema::FieldType;
use crate::content::value::{FieldValue, Item};
use crate::editor::store::ListStore;
use crate::error::Result;
use crate::upload::{Notice, UploadFile, Uploader};

/// Receives the new list value after every mutation.
pub trait ChangeSink {
    /// Called synchronously with the complete new value.
    fn on_change(&mut self, items: &[Item]);
}

impl<F> ChangeSink for F
where
    F: FnMut(&[Item]),
{
    fn on_change(&mut self, items: &[Item]) {
        self(items);
    }
}

/// A list store wired to a change callback.
pub struct EditSession<S: ChangeSink> {
    store: ListStore,
    sink: S,
}

impl<S: ChangeSink> fmt::Debug for EditSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: ChangeSink> EditSession<S> {
    /// Start a session.
    pub fn new(store: ListStore, sink: S) -> Self {
        Self { store, sink }
    }

    /// The store being edited.
    pub fn store(&self) -> &ListStore {
        &self.store
    }

    /// End the session, returning the store.
    pub fn into_store(self) -> ListStore {
        self.store
    }

    /// Run a mutation and notify the sink if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the mutation's error; the sink is not called.
    pub fn apply<R>(&mut self, op: impl FnOnce(&mut ListStore) -> Result<R>) -> Result<R> {
        match op(&mut self.store) {
            Ok(result) => {
                self.sink.on_change(self.store.items());
                Ok(result)
            }
            Err(e) => {
                if e.is_schema_error() {
                    warn!(error = %e, "Schema change rejected");
                } else {
                    debug!(error = %e, "Edit rejected");
                }
                Err(e)
            }
        }
    }

    /// Append an item with default values.
    pub fn append_item(&mut self) -> usize {
        let index = self.store.append_item();
        self.sink.on_change(self.store.items());
        index
    }

    /// Remove the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn remove_item(&mut self, index: usize) -> Result<Item> {
        self.apply(|store| store.remove_item(index))
    }

    /// Replace one field of one item.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or key is invalid.
    pub fn update_field(
        &mut self,
        index: usize,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        self.apply(|store| store.update_field(index, key, value))
    }

    /// Add a placeholder field.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated key is rejected.
    pub fn add_field(&mut self) -> Result<String> {
        self.apply(ListStore::add_field)
    }

    /// Rename a field across every item.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename is rejected.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<usize> {
        self.apply(|store| store.rename_field(old, new))
    }

    /// Remove a field from every item.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn remove_field(&mut self, key: &str) -> Result<usize> {
        self.apply(|store| store.remove_field(key))
    }

    /// Change a field's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn retype_field(&mut self, key: &str, field_type: FieldType) -> Result<()> {
        self.apply(|store| store.retype_field(key, field_type))
    }

    /// Upload a file and point one media field at it.
    ///
    /// The target is checked before anything is sent. On failure the field
    /// keeps its value, the sink is not called, and the returned notice
    /// carries the message to show.
    pub async fn upload_into<U>(
        &mut self,
        index: usize,
        key: &str,
        uploader: &U,
        file: UploadFile,
    ) -> Notice
    where
        U: Uploader + ?Sized,
    {
        if let Err(e) = self.store.check_media_target(index, key) {
            warn!(index, key, error = %e, "Upload target rejected");
            return Notice::failed(e.to_string());
        }

        let filename = file.filename.clone();
        match uploader.upload(file).await {
            Ok(uploaded) => {
                let url = uploaded.url.clone();
                match self.apply(|store| store.set_media_url(index, key, url)) {
                    Ok(()) => {
                        info!(index, key, url = %uploaded.url, "Attached upload");
                        Notice::uploaded(uploaded)
                    }
                    Err(e) => Notice::failed(e.to_string()),
                }
            }
            Err(e) => {
                if e.is_upload_error() {
                    warn!(filename = %filename, error = %e, "Upload refused, field unchanged");
                } else {
                    error!(filename = %filename, error = %e, "Upload failed, field unchanged");
                }
                Notice::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::schema::{Field, Schema};
    use crate::editor::EditorOptions;
    use crate::error::Error;
    use crate::logging::init_test_logging;
    use crate::upload::{UploadKind, UploadedFile};

    fn store() -> ListStore {
        let schema = Schema::new(vec![
            Field::new("title", FieldType::Text),
            Field::new("image", FieldType::Image),
        ])
        .unwrap();
        ListStore::new(schema, Vec::new(), EditorOptions::default())
    }

    #[test]
    fn test_every_mutation_notifies() {
        let mut seen: Vec<Vec<Item>> = Vec::new();
        {
            let mut session = EditSession::new(store(), |items: &[Item]| seen.push(items.to_vec()));
            session.append_item();
            session.update_field(0, "title", "Hello").unwrap();
            session.add_field().unwrap();
            session.rename_field("title", "heading").unwrap();
            session.retype_field("heading", FieldType::LongText).unwrap();
            session.remove_field("image").unwrap();
            session.remove_item(0).unwrap();
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(
            seen[1][0].get("title"),
            Some(&FieldValue::text("Hello"))
        );
        assert!(seen[3][0].contains_key("heading"));
        assert!(!seen[5][0].contains_key("image"));
        assert!(seen[6].is_empty());
    }

    #[test]
    fn test_failed_mutation_does_not_notify() {
        init_test_logging();
        let mut calls = 0;
        {
            let mut session = EditSession::new(store(), |_: &[Item]| calls += 1);
            assert!(session.remove_item(5).is_err());
            assert!(session.update_field(0, "title", "x").is_err());
            assert!(session.rename_field("missing", "other").is_err());
        }
        assert_eq!(calls, 0);
    }

    struct FixedUploader {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Uploader for FixedUploader {
        async fn upload(&self, file: UploadFile) -> Result<UploadedFile> {
            if self.fail {
                return Err(Error::upload(file.filename, "server said no"));
            }
            Ok(UploadedFile {
                url: format!("/uploads/{}", file.filename),
                filename: file.filename,
                mimetype: "image/png".to_string(),
                size: file.bytes.len() as u64,
                kind: UploadKind::Image,
            })
        }
    }

    fn png() -> UploadFile {
        UploadFile::new("cover.png", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_upload_success_updates_field() {
        let mut calls = 0;
        let mut session = EditSession::new(store(), |_: &[Item]| calls += 1);
        session.append_item();

        let notice = session
            .upload_into(0, "image", &FixedUploader { fail: false }, png())
            .await;
        assert!(notice.is_success());
        assert_eq!(
            session.store().items()[0].get("image"),
            Some(&FieldValue::media("/uploads/cover.png"))
        );
        drop(session);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_field() {
        init_test_logging();
        let mut session = EditSession::new(store(), |_: &[Item]| {});
        session.append_item();

        let notice = session
            .upload_into(0, "image", &FixedUploader { fail: true }, png())
            .await;
        assert!(!notice.is_success());
        assert!(notice.message().contains("server said no"));
        assert_eq!(
            session.store().items()[0].get("image"),
            Some(&FieldValue::media(""))
        );
    }

    #[tokio::test]
    async fn test_upload_into_non_media_field_is_rejected() {
        let mut session = EditSession::new(store(), |_: &[Item]| {});
        session.append_item();

        let notice = session
            .upload_into(0, "title", &FixedUploader { fail: false }, png())
            .await;
        assert!(!notice.is_success());
        assert_eq!(session.store().items()[0].get("title"), Some(&FieldValue::text("")));
    }
}
