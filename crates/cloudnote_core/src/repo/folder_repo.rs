//! Folder repository.
//!
//! # Responsibility
//! - Provide folder CRUD over the `folders` table.
//! - Release or delete contained notes when a folder is deleted.
//!
//! # Invariants
//! - `create` always seeds `name`, `created`, `modified` and `notes`.
//! - `update` always refreshes `modified`.
//! - `add_note`/`remove_note` only touch the folder side; the note's own
//!   `folder` field is the caller's responsibility.

use super::membership::Membership;
use super::{
    check_field_types, decode_all, FieldType, RecordKind, RepoError, RepoResult, TableBinding,
};
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::model::field;
use crate::model::folder::{Folder, DEFAULT_FOLDER_NAME};
use crate::model::value::{fields, FieldValue, Fields, RecordKey};
use crate::store::StoreHandle;
use log::info;
use std::sync::Arc;

const FOLDER_FIELDS: &[(&str, FieldType)] = &[
    (field::NAME, FieldType::Text),
    (field::CREATED, FieldType::Date),
    (field::MODIFIED, FieldType::Date),
    (field::NOTES, FieldType::List),
];

/// Folder use-case repository.
#[derive(Clone)]
pub struct FolderRepository {
    folders: Arc<TableBinding>,
    membership: Membership,
    clock: Arc<dyn Clock>,
}

impl FolderRepository {
    /// Binds the folder and note tables of the datastore behind `handle`.
    pub fn new(handle: StoreHandle, config: &ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let timeout = config.open_timeout();
        let folders = Arc::new(TableBinding::new(
            handle.clone(),
            config.folders_table.as_str(),
            timeout,
        ));
        let notes = Arc::new(TableBinding::new(
            handle,
            config.notes_table.as_str(),
            timeout,
        ));
        Self {
            membership: Membership::new(Arc::clone(&folders), notes),
            folders,
            clock,
        }
    }

    pub(crate) fn membership(&self) -> &Membership {
        &self.membership
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Lists folders matching `filter`; an empty filter lists all.
    pub fn query(&self, filter: &Fields) -> RepoResult<Vec<Folder>> {
        let table = self.folders.now()?;
        decode_all(table.query(filter)?, Folder::from_record)
    }

    /// Same as `query`, waiting for the store to open first.
    pub fn deferred_query(&self, filter: &Fields) -> RepoResult<Vec<Folder>> {
        let table = self.folders.wait()?;
        decode_all(table.query(filter)?, Folder::from_record)
    }

    /// Gets one folder by id.
    pub fn get(&self, id: &str) -> RepoResult<Option<Folder>> {
        let table = self.folders.now()?;
        match table.get(id)? {
            Some(record) => Ok(Some(Folder::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Creates a folder.
    ///
    /// Name precedence: explicit `name`, then `extra["name"]`, then
    /// `"New Folder"`. Keys missing from `extra` are seeded with defaults.
    pub fn create(&self, name: Option<&str>, extra: Option<Fields>) -> RepoResult<Folder> {
        let now = FieldValue::Date(self.clock.now_ms());
        let mut values = extra.unwrap_or_default();
        if let Some(name) = name {
            values.insert(field::NAME.to_string(), FieldValue::from(name));
        }
        values
            .entry(field::NAME.to_string())
            .or_insert_with(|| FieldValue::from(DEFAULT_FOLDER_NAME));
        values
            .entry(field::CREATED.to_string())
            .or_insert_with(|| now.clone());
        values
            .entry(field::MODIFIED.to_string())
            .or_insert(now);
        values
            .entry(field::NOTES.to_string())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        check_field_types(&values, FOLDER_FIELDS)?;

        let table = self.folders.now()?;
        let folder = Folder::from_record(&table.insert(values)?)?;
        info!("event=folder_create module=repo status=ok folder_id={}", folder.id);
        Ok(folder)
    }

    /// Deletes a folder and returns its last snapshot.
    ///
    /// Contained notes are deleted when `include_notes` is set, otherwise
    /// their `folder` field is cleared.
    pub fn delete<K>(&self, folder: &K, include_notes: bool) -> RepoResult<Folder>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(folder.record_id())?;
        let released = self
            .membership
            .release_folder(&existing.id, include_notes)?;

        let table = self.folders.now()?;
        let deleted = Folder::from_record(&table.delete_record(&existing.id)?)?;
        info!(
            "event=folder_delete module=repo status=ok folder_id={} released_notes={} include_notes={}",
            deleted.id, released, include_notes
        );
        Ok(deleted)
    }

    /// Merges `props` into a folder and refreshes `modified`.
    pub fn update<K>(&self, folder: &K, mut props: Fields) -> RepoResult<Folder>
    where
        K: RecordKey + ?Sized,
    {
        check_field_types(&props, FOLDER_FIELDS)?;
        let existing = self.require(folder.record_id())?;
        props.insert(
            field::MODIFIED.to_string(),
            FieldValue::Date(self.clock.now_ms()),
        );
        let table = self.folders.now()?;
        Ok(Folder::from_record(&table.update(&existing.id, props)?)?)
    }

    pub fn rename<K>(&self, folder: &K, new_name: &str) -> RepoResult<Folder>
    where
        K: RecordKey + ?Sized,
    {
        self.update(folder, fields([(field::NAME, new_name)]))
    }

    /// Appends `note_id` to the folder's note list. Does not touch the note.
    pub fn add_note<K>(&self, folder: &K, note_id: &str) -> RepoResult<Folder>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(folder.record_id())?;
        let table = self.folders.now()?;
        Ok(Folder::from_record(&table.list_push(
            &existing.id,
            field::NOTES,
            note_id,
        )?)?)
    }

    /// Removes `note_id` from the folder's note list. Does not touch the note.
    ///
    /// Removing an id that is not listed leaves the folder unchanged.
    pub fn remove_note<K>(&self, folder: &K, note_id: &str) -> RepoResult<Folder>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(folder.record_id())?;
        let table = self.folders.now()?;
        Ok(Folder::from_record(&table.list_remove(
            &existing.id,
            field::NOTES,
            note_id,
        )?)?)
    }

    /// Gets one folder, failing with `NotFound` when absent.
    pub(crate) fn require(&self, id: &str) -> RepoResult<Folder> {
        self.get(id)?
            .ok_or_else(|| RepoError::not_found(RecordKind::Folder, id))
    }
}
