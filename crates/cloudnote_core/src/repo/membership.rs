//! Folder/note membership linking.
//!
//! # Responsibility
//! - Own every write that touches both `Folder.notes` and `Note.folder`.
//!
//! # Invariants
//! - A note id is appended to its folder only after the note record exists.
//! - A note id is spliced out of its folder before the note record is
//!   deleted or re-pointed.
//! - Writes are not atomic across the two tables; the store is the
//!   consistency boundary.

use super::{RepoResult, TableBinding};
use crate::model::field;
use crate::model::note::Note;
use crate::model::value::{fields, FieldValue, Fields, Record};
use crate::store::Table;
use log::{debug, info};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Membership {
    pub(crate) folders: Arc<TableBinding>,
    pub(crate) notes: Arc<TableBinding>,
}

impl Membership {
    pub(crate) fn new(folders: Arc<TableBinding>, notes: Arc<TableBinding>) -> Self {
        Self { folders, notes }
    }

    /// Inserts a note and links it into `folder_id`.
    pub(crate) fn insert_note(&self, folder_id: &str, note_fields: Fields) -> RepoResult<Record> {
        let notes = self.notes.now()?;
        let folders = self.folders.now()?;

        let record = notes.insert(note_fields)?;
        folders.list_push(folder_id, field::NOTES, &record.id)?;
        info!(
            "event=note_link module=repo status=ok note_id={} folder_id={}",
            record.id, folder_id
        );
        Ok(record)
    }

    /// Unlinks a note from its folder, then deletes the note record.
    pub(crate) fn delete_note(&self, note: &Note) -> RepoResult<Record> {
        let notes = self.notes.now()?;
        let folders = self.folders.now()?;

        unlink(folders.as_ref(), note)?;
        Ok(notes.delete_record(&note.id)?)
    }

    /// Re-points a note to `target` (or to no folder) and applies `props`.
    pub(crate) fn move_note(
        &self,
        note: &Note,
        target: Option<&str>,
        mut props: Fields,
    ) -> RepoResult<Record> {
        let notes = self.notes.now()?;
        let folders = self.folders.now()?;

        unlink(folders.as_ref(), note)?;
        if let Some(target_id) = target {
            folders.list_push(target_id, field::NOTES, &note.id)?;
        }
        props.insert(
            field::FOLDER.to_string(),
            FieldValue::from(target.unwrap_or_default()),
        );
        let record = notes.update(&note.id, props)?;
        info!(
            "event=note_move module=repo status=ok note_id={} from_folder={} to_folder={}",
            note.id,
            note.folder,
            target.unwrap_or_default()
        );
        Ok(record)
    }

    /// Releases every note pointing at `folder_id`.
    ///
    /// `delete_notes = true` deletes them; otherwise their `folder` field is
    /// cleared. Returns the number of affected notes.
    pub(crate) fn release_folder(&self, folder_id: &str, delete_notes: bool) -> RepoResult<usize> {
        let notes = self.notes.now()?;
        let contained = notes.query(&fields([(field::FOLDER, folder_id)]))?;

        for record in &contained {
            if delete_notes {
                notes.delete_record(&record.id)?;
            } else {
                notes.set(&record.id, field::FOLDER, FieldValue::from(""))?;
            }
        }
        info!(
            "event=folder_release module=repo status=ok folder_id={} notes={} deleted={}",
            folder_id,
            contained.len(),
            delete_notes
        );
        Ok(contained.len())
    }
}

/// Splices `note` out of its current folder, when that folder still exists.
fn unlink(folders: &dyn Table, note: &Note) -> RepoResult<()> {
    let Some(folder_id) = note.folder_id() else {
        return Ok(());
    };
    if folders.get(folder_id)?.is_none() {
        debug!(
            "event=note_unlink module=repo status=skipped reason=folder_missing note_id={} folder_id={}",
            note.id, folder_id
        );
        return Ok(());
    }
    folders.list_remove(folder_id, field::NOTES, &note.id)?;
    Ok(())
}
