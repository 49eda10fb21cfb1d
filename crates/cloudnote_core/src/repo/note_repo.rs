//! Note repository.
//!
//! # Responsibility
//! - Provide note CRUD over the `notes` table.
//! - Keep the owning folder's `notes` list in step with `Note.folder`.
//! - Derive short single-line previews from note content.
//!
//! # Invariants
//! - A created note is listed in its folder before `create` returns.
//! - Moving a note splices it out of the folder it currently points at,
//!   never out of the target folder.
//! - Every `update` refreshes `modified`.

use super::folder_repo::FolderRepository;
use super::membership::Membership;
use super::{
    check_field_types, decode_all, FieldType, RecordKind, RepoError, RepoResult, TableBinding,
};
use crate::clock::Clock;
use crate::events::{ClientEvent, EventBus};
use crate::model::field;
use crate::model::note::Note;
use crate::model::value::{fields, FieldValue, Fields, RecordKey};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Default preview length for `get_short_content`.
pub const SHORT_CONTENT_DEFAULT_LEN: usize = 15;

static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\r\n]+").expect("valid line regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const NOTE_FIELDS: &[(&str, FieldType)] = &[
    (field::NAME, FieldType::Text),
    (field::FOLDER, FieldType::Text),
    (field::CONTENT, FieldType::Text),
    (field::CREATED, FieldType::Date),
    (field::MODIFIED, FieldType::Date),
];

/// Note use-case repository.
#[derive(Clone)]
pub struct NoteRepository {
    notes: Arc<TableBinding>,
    folders: FolderRepository,
    membership: Membership,
    clock: Arc<dyn Clock>,
}

impl NoteRepository {
    /// Builds the repository on top of `folders`, sharing its store handle.
    ///
    /// Publishes `ClientEvent::NotesReady` once the store opens.
    pub fn new(folders: FolderRepository, events: &EventBus) -> Self {
        let membership = folders.membership().clone();
        let notes = Arc::clone(&membership.notes);

        let events = events.clone();
        notes.handle().on_ready(move |_| {
            events.publish(ClientEvent::NotesReady);
        });

        Self {
            notes,
            clock: folders.clock(),
            folders,
            membership,
        }
    }

    /// Lists notes matching `filter`; an empty filter lists all.
    pub fn query(&self, filter: &Fields) -> RepoResult<Vec<Note>> {
        let table = self.notes.now()?;
        decode_all(table.query(filter)?, Note::from_record)
    }

    /// Same as `query`, waiting for the store to open first.
    pub fn deferred_query(&self, filter: &Fields) -> RepoResult<Vec<Note>> {
        let table = self.notes.wait()?;
        decode_all(table.query(filter)?, Note::from_record)
    }

    /// Gets one note by id.
    pub fn get(&self, id: &str) -> RepoResult<Option<Note>> {
        let table = self.notes.now()?;
        match table.get(id)? {
            Some(record) => Ok(Some(Note::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Creates a note inside `folder_id` and links it into the folder.
    ///
    /// # Errors
    /// - `InvalidArgument` when `name` or `folder_id` is empty.
    /// - `NotFound` when the folder does not exist.
    pub fn create(&self, name: &str, folder_id: &str, content: Option<&str>) -> RepoResult<Note> {
        if name.is_empty() {
            return Err(RepoError::InvalidArgument("note name must not be empty".to_string()));
        }
        if folder_id.is_empty() {
            return Err(RepoError::InvalidArgument("folder id must not be empty".to_string()));
        }
        let folder = self.folders.require(folder_id)?;

        let now = FieldValue::Date(self.clock.now_ms());
        let mut values = fields([
            (field::NAME, name),
            (field::FOLDER, folder.id.as_str()),
            (field::CONTENT, content.unwrap_or_default()),
        ]);
        values.insert(field::CREATED.to_string(), now.clone());
        values.insert(field::MODIFIED.to_string(), now);

        let note = Note::from_record(&self.membership.insert_note(&folder.id, values)?)?;
        info!(
            "event=note_create module=repo status=ok note_id={} folder_id={}",
            note.id, note.folder
        );
        Ok(note)
    }

    /// Unlinks a note from its folder, deletes it and returns its last snapshot.
    pub fn delete<K>(&self, note: &K) -> RepoResult<Note>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(note.record_id())?;
        let deleted = Note::from_record(&self.membership.delete_note(&existing)?)?;
        info!("event=note_delete module=repo status=ok note_id={}", deleted.id);
        Ok(deleted)
    }

    /// Merges `props` into a note and refreshes `modified`.
    ///
    /// A `folder` entry that differs from the current folder moves the note:
    /// the id leaves the current folder's list and joins the target's. An
    /// empty `folder` releases the note from its folder.
    ///
    /// # Errors
    /// - `InvalidArgument` for a blank `name` or any field whose value the
    ///   note record cannot hold; nothing is written in that case.
    /// - `NotFound` when the note or the target folder does not exist.
    pub fn update<K>(&self, note: &K, mut props: Fields) -> RepoResult<Note>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(note.record_id())?;
        check_field_types(&props, NOTE_FIELDS)?;
        if let Some(name) = props.get(field::NAME) {
            if name.as_text().map_or(true, str::is_empty) {
                return Err(RepoError::InvalidArgument(
                    "note name must be a non-empty string".to_string(),
                ));
            }
        }
        props.insert(
            field::MODIFIED.to_string(),
            FieldValue::Date(self.clock.now_ms()),
        );

        let target = match props.remove(field::FOLDER) {
            None => None,
            Some(FieldValue::Text(folder_id)) => Some(folder_id),
            Some(other) => {
                return Err(RepoError::InvalidArgument(format!(
                    "note folder must be a string, got {}",
                    other.type_name()
                )))
            }
        };

        let record = match target {
            Some(folder_id) if folder_id != existing.folder => {
                let target = if folder_id.is_empty() {
                    None
                } else {
                    Some(self.folders.require(&folder_id)?.id)
                };
                self.membership
                    .move_note(&existing, target.as_deref(), props)?
            }
            _ => self.notes.now()?.update(&existing.id, props)?,
        };
        Ok(Note::from_record(&record)?)
    }

    pub fn rename<K>(&self, note: &K, new_name: &str) -> RepoResult<Note>
    where
        K: RecordKey + ?Sized,
    {
        self.update(note, fields([(field::NAME, new_name)]))
    }

    /// Returns a short preview of the note content.
    ///
    /// `max_length` defaults to 15 characters. See `short_content`.
    pub fn get_short_content<K>(
        &self,
        note: &K,
        max_length: Option<usize>,
        break_on_new_line: bool,
    ) -> RepoResult<String>
    where
        K: RecordKey + ?Sized,
    {
        let existing = self.require(note.record_id())?;
        Ok(short_content(
            &existing.content,
            max_length.unwrap_or(SHORT_CONTENT_DEFAULT_LEN),
            break_on_new_line,
        ))
    }

    fn require(&self, id: &str) -> RepoResult<Note> {
        self.get(id)?
            .ok_or_else(|| RepoError::not_found(RecordKind::Note, id))
    }
}

/// Derives a one-line preview of `content`.
///
/// Rules:
/// - `break_on_new_line = true`: the first line that is not blank, trimmed.
/// - `break_on_new_line = false`: the whole content with every whitespace
///   run (newlines included) collapsed to one space, trimmed.
/// - The result keeps at most `max_length` characters; blank content gives
///   an empty string.
pub fn short_content(content: &str, max_length: usize, break_on_new_line: bool) -> String {
    let line = if break_on_new_line {
        LINE_RE
            .find_iter(content)
            .map(|found| found.as_str().trim())
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    } else {
        WHITESPACE_RE.replace_all(content, " ").trim().to_string()
    };
    line.chars().take(max_length).collect()
}

#[cfg(test)]
mod tests {
    use super::short_content;

    #[test]
    fn skips_blank_lines_and_truncates() {
        assert_eq!(short_content("  \n\nHello world\nmore", 5, true), "Hello");
    }

    #[test]
    fn empty_or_blank_content_gives_empty_preview() {
        assert_eq!(short_content("", 15, true), "");
        assert_eq!(short_content(" \r\n\t\n", 15, true), "");
        assert_eq!(short_content(" \r\n\t\n", 15, false), "");
    }

    #[test]
    fn short_lines_are_returned_whole() {
        assert_eq!(short_content("\r\n  Title  \r\nBody", 15, true), "Title");
    }

    #[test]
    fn joined_mode_collapses_newlines() {
        assert_eq!(
            short_content("first\n\n  second line", 40, false),
            "first second line"
        );
        assert_eq!(short_content("first\nsecond", 8, false), "first se");
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        assert_eq!(short_content("héllo wörld", 7, true), "héllo w");
    }
}
