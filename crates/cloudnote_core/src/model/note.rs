//! Note record model.
//!
//! # Invariants
//! - `name` is non-empty for notes created through the repository.
//! - `folder` is the owning folder id, or empty when the note was released
//!   from a deleted folder.

use crate::model::field;
use crate::model::value::{decode_text, decode_timestamp, Record, RecordDecodeError, RecordId, RecordKey};
use serde::{Deserialize, Serialize};

/// Note snapshot decoded from the `notes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    pub name: String,
    /// Owning folder id; empty string means "no folder".
    pub folder: RecordId,
    /// Raw note body.
    pub content: String,
    pub created: i64,
    pub modified: i64,
}

impl Note {
    pub fn from_record(record: &Record) -> Result<Self, RecordDecodeError> {
        Ok(Self {
            id: record.id.clone(),
            name: decode_text(record, field::NAME)?,
            folder: decode_text(record, field::FOLDER)?,
            content: decode_text(record, field::CONTENT)?,
            created: decode_timestamp(record, field::CREATED)?,
            modified: decode_timestamp(record, field::MODIFIED)?,
        })
    }

    /// Returns the owning folder id, `None` for released notes.
    pub fn folder_id(&self) -> Option<&str> {
        if self.folder.is_empty() {
            None
        } else {
            Some(self.folder.as_str())
        }
    }
}

impl RecordKey for Note {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
