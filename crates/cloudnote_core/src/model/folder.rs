//! Folder record model.
//!
//! # Invariants
//! - Every id in `notes` should reference a note whose `folder` equals this
//!   folder's id. The store does not enforce this; `repo::membership` does.

use crate::model::field;
use crate::model::value::{
    decode_list, decode_text, decode_timestamp, Record, RecordDecodeError, RecordId, RecordKey,
};
use serde::{Deserialize, Serialize};

/// Name used when a folder is created without one.
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

/// Folder snapshot decoded from the `folders` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: RecordId,
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created: i64,
    /// Epoch ms update timestamp.
    pub modified: i64,
    /// Ordered ids of contained notes.
    pub notes: Vec<RecordId>,
}

impl Folder {
    pub fn from_record(record: &Record) -> Result<Self, RecordDecodeError> {
        Ok(Self {
            id: record.id.clone(),
            name: decode_text(record, field::NAME)?,
            created: decode_timestamp(record, field::CREATED)?,
            modified: decode_timestamp(record, field::MODIFIED)?,
            notes: decode_list(record, field::NOTES)?,
        })
    }

    pub fn contains_note(&self, note_id: &str) -> bool {
        self.notes.iter().any(|id| id == note_id)
    }
}

impl RecordKey for Folder {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
