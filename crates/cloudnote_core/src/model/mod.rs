//! Typed record model for folders, notes and settings.
//!
//! # Responsibility
//! - Define the generic field/record shape exchanged with the remote store.
//! - Decode store records into typed `Folder`/`Note`/`Setting` snapshots.
//!
//! # Invariants
//! - Record ids are assigned by the store and never rewritten by core.
//! - Snapshots are transient copies; the store stays the owner of state.

pub mod folder;
pub mod note;
pub mod setting;
pub mod value;

/// Field names shared by repositories and store records.
pub mod field {
    pub const NAME: &str = "name";
    pub const CREATED: &str = "created";
    pub const MODIFIED: &str = "modified";
    pub const NOTES: &str = "notes";
    pub const FOLDER: &str = "folder";
    pub const CONTENT: &str = "content";
    pub const VALUE: &str = "value";
}
