//! Client-side data access for the notes app.
//!
//! Folders, notes and settings live in a remote synchronized datastore;
//! this crate wraps its tables with typed repositories, keeps folder/note
//! membership consistent and defers work until the store is open.

pub mod client;
pub mod clock;
pub mod config;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod upload;

pub use client::NotesClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use events::{ClientEvent, EventBus};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::folder::{Folder, DEFAULT_FOLDER_NAME};
pub use model::note::Note;
pub use model::setting::{Setting, SettingValue};
pub use model::value::{fields, FieldValue, Fields, Record, RecordId, RecordKey};
pub use repo::folder_repo::FolderRepository;
pub use repo::note_repo::{short_content, NoteRepository, SHORT_CONTENT_DEFAULT_LEN};
pub use repo::setting_repo::SettingRepository;
pub use repo::{ErrorKind, RecordKind, RepoError, RepoResult};
pub use store::memory::{MemoryAccount, MemoryDatastore, MemoryObjectStore, MemoryTable};
pub use store::{
    AccountClient, Datastore, DatastoreManager, HandleError, ObjectStore, StoreError,
    StoreHandle, StoreResult, Table,
};
pub use upload::{
    classify_upload, upload_path, FileUploader, UploadError, UploadFile, UploadKind,
    UploadReceipt,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
