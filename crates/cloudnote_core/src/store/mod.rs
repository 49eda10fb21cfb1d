//! Remote store contracts and the shared store handle.
//!
//! # Responsibility
//! - Describe the external synchronized datastore, account session and
//!   object storage as traits, so repositories never see a concrete client.
//! - Publish the opened datastore exactly once through `StoreHandle`.
//!
//! # Invariants
//! - Query execution, sync and conflict resolution stay inside the
//!   `Datastore`/`Table` implementation; core never re-implements them.
//! - `Table` write methods return the post-write record snapshot.

use crate::model::value::{FieldValue, Fields, Record, RecordId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod handle;
pub mod memory;
pub mod session;

pub use handle::{HandleError, StoreHandle};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store, account or object-storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Account authentication was refused or aborted.
    AuthenticationFailed(String),
    /// Transport/backend failure (network, quota, closed datastore).
    Backend(String),
    /// Record or object path does not exist.
    RecordNotFound { table: String, id: RecordId },
    /// A list operation targeted a field that is not a list.
    FieldTypeMismatch {
        table: String,
        id: RecordId,
        field: String,
        expected: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed(message) => write!(f, "authentication failed: {message}"),
            Self::Backend(message) => write!(f, "store backend error: {message}"),
            Self::RecordNotFound { table, id } => {
                write!(f, "record `{id}` not found in `{table}`")
            }
            Self::FieldTypeMismatch {
                table,
                id,
                field,
                expected,
            } => write!(
                f,
                "field `{field}` of record `{id}` in `{table}` is not a {expected}"
            ),
        }
    }
}

impl Error for StoreError {}

/// One named table of records inside a datastore.
///
/// Methods are synchronous against the local replica; the implementation
/// owns synchronization with the remote side.
pub trait Table: Send + Sync {
    fn name(&self) -> &str;
    /// Returns the record with `id`, `None` when absent.
    fn get(&self, id: &str) -> StoreResult<Option<Record>>;
    /// Returns records whose fields equal every filter entry.
    fn query(&self, filter: &Fields) -> StoreResult<Vec<Record>>;
    /// Inserts a record and returns it with its store-assigned id.
    fn insert(&self, fields: Fields) -> StoreResult<Record>;
    /// Merges `props` into the record.
    fn update(&self, id: &str, props: Fields) -> StoreResult<Record>;
    /// Sets a single field.
    fn set(&self, id: &str, field: &str, value: FieldValue) -> StoreResult<Record> {
        let mut props = Fields::new();
        props.insert(field.to_string(), value);
        self.update(id, props)
    }
    /// Deletes the record and returns its last snapshot.
    fn delete_record(&self, id: &str) -> StoreResult<Record>;
    /// Appends `value` to a list field, creating the list when unset.
    fn list_push(&self, id: &str, field: &str, value: &str) -> StoreResult<Record>;
    /// Removes the first occurrence of `value` from a list field.
    ///
    /// Absent values leave the list unchanged.
    fn list_remove(&self, id: &str, field: &str, value: &str) -> StoreResult<Record>;
}

/// An opened datastore instance.
pub trait Datastore: Send + Sync {
    fn id(&self) -> &str;
    /// Returns the table named `name`, creating it lazily.
    fn get_table(&self, name: &str) -> Arc<dyn Table>;
}

/// Session obtained after authenticating an account.
pub trait DatastoreManager: Send {
    fn open_default_datastore(&self) -> StoreResult<Arc<dyn Datastore>>;
}

/// Account client able to run the authentication flow.
pub trait AccountClient: Send + Sync {
    fn authenticate(&self, interactive: bool) -> StoreResult<Box<dyn DatastoreManager>>;
}

/// Metadata returned after a file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub path: String,
    pub size: u64,
}

/// Shareable link to a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUrl {
    pub url: String,
    /// Epoch ms expiry, `None` for permanent links.
    pub expires_at: Option<i64>,
}

/// Object storage backing file uploads.
pub trait ObjectStore: Send + Sync {
    fn write_file(&self, path: &str, bytes: &[u8]) -> StoreResult<FileStat>;
    fn make_url(&self, path: &str, download: bool) -> StoreResult<ShareUrl>;
}
