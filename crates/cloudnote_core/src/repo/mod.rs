//! Repository layer over the remote store tables.
//!
//! # Responsibility
//! - Expose folder/note/setting use-case APIs on top of `Table` handles.
//! - Translate store failures into the typed `RepoError` taxonomy.
//! - Keep Folder.notes and Note.folder consistent through `membership`.
//!
//! # Invariants
//! - Non-deferred operations never block: before the store handle resolves
//!   they fail with `RepoError::Unresolved`.
//! - `deferred_*` operations block until the handle resolves, bounded by
//!   `ClientConfig::open_timeout_ms`.
//! - Repositories keep table handles only; records are never cached
//!   beyond a single call.

pub mod folder_repo;
mod membership;
pub mod note_repo;
pub mod setting_repo;

use crate::model::value::{FieldValue, Fields, Record, RecordDecodeError, RecordId};
use crate::store::{HandleError, StoreError, StoreHandle, Table};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record type named in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Folder,
    Note,
    Setting,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::Note => write!(f, "note"),
            Self::Setting => write!(f, "setting"),
        }
    }
}

/// Coarse error category exposed to UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    TypeMismatch,
    UnresolvedDependency,
    Store,
    InvalidData,
}

/// Repository error for all record operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input is malformed (blank name, empty id, wrong field type).
    InvalidArgument(String),
    /// Referenced record does not exist.
    NotFound { kind: RecordKind, id: RecordId },
    /// Stored value has a type the operation cannot work with.
    TypeMismatch {
        id: RecordId,
        expected: &'static str,
        found: &'static str,
    },
    /// Store handle is not available (pending, timed out or failed).
    Unresolved(HandleError),
    /// Backend failure reported by the table implementation.
    Store(StoreError),
    /// Stored record cannot be decoded into its typed snapshot.
    InvalidData(RecordDecodeError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Unresolved(_) => ErrorKind::UnresolvedDependency,
            Self::Store(_) => ErrorKind::Store,
            Self::InvalidData(_) => ErrorKind::InvalidData,
        }
    }

    pub(crate) fn not_found(kind: RecordKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::TypeMismatch {
                id,
                expected,
                found,
            } => write!(f, "record `{id}` holds a {found} value, expected {expected}"),
            Self::Unresolved(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(err) => write!(f, "invalid stored record: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unresolved(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::InvalidData(err) => Some(err),
            Self::InvalidArgument(_) | Self::NotFound { .. } | Self::TypeMismatch { .. } => None,
        }
    }
}

impl From<HandleError> for RepoError {
    fn from(value: HandleError) -> Self {
        Self::Unresolved(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RecordDecodeError> for RepoError {
    fn from(value: RecordDecodeError) -> Self {
        Self::InvalidData(value)
    }
}

/// Lazily bound reference to one named table of the shared datastore.
pub(crate) struct TableBinding {
    handle: StoreHandle,
    name: String,
    timeout: Duration,
    table: OnceCell<Arc<dyn Table>>,
}

impl TableBinding {
    pub(crate) fn new(handle: StoreHandle, name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            handle,
            name: name.into(),
            timeout,
            table: OnceCell::new(),
        }
    }

    pub(crate) fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Returns the table without blocking.
    pub(crate) fn now(&self) -> RepoResult<Arc<dyn Table>> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }
        let datastore = self.handle.try_get()?;
        Ok(Arc::clone(
            self.table.get_or_init(|| datastore.get_table(&self.name)),
        ))
    }

    /// Returns the table, waiting for the store handle when needed.
    pub(crate) fn wait(&self) -> RepoResult<Arc<dyn Table>> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }
        let datastore = self.handle.wait(self.timeout)?;
        Ok(Arc::clone(
            self.table.get_or_init(|| datastore.get_table(&self.name)),
        ))
    }
}

/// Decodes every record with `decode`, failing on the first bad record.
pub(crate) fn decode_all<T, F>(records: Vec<Record>, decode: F) -> RepoResult<Vec<T>>
where
    F: Fn(&Record) -> Result<T, RecordDecodeError>,
{
    records
        .iter()
        .map(|record| decode(record).map_err(RepoError::from))
        .collect()
}

/// Value shape a typed record expects in one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldType {
    Text,
    Date,
    List,
}

impl FieldType {
    fn accepts(self, value: &FieldValue) -> bool {
        match self {
            Self::Text => matches!(value, FieldValue::Null | FieldValue::Text(_)),
            Self::Date => matches!(value, FieldValue::Null) || value.as_timestamp().is_some(),
            Self::List => matches!(value, FieldValue::Null | FieldValue::List(_)),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::List => "list",
        }
    }
}

/// Rejects `props` entries that the typed snapshot could not decode.
///
/// Runs before any table write so a bad value never reaches the store.
/// Fields missing from `schema` are passed through untouched.
pub(crate) fn check_field_types(
    props: &Fields,
    schema: &[(&'static str, FieldType)],
) -> RepoResult<()> {
    for (name, expected) in schema {
        if let Some(value) = props.get(*name) {
            if !expected.accepts(value) {
                return Err(RepoError::InvalidArgument(format!(
                    "field `{}` must be {}, got {}",
                    name,
                    expected.label(),
                    value.type_name()
                )));
            }
        }
    }
    Ok(())
}
