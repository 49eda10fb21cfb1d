//! In-process adapters for the store contracts.
//!
//! # Responsibility
//! - Back tests and the CLI smoke run without a network account.
//! - Follow the remote store's observable semantics: store-assigned ids,
//!   equality filters, merge updates, lazily created tables.
//!
//! # Invariants
//! - Query results keep insertion order.
//! - Record ids are UUID v4 strings and never reused.

use super::{
    AccountClient, Datastore, DatastoreManager, FileStat, ObjectStore, ShareUrl, StoreError,
    StoreResult, Table,
};
use crate::model::value::{FieldValue, Fields, Record};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// In-memory table keeping records in insertion order.
pub struct MemoryTable {
    name: String,
    rows: Mutex<Vec<Record>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(&self, id: &str) -> StoreError {
        StoreError::RecordNotFound {
            table: self.name.clone(),
            id: id.to_string(),
        }
    }

    fn with_record<F>(&self, id: &str, mutate: F) -> StoreResult<Record>
    where
        F: FnOnce(&mut Record) -> StoreResult<()>,
    {
        let mut rows = self.lock();
        let record = rows
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| self.not_found(id))?;
        mutate(record)?;
        Ok(record.clone())
    }

    fn list_field<'r>(
        &self,
        record: &'r mut Record,
        field: &str,
    ) -> StoreResult<&'r mut Vec<String>> {
        let id = record.id.clone();
        let slot = record
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        if matches!(slot, FieldValue::Null) {
            *slot = FieldValue::List(Vec::new());
        }
        match slot {
            FieldValue::List(values) => Ok(values),
            _ => Err(StoreError::FieldTypeMismatch {
                table: self.name.clone(),
                id,
                field: field.to_string(),
                expected: "list",
            }),
        }
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn get(&self, id: &str) -> StoreResult<Option<Record>> {
        Ok(self.lock().iter().find(|record| record.id == id).cloned())
    }

    fn query(&self, filter: &Fields) -> StoreResult<Vec<Record>> {
        Ok(self
            .lock()
            .iter()
            .filter(|record| record.matches(filter))
            .cloned()
            .collect())
    }

    fn insert(&self, fields: Fields) -> StoreResult<Record> {
        let record = Record::new(Uuid::new_v4().to_string(), fields);
        self.lock().push(record.clone());
        debug!(
            "event=memory_insert module=store table={} record_id={}",
            self.name, record.id
        );
        Ok(record)
    }

    fn update(&self, id: &str, props: Fields) -> StoreResult<Record> {
        self.with_record(id, |record| {
            record.fields.extend(props);
            Ok(())
        })
    }

    fn delete_record(&self, id: &str) -> StoreResult<Record> {
        let mut rows = self.lock();
        let index = rows
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| self.not_found(id))?;
        Ok(rows.remove(index))
    }

    fn list_push(&self, id: &str, field: &str, value: &str) -> StoreResult<Record> {
        self.with_record(id, |record| {
            self.list_field(record, field)?.push(value.to_string());
            Ok(())
        })
    }

    fn list_remove(&self, id: &str, field: &str, value: &str) -> StoreResult<Record> {
        self.with_record(id, |record| {
            let values = self.list_field(record, field)?;
            if let Some(index) = values.iter().position(|current| current == value) {
                values.remove(index);
            }
            Ok(())
        })
    }
}

/// In-memory datastore with lazily created tables.
pub struct MemoryDatastore {
    id: String,
    tables: Mutex<BTreeMap<String, Arc<MemoryTable>>>,
}

impl Default for MemoryDatastore {
    fn default() -> Self {
        Self::new("default")
    }
}

impl MemoryDatastore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the concrete table, for test inspection.
    pub fn memory_table(&self, name: &str) -> Arc<MemoryTable> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            tables
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryTable::new(name))),
        )
    }
}

impl Datastore for MemoryDatastore {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn get_table(&self, name: &str) -> Arc<dyn Table> {
        self.memory_table(name)
    }
}

/// Account stub that authenticates against one in-memory datastore.
pub struct MemoryAccount {
    datastore: Arc<MemoryDatastore>,
    latency: Duration,
    failure: Option<StoreError>,
}

impl MemoryAccount {
    pub fn new(datastore: Arc<MemoryDatastore>) -> Self {
        Self {
            datastore,
            latency: Duration::ZERO,
            failure: None,
        }
    }

    /// Delays authentication, simulating an interactive sign-in.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every authentication attempt fail with `reason`.
    pub fn refusing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(StoreError::AuthenticationFailed(reason.into()));
        self
    }
}

struct MemoryDatastoreManager {
    datastore: Arc<MemoryDatastore>,
}

impl DatastoreManager for MemoryDatastoreManager {
    fn open_default_datastore(&self) -> StoreResult<Arc<dyn Datastore>> {
        Ok(Arc::clone(&self.datastore) as Arc<dyn Datastore>)
    }
}

impl AccountClient for MemoryAccount {
    fn authenticate(&self, _interactive: bool) -> StoreResult<Box<dyn DatastoreManager>> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(Box::new(MemoryDatastoreManager {
            datastore: Arc::clone(&self.datastore),
        }))
    }
}

/// In-memory object storage issuing URLs under `base_url`.
pub struct MemoryObjectStore {
    base_url: String,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    offline: bool,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            files: Mutex::new(BTreeMap::new()),
            offline: false,
        }
    }

    /// Store whose writes always fail with a backend error.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new("memory://offline")
        }
    }

    /// Returns stored bytes for `path`.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn write_file(&self, path: &str, bytes: &[u8]) -> StoreResult<FileStat> {
        if self.offline {
            return Err(StoreError::Backend("object store is offline".to_string()));
        }
        self.lock().insert(path.to_string(), bytes.to_vec());
        Ok(FileStat {
            path: path.to_string(),
            size: bytes.len() as u64,
        })
    }

    fn make_url(&self, path: &str, download: bool) -> StoreResult<ShareUrl> {
        if !self.lock().contains_key(path) {
            return Err(StoreError::RecordNotFound {
                table: "files".to_string(),
                id: path.to_string(),
            });
        }
        let suffix = if download { "?dl=1" } else { "" };
        Ok(ShareUrl {
            url: format!("{}{}{}", self.base_url, path, suffix),
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryObjectStore, MemoryTable};
    use crate::model::value::{fields, FieldValue};
    use crate::store::{ObjectStore, StoreError, Table};

    #[test]
    fn update_merges_and_keeps_other_fields() {
        let table = MemoryTable::new("t");
        let record = table.insert(fields([("a", "1"), ("b", "2")])).unwrap();
        let updated = table.update(&record.id, fields([("b", "3")])).unwrap();
        assert_eq!(updated.get("a"), Some(&FieldValue::from("1")));
        assert_eq!(updated.get("b"), Some(&FieldValue::from("3")));
    }

    #[test]
    fn list_remove_only_drops_first_match_and_ignores_missing() {
        let table = MemoryTable::new("t");
        let record = table
            .insert(fields([("notes", vec!["a".to_string(), "b".to_string(), "a".to_string()])]))
            .unwrap();

        let after = table.list_remove(&record.id, "notes", "a").unwrap();
        assert_eq!(after.get("notes").unwrap().as_list().unwrap(), ["b", "a"]);

        let unchanged = table.list_remove(&record.id, "notes", "zzz").unwrap();
        assert_eq!(unchanged.get("notes").unwrap().as_list().unwrap(), ["b", "a"]);
    }

    #[test]
    fn list_push_rejects_non_list_fields() {
        let table = MemoryTable::new("t");
        let record = table.insert(fields([("notes", "text")])).unwrap();
        let err = table.list_push(&record.id, "notes", "x").unwrap_err();
        assert!(matches!(err, StoreError::FieldTypeMismatch { expected: "list", .. }));
    }

    #[test]
    fn delete_missing_record_is_not_found() {
        let table = MemoryTable::new("t");
        let err = table.delete_record("nope").unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound { .. }));
    }

    #[test]
    fn share_urls_are_permanent_and_only_for_written_paths() {
        let store = MemoryObjectStore::new("https://files.test/");
        store.write_file("/text/a.txt", b"a").unwrap();

        let view = store.make_url("/text/a.txt", false).unwrap();
        assert_eq!(view.url, "https://files.test/text/a.txt");
        assert_eq!(view.expires_at, None);
        assert!(matches!(
            store.make_url("/text/b.txt", true).unwrap_err(),
            StoreError::RecordNotFound { .. }
        ));
    }
}
