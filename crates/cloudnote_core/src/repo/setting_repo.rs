//! Setting repository.
//!
//! # Responsibility
//! - Provide setting CRUD over the settings table.
//! - Provide typed value changes (`change_value`, `toggle`).
//!
//! # Invariants
//! - Setting values are scalar: string, bool, number or null.
//! - Settings have no timestamps; updates never add `modified`.

use super::{
    check_field_types, decode_all, FieldType, RecordKind, RepoError, RepoResult, TableBinding,
};
use crate::config::ClientConfig;
use crate::model::field;
use crate::model::setting::{Setting, SettingValue};
use crate::model::value::{fields, FieldValue, Fields};
use crate::store::StoreHandle;
use log::info;
use std::sync::Arc;

/// Setting use-case repository.
#[derive(Clone)]
pub struct SettingRepository {
    settings: Arc<TableBinding>,
}

impl SettingRepository {
    pub fn new(handle: StoreHandle, config: &ClientConfig) -> Self {
        Self {
            settings: Arc::new(TableBinding::new(
                handle,
                config.settings_table.as_str(),
                config.open_timeout(),
            )),
        }
    }

    /// Lists settings matching `filter`; an empty filter lists all.
    pub fn query(&self, filter: &Fields) -> RepoResult<Vec<Setting>> {
        let table = self.settings.now()?;
        decode_all(table.query(filter)?, Setting::from_record)
    }

    /// Same as `query`, waiting for the store to open first.
    pub fn deferred_query(&self, filter: &Fields) -> RepoResult<Vec<Setting>> {
        let table = self.settings.wait()?;
        decode_all(table.query(filter)?, Setting::from_record)
    }

    pub fn get(&self, id: &str) -> RepoResult<Option<Setting>> {
        let table = self.settings.now()?;
        match table.get(id)? {
            Some(record) => Ok(Some(Setting::from_record(&record)?)),
            None => Ok(None),
        }
    }

    pub fn create(&self, name: &str, value: impl Into<SettingValue>) -> RepoResult<Setting> {
        if name.is_empty() {
            return Err(RepoError::InvalidArgument(
                "setting name must not be empty".to_string(),
            ));
        }
        let value: SettingValue = value.into();
        let mut values = fields([(field::NAME, name)]);
        values.insert(field::VALUE.to_string(), FieldValue::from(value));

        let table = self.settings.now()?;
        let setting = Setting::from_record(&table.insert(values)?)?;
        info!(
            "event=setting_create module=repo status=ok setting_id={}",
            setting.id
        );
        Ok(setting)
    }

    /// Merges `props` into the setting.
    ///
    /// A `name` entry must be text and a `value` entry a scalar; anything
    /// else is rejected before the write.
    pub fn update(&self, id: &str, props: Fields) -> RepoResult<Setting> {
        let existing = self.require(id)?;
        check_field_types(&props, &[(field::NAME, FieldType::Text)])?;
        if let Some(value) = props.get(field::VALUE) {
            if matches!(value, FieldValue::Date(_) | FieldValue::List(_)) {
                return Err(RepoError::InvalidArgument(format!(
                    "setting value must be string, bool, number or null, got {}",
                    value.type_name()
                )));
            }
        }
        let table = self.settings.now()?;
        Ok(Setting::from_record(&table.update(&existing.id, props)?)?)
    }

    /// Deletes a setting and returns its last snapshot.
    pub fn delete(&self, id: &str) -> RepoResult<Setting> {
        let existing = self.require(id)?;
        let table = self.settings.now()?;
        let deleted = Setting::from_record(&table.delete_record(&existing.id)?)?;
        info!(
            "event=setting_delete module=repo status=ok setting_id={}",
            deleted.id
        );
        Ok(deleted)
    }

    /// Returns the first setting named `name`.
    pub fn get_by_name(&self, name: &str) -> RepoResult<Option<Setting>> {
        Ok(self
            .query(&fields([(field::NAME, name)]))?
            .into_iter()
            .next())
    }

    /// Replaces the value of the setting with `id`.
    pub fn change_value(&self, id: &str, new_value: impl Into<SettingValue>) -> RepoResult<Setting> {
        let new_value: SettingValue = new_value.into();
        let existing = self.require(id)?;
        let table = self.settings.now()?;
        let record = table.set(&existing.id, field::VALUE, FieldValue::from(new_value))?;
        Ok(Setting::from_record(&record)?)
    }

    /// Flips a boolean setting and returns the updated setting.
    ///
    /// # Errors
    /// - `TypeMismatch` when the current value is not a bool.
    pub fn toggle(&self, id: &str) -> RepoResult<Setting> {
        let existing = self.require(id)?;
        let current = match &existing.value {
            SettingValue::Bool(value) => *value,
            other => {
                return Err(RepoError::TypeMismatch {
                    id: existing.id.clone(),
                    expected: "bool",
                    found: other.type_name(),
                })
            }
        };
        let table = self.settings.now()?;
        let record = table.set(&existing.id, field::VALUE, FieldValue::Bool(!current))?;
        Ok(Setting::from_record(&record)?)
    }

    fn require(&self, id: &str) -> RepoResult<Setting> {
        self.get(id)?
            .ok_or_else(|| RepoError::not_found(RecordKind::Setting, id))
    }
}
