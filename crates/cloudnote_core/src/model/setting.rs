//! Setting record model.
//!
//! Settings carry no timestamps. The value keeps the exact type it was
//! written with; no coercion happens across calls.

use crate::model::field;
use crate::model::value::{
    decode_text, mismatch, FieldValue, Record, RecordDecodeError, RecordId, RecordKey,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Value held by one setting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<SettingValue> for FieldValue {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Null => FieldValue::Null,
            SettingValue::Bool(value) => FieldValue::Bool(value),
            SettingValue::Number(value) => FieldValue::Number(value),
            SettingValue::Text(value) => FieldValue::Text(value),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Setting snapshot decoded from the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: RecordId,
    pub name: String,
    pub value: SettingValue,
}

impl Setting {
    pub fn from_record(record: &Record) -> Result<Self, RecordDecodeError> {
        let value = match record.get(field::VALUE) {
            None | Some(FieldValue::Null) => SettingValue::Null,
            Some(FieldValue::Bool(value)) => SettingValue::Bool(*value),
            Some(FieldValue::Number(value)) => SettingValue::Number(*value),
            Some(FieldValue::Text(value)) => SettingValue::Text(value.clone()),
            Some(other) => {
                return Err(mismatch(record, field::VALUE, "string|bool|number|null", other))
            }
        };

        Ok(Self {
            id: record.id.clone(),
            name: decode_text(record, field::NAME)?,
            value,
        })
    }
}

impl RecordKey for Setting {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::{Setting, SettingValue};
    use crate::model::value::{fields, FieldValue, Record};

    #[test]
    fn decodes_each_scalar_value_type() {
        let cases = [
            (FieldValue::Null, SettingValue::Null),
            (FieldValue::Bool(true), SettingValue::Bool(true)),
            (FieldValue::Number(2.5), SettingValue::Number(2.5)),
            (FieldValue::Text("dark".into()), SettingValue::Text("dark".into())),
        ];
        for (stored, expected) in cases {
            let mut record_fields = fields([("name", "theme")]);
            record_fields.insert("value".to_string(), stored);
            let setting = Setting::from_record(&Record::new("s1", record_fields)).unwrap();
            assert_eq!(setting.value, expected);
        }
    }

    #[test]
    fn rejects_list_values() {
        let mut record_fields = fields([("name", "theme")]);
        record_fields.insert("value".to_string(), FieldValue::List(vec![]));
        let err = Setting::from_record(&Record::new("s1", record_fields)).unwrap_err();
        assert_eq!(err.field, "value");
    }
}
