//! Generic store value model.
//!
//! # Responsibility
//! - Mirror the value types a synchronized table record can hold.
//! - Provide lossless conversions used by typed record decoding.
//!
//! # Invariants
//! - `Date` is always Unix epoch milliseconds (UTC).
//! - `List` is ordered and may contain duplicates; callers own uniqueness.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned record identifier.
pub type RecordId = String;

/// Field map used for inserts, partial updates and query filters.
pub type Fields = BTreeMap<String, FieldValue>;

/// One value stored in a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Epoch milliseconds.
    Date(i64),
    /// Ordered list of string values.
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a timestamp for `Date` values and integral `Number` values.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Date(value) => Some(*value),
            Self::Number(value) if value.fract() == 0.0 => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::List(_) => "list",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Builds a field map from `(name, value)` pairs.
///
/// Later pairs override earlier ones with the same name.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Snapshot of one stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns one field value, `None` when the field was never set.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns whether every filter entry equals the stored field.
    ///
    /// An empty filter matches every record.
    pub fn matches(&self, filter: &Fields) -> bool {
        filter
            .iter()
            .all(|(key, expected)| self.fields.get(key) == Some(expected))
    }
}

/// Anything that identifies one record: a plain id or a typed snapshot.
///
/// Repository operations accept `&impl RecordKey` so callers can pass either
/// an id they hold or the record they just read.
pub trait RecordKey {
    fn record_id(&self) -> &str;
}

impl RecordKey for str {
    fn record_id(&self) -> &str {
        self
    }
}

impl RecordKey for String {
    fn record_id(&self) -> &str {
        self.as_str()
    }
}

impl RecordKey for Record {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Field type mismatch found while decoding a record into a typed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecodeError {
    pub record_id: RecordId,
    pub field: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}

impl Display for RecordDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "record `{}` field `{}` expected {}, found {}",
            self.record_id, self.field, self.expected, self.found
        )
    }
}

impl Error for RecordDecodeError {}

pub(crate) fn decode_text(
    record: &Record,
    field: &'static str,
) -> Result<String, RecordDecodeError> {
    match record.get(field) {
        None | Some(FieldValue::Null) => Ok(String::new()),
        Some(FieldValue::Text(value)) => Ok(value.clone()),
        Some(other) => Err(mismatch(record, field, "text", other)),
    }
}

pub(crate) fn decode_timestamp(
    record: &Record,
    field: &'static str,
) -> Result<i64, RecordDecodeError> {
    match record.get(field) {
        None | Some(FieldValue::Null) => Ok(0),
        Some(value) => value
            .as_timestamp()
            .ok_or_else(|| mismatch(record, field, "date", value)),
    }
}

pub(crate) fn decode_list(
    record: &Record,
    field: &'static str,
) -> Result<Vec<String>, RecordDecodeError> {
    match record.get(field) {
        None | Some(FieldValue::Null) => Ok(Vec::new()),
        Some(FieldValue::List(values)) => Ok(values.clone()),
        Some(other) => Err(mismatch(record, field, "list", other)),
    }
}

pub(crate) fn mismatch(
    record: &Record,
    field: &'static str,
    expected: &'static str,
    found: &FieldValue,
) -> RecordDecodeError {
    RecordDecodeError {
        record_id: record.id.clone(),
        field,
        expected,
        found: found.type_name(),
    }
}
