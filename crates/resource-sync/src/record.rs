//! # Records and Collections
//!
//! A [`Record`] is one row of a remote resource. The engine only ever looks at two of its
//! attributes: the identifier and the creation timestamp. Everything else lives in
//! [`Record::fields`] and is opaque until a typed layer decodes it with
//! [`Record::decode`].
//!
//! A [`Collection`] is the ordered sequence of records held by one cache instance. Its
//! order is exactly the order returned by the last successful fetch.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// A write payload: column name to JSON value.
pub type Payload = Map<String, Value>;

/// Identifier of a record within its resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a remote resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Payload,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, created_at: DateTime<Utc>, fields: Payload) -> Self {
        Self {
            id: id.into(),
            created_at,
            fields,
        }
    }

    /// Returns a column value by name. `id` and `created_at` are served from the typed
    /// attributes so ordering can treat every column the same way.
    pub fn column(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.0.clone())),
            "created_at" => Some(Value::String(self.created_at.to_rfc3339())),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Decodes the record into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }
}

/// The ordered set of records cached for one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Identifiers in collection order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Decodes every record, skipping rows that do not fit `T`.
    pub fn decode_all<T: DeserializeOwned>(&self) -> Vec<T> {
        self.records.iter().filter_map(|r| r.decode().ok()).collect()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
