//! # Resource Descriptions
//!
//! A resource is a named remote collection. [`ResourceSpec`] bundles the name with the
//! ordering and column projection a cache asks for on every fetch. The ordering rules in
//! [`OrderBy::compare`] are what an in-process store uses to answer a select, and they are
//! total: equal sort keys fall back to the record id so two reads of an unchanged resource
//! always agree on order.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::Display;

/// Name of a remote collection, e.g. `contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

/// Sort instruction for a full read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Default for OrderBy {
    /// Newest first.
    fn default() -> Self {
        Self::desc("created_at")
    }
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Compares two records by the configured field, ties broken by ascending id.
    /// Missing and null values sort after everything else regardless of direction.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let directed = |o: Ordering| match self.direction {
            Direction::Asc => o,
            Direction::Desc => o.reverse(),
        };
        let primary = if self.field == "created_at" {
            directed(a.created_at.cmp(&b.created_at))
        } else {
            let x = a.column(&self.field).filter(|v| !v.is_null());
            let y = b.column(&self.field).filter(|v| !v.is_null());
            match (x, y) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => directed(compare_values(&x, &y)),
            }
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

/// Columns requested by a read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<String>),
}

impl Projection {
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }

    /// Whether a non-identity column is part of the projection.
    pub fn includes(&self, column: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Columns(cols) => cols.iter().any(|c| c == column),
        }
    }

    /// Ensures `id` and `created_at` are always selected; every record needs them.
    pub fn with_identity(self) -> Self {
        match self {
            Projection::All => Projection::All,
            Projection::Columns(mut cols) => {
                for required in ["created_at", "id"] {
                    if !cols.iter().any(|c| c == required) {
                        cols.insert(0, required.to_string());
                    }
                }
                Projection::Columns(cols)
            }
        }
    }
}

/// Everything a cache needs to know about the collection it mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: ResourceName,
    pub order: OrderBy,
    pub projection: Projection,
}

impl ResourceSpec {
    /// All columns, newest first.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: ResourceName::new(name),
            order: OrderBy::default(),
            projection: Projection::All,
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// A single full read as sent to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub resource: ResourceName,
    pub projection: Projection,
    pub order: OrderBy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn rec(id: &str, secs: i64, title: Option<&str>) -> Record {
        let mut fields = Payload::new();
        if let Some(title) = title {
            fields.insert("title".into(), json!(title));
        }
        Record::new(id, Utc.timestamp_opt(secs, 0).unwrap(), fields)
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let order = OrderBy::default();
        let old = rec("a", 10, None);
        let new = rec("b", 20, None);
        assert_eq!(order.compare(&new, &old), Ordering::Less);
    }

    #[test]
    fn test_ties_break_on_id() {
        let order = OrderBy::desc("created_at");
        let a = rec("a", 10, None);
        let b = rec("b", 10, None);
        assert_eq!(order.compare(&a, &b), Ordering::Less);
        assert_eq!(order.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_missing_values_sort_last_in_both_directions() {
        let with = rec("a", 1, Some("Audit"));
        let without = rec("b", 1, None);
        assert_eq!(OrderBy::asc("title").compare(&without, &with), Ordering::Greater);
        assert_eq!(OrderBy::desc("title").compare(&without, &with), Ordering::Greater);
    }

    #[test]
    fn test_projection_keeps_identity_columns() {
        let p = Projection::columns(["title"]).with_identity();
        assert_eq!(p, Projection::columns(["id", "created_at", "title"]));
    }
}
