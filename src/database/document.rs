//! Documents, queries and write operations understood by every store backend

use std::cmp::Ordering;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use crate::utils::errors::{Result, UniExpError};

/// Largest value list accepted by an `In` filter
pub const MAX_IN_VALUES: usize = 10;

/// Collection names and sub-collection paths
pub mod collections {
    pub const EVENT: &str = "event";
    pub const REGISTRATION: &str = "registration";
    pub const USER: &str = "user";
    pub const QUEST: &str = "quest";
    pub const QUEST_PROGRESS: &str = "questProgress";
    pub const FEEDBACK: &str = "feedback";
    pub const MERCHANDISE: &str = "merchandise";
    pub const REDEMPTION: &str = "redemption";

    /// `quest/{id}/questList`
    pub fn quest_list(quest_doc_id: &str) -> String {
        format!("{}/{}/questList", QUEST, quest_doc_id)
    }

    /// `questProgress/{id}/questProgressList`
    pub fn quest_progress_list(progress_doc_id: &str) -> String {
        format!("{}/{}/questProgressList", QUEST_PROGRESS, progress_doc_id)
    }
}

/// A stored record: its id plus the top-level field map
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

/// One emission of a subscription: every document matching the query
pub type Snapshot = Vec<Document>;

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Deserialize into a model; the document id is exposed as field `id`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Serialize a model into a top-level field map
pub fn encode<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(UniExpError::InvalidInput(format!(
            "records must serialize to an object, got {}",
            other
        ))),
    }
}

/// Order two field values the way the store does.
///
/// RFC 3339 strings compare chronologically, numbers numerically and other
/// strings lexically. Values of different kinds are unordered.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    left == right || compare_values(left, right) == Some(Ordering::Equal)
}

/// A single query predicate on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lt(String, Value),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::In(field, _) | Filter::Gte(field, _) | Filter::Lt(field, _) => field,
        }
    }

    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        let Some(actual) = data.get(self.field()) else {
            return false;
        };

        match self {
            Filter::Eq(_, expected) => values_equal(actual, expected),
            Filter::In(_, candidates) => candidates.iter().any(|c| values_equal(actual, c)),
            Filter::Gte(_, bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(_, bound) => compare_values(actual, bound) == Some(Ordering::Less),
        }
    }
}

/// A filtered view of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn where_in<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In(field.to_string(), values));
        self
    }

    pub fn where_gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(field.to_string(), value.into()));
        self
    }

    pub fn where_lt(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lt(field.to_string(), value.into()));
        self
    }

    /// Reject queries the store would refuse
    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() {
            return Err(UniExpError::InvalidInput("query collection is empty".to_string()));
        }

        for filter in &self.filters {
            if let Filter::In(field, values) = filter {
                if values.is_empty() {
                    return Err(UniExpError::InvalidInput(format!(
                        "'in' filter on {} needs at least one value",
                        field
                    )));
                }
                if values.len() > MAX_IN_VALUES {
                    return Err(UniExpError::InvalidInput(format!(
                        "'in' filter on {} accepts at most {} values, got {}",
                        field,
                        MAX_IN_VALUES,
                        values.len()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(&document.data))
    }

    /// Equality predicates as one object, for containment push-down
    pub fn equality_object(&self) -> Map<String, Value> {
        self.filters
            .iter()
            .filter_map(|filter| match filter {
                Filter::Eq(field, value) => Some((field.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }
}

/// A change to one top-level field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    Delete,
    Increment(i64),
    ServerTimestamp,
}

pub type FieldUpdates = Vec<(String, FieldUpdate)>;

/// Apply field updates in order, resolving server timestamps to `now`
pub fn apply_updates(data: &mut Map<String, Value>, updates: &[(String, FieldUpdate)], now: DateTime<Utc>) {
    for (field, update) in updates {
        match update {
            FieldUpdate::Set(value) => {
                data.insert(field.clone(), value.clone());
            }
            FieldUpdate::Delete => {
                data.remove(field);
            }
            FieldUpdate::Increment(delta) => {
                let current = data.get(field).and_then(Value::as_i64).unwrap_or(0);
                data.insert(field.clone(), Value::from(current + delta));
            }
            FieldUpdate::ServerTimestamp => {
                data.insert(field.clone(), serde_json::to_value(now).unwrap_or(Value::Null));
            }
        }
    }
}

/// One write of an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        data: Map<String, Value>,
    },
    Update {
        collection: String,
        id: String,
        fields: FieldUpdates,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. } | WriteOp::Update { collection, .. } | WriteOp::Delete { collection, .. } => {
                collection
            }
        }
    }
}
