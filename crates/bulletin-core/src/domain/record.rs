//! Row values exchanged between the local store and the remote service
//!
//! A [`Record`] is a column-name to JSON-value mapping. Both adapters speak
//! it: the SQLite store decodes rows into it and the REST client
//! deserializes response objects into it. The [`EntitySpec`] decides which
//! of its columns are meaningful.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::{EntitySpec, LOCAL_SYNC_COLUMN, SURROGATE_KEY_COLUMN};
use super::errors::{DomainError, StorageError};

/// One row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// String value of a column, `None` when absent, null, or not a string
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Surrogate key assigned by the local store, if this row came from it
    pub fn surrogate_id(&self) -> Option<i64> {
        self.0.get(SURROGATE_KEY_COLUMN).and_then(Value::as_i64)
    }

    /// Removes the surrogate key and the local sync timestamp
    ///
    /// Applied to remote rows before they reach the store (the remote `id`
    /// means nothing locally) and to local rows before they are pushed.
    pub fn strip_local_columns(&mut self) {
        self.0.remove(SURROGATE_KEY_COLUMN);
        self.0.remove(LOCAL_SYNC_COLUMN);
    }

    /// Consumes the record and returns the shape the remote service accepts
    pub fn into_remote_shape(mut self) -> Self {
        self.strip_local_columns();
        self
    }

    /// Drops every column the entity does not declare, returning their names
    pub fn retain_declared(&mut self, spec: &EntitySpec) -> Vec<String> {
        let dropped: Vec<String> = self
            .0
            .keys()
            .filter(|column| !spec.columns.contains(&column.as_str()))
            .cloned()
            .collect();
        for column in &dropped {
            self.0.remove(column);
        }
        dropped
    }

    /// Extracts the natural key of this record
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingNaturalKey` if a key column is absent
    /// or null.
    pub fn natural_key(&self, spec: &EntitySpec) -> Result<NaturalKey, StorageError> {
        let mut parts = Vec::with_capacity(spec.natural_key.len());
        for &column in spec.natural_key {
            match self.0.get(column) {
                Some(value) if !value.is_null() => parts.push((column, value.clone())),
                _ => {
                    return Err(StorageError::MissingNaturalKey {
                        table: spec.table,
                        column,
                    })
                }
            }
        }
        Ok(NaturalKey { parts })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::ValidationFailed(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Natural-key tuple of a record, in registry column order
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalKey {
    parts: Vec<(&'static str, Value)>,
}

impl NaturalKey {
    pub fn parts(&self) -> &[(&'static str, Value)] {
        &self.parts
    }
}

impl Display for NaturalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{column}={s}")?,
                other => write!(f, "{column}={other}")?,
            }
        }
        Ok(())
    }
}
