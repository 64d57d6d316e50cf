//! SQLite implementation of ILocalStore
//!
//! Rows are exchanged as [`Record`]s. Every table and column name that ends
//! up in SQL text comes from the Entity Key Registry; values are always
//! bound as parameters.
//!
//! ## Type Mapping
//!
//! | JSON value     | Bound as       | Read back as            |
//! |----------------|----------------|-------------------------|
//! | null           | NULL           | null                    |
//! | bool           | INTEGER (0/1)  | number                  |
//! | integer        | INTEGER        | number (TEXT columns store it as text) |
//! | float          | REAL           | number (TEXT columns store it as text) |
//! | string         | TEXT           | string                  |
//! | array / object | TEXT (JSON)    | string                  |

use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use bulletin_core::domain::entity::LOCAL_SYNC_COLUMN;
use bulletin_core::domain::{EntityKind, EntitySpec, NaturalKey, Record, StorageError};
use bulletin_core::ports::{ILocalStore, RowFilter, UpsertOutcome};

use crate::{pool, query_failed};

/// SQLite-based implementation of the local store port
///
/// Cheap to clone; all clones share the connection pool.
#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    /// Creates a new store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for value conversion
// ============================================================================

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds a JSON value as the next positional parameter
fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Decodes one column of a row according to its runtime storage class
fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, StorageError> {
    let raw = row.try_get_raw(index).map_err(query_failed)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    let decode_err =
        |e: sqlx::Error| StorageError::SerializationError(format!("column {index}: {e}"));

    let value = match storage_class.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index).map_err(decode_err)?),
        "REAL" => {
            let f: f64 = row.try_get(index).map_err(decode_err)?;
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(index).map_err(decode_err)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get::<String, _>(index).map_err(decode_err)?),
    };
    Ok(value)
}

/// Reconstructs a Record from a database row, keeping every column
fn record_from_row(row: &SqliteRow) -> Result<Record, StorageError> {
    row.columns()
        .iter()
        .map(|column| Ok((column.name().to_string(), decode_column(row, column.ordinal())?)))
        .collect()
}

/// `"k1" = ? AND "k2" = ?` for the entity's natural key
fn natural_key_predicate(spec: &EntitySpec) -> String {
    spec.natural_key
        .iter()
        .map(|column| format!("\"{column}\" = ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Normalizes an incoming record: drops local and undeclared columns and
/// extracts its natural key
fn prepare(spec: &EntitySpec, record: &Record) -> Result<(Record, NaturalKey), StorageError> {
    let mut clean = record.clone();
    clean.strip_local_columns();
    let dropped = clean.retain_declared(spec);
    if !dropped.is_empty() {
        tracing::debug!(table = spec.table, ?dropped, "Ignoring undeclared columns");
    }
    let key = clean.natural_key(spec)?;
    Ok((clean, key))
}

// ============================================================================
// Connection-level operations (shared by single and batch upserts)
// ============================================================================

async fn find_id(
    conn: &mut SqliteConnection,
    spec: &EntitySpec,
    key: &NaturalKey,
) -> Result<Option<i64>, StorageError> {
    let sql = format!(
        "SELECT id FROM \"{}\" WHERE {}",
        spec.table,
        natural_key_predicate(spec)
    );
    let mut query = sqlx::query(&sql);
    for (_, value) in key.parts() {
        query = bind_value(query, value);
    }
    let row = query.fetch_optional(&mut *conn).await.map_err(query_failed)?;
    row.map(|r| r.try_get::<i64, _>("id").map_err(query_failed))
        .transpose()
}

async fn upsert_on(
    conn: &mut SqliteConnection,
    spec: &EntitySpec,
    record: &Record,
) -> Result<UpsertOutcome, StorageError> {
    let (clean, key) = prepare(spec, record)?;

    if let Some(id) = find_id(conn, spec, &key).await? {
        let updates: Vec<(&String, &Value)> = clean
            .iter()
            .filter(|(column, _)| !spec.is_key_column(column))
            .collect();

        let mut assignments: Vec<String> = updates
            .iter()
            .map(|(column, _)| format!("\"{column}\" = ?"))
            .collect();
        assignments.push(format!("\"{LOCAL_SYNC_COLUMN}\" = CURRENT_TIMESTAMP"));

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE id = ?",
            spec.table,
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for (_, value) in &updates {
            query = bind_value(query, value);
        }
        query
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(query_failed)?;

        tracing::trace!(table = spec.table, id, key = %key, "Updated row");
        return Ok(UpsertOutcome::Updated(id));
    }

    let columns: Vec<&String> = clean.iter().map(|(column, _)| column).collect();
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        spec.table,
        columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    let mut query = sqlx::query(&sql);
    for (_, value) in clean.iter() {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut *conn).await.map_err(query_failed)?;
    let id = result.last_insert_rowid();

    tracing::trace!(table = spec.table, id, key = %key, "Inserted row");
    Ok(UpsertOutcome::Inserted(id))
}

// ============================================================================
// ILocalStore implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalStore for SqliteLocalStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        pool::apply_schema(&self.pool).await
    }

    async fn query(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Record>, StorageError> {
        let spec = entity.spec();

        let rows = match filter {
            Some(filter) => {
                if !spec.has_column(&filter.column) {
                    return Err(StorageError::QueryFailed(format!(
                        "{} has no column '{}'",
                        spec.table, filter.column
                    )));
                }
                let sql = format!(
                    "SELECT * FROM \"{}\" WHERE \"{}\" = ? ORDER BY id",
                    spec.table, filter.column
                );
                sqlx::query(&sql)
                    .bind(&filter.value)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!("SELECT * FROM \"{}\" ORDER BY id", spec.table);
                sqlx::query(&sql).fetch_all(&self.pool).await
            }
        }
        .map_err(query_failed)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn find_by_natural_key(
        &self,
        entity: EntityKind,
        record: &Record,
    ) -> Result<Option<Record>, StorageError> {
        let spec = entity.spec();
        let key = record.natural_key(spec)?;

        let sql = format!(
            "SELECT * FROM \"{}\" WHERE {}",
            spec.table,
            natural_key_predicate(spec)
        );
        let mut query = sqlx::query(&sql);
        for (_, value) in key.parts() {
            query = bind_value(query, value);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn upsert_by_natural_key(
        &self,
        entity: EntityKind,
        record: &Record,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        let outcome = upsert_on(&mut *tx, entity.spec(), record).await?;
        tx.commit().await.map_err(query_failed)?;
        Ok(outcome)
    }

    async fn upsert_batch(
        &self,
        entity: EntityKind,
        records: &[Record],
    ) -> Result<Vec<UpsertOutcome>, StorageError> {
        let spec = entity.spec();
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            // An early return drops `tx`, which rolls the batch back.
            outcomes.push(upsert_on(&mut *tx, spec, record).await?);
        }

        tx.commit().await.map_err(query_failed)?;

        tracing::debug!(
            table = spec.table,
            count = outcomes.len(),
            "Committed upsert batch"
        );
        Ok(outcomes)
    }
}
