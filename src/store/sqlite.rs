//! SQLite-backed implementation of the persistence gateway.
//!
//! A single write connection behind a mutex serializes all statements; the
//! ingestion pipeline is single-threaded, so contention is not a concern.
//! SQL is built dynamically from record field names, which always come from
//! the normalizers, never from external input.

use super::gateway::{Filter, PersistenceGateway, Record};
use super::schema;
use crate::error::PersistenceError;
use anyhow::Result;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

/// JSON scalar lowered to a SQLite parameter.
enum SqlParam {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            SqlParam::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            SqlParam::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            SqlParam::Text(s) => ToSqlOutput::Owned(rusqlite::types::Value::Text(s.clone())),
        })
    }
}

fn to_param(value: &Value) -> SqlParam {
    match value {
        Value::Null => SqlParam::Null,
        Value::Bool(b) => SqlParam::Int(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlParam::Int(i)
            } else {
                SqlParam::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => SqlParam::Text(s.clone()),
        // Nested values never reach the gateway; normalizers flatten them.
        other => SqlParam::Text(other.to_string()),
    }
}

fn from_column(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(r) => Value::from(r),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

impl SqliteGateway {
    /// Open (or create) the metadata database at `db_path` and ensure the
    /// schema exists.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// In-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        if table_count == 0 {
            info!("Creating metadata db schema");
            schema::create_schema(&conn)?;
        } else {
            schema::validate_schema(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn err(collection: &str, cause: rusqlite::Error) -> PersistenceError {
        PersistenceError::new(collection, cause)
    }
}

impl PersistenceGateway for SqliteGateway {
    fn upsert(
        &self,
        collection: &str,
        records: &[Record],
        conflict_keys: &[&str],
    ) -> Result<(), PersistenceError> {
        let conn = self.conn.lock().unwrap();

        for record in records {
            let columns: Vec<&str> = record.keys().map(String::as_str).collect();
            let placeholders = vec!["?"; columns.len()].join(", ");

            let updates: Vec<String> = columns
                .iter()
                .filter(|c| !conflict_keys.contains(c))
                .map(|c| format!("{c} = excluded.{c}"))
                .collect();

            let action = if updates.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", updates.join(", "))
            };

            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
                collection,
                columns.join(", "),
                placeholders,
                conflict_keys.join(", "),
                action
            );

            let params: Vec<SqlParam> = record.values().map(to_param).collect();
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|e| Self::err(collection, e))?;
            stmt.execute(rusqlite::params_from_iter(params.iter()))
                .map_err(|e| Self::err(collection, e))?;
        }
        Ok(())
    }

    fn delete_where(&self, collection: &str, filter: Filter) -> Result<usize, PersistenceError> {
        let conn = self.conn.lock().unwrap();

        let sql = if filter.is_empty() {
            format!("DELETE FROM {}", collection)
        } else {
            let clauses: Vec<String> = filter.iter().map(|(k, _)| format!("{k} = ?")).collect();
            format!("DELETE FROM {} WHERE {}", collection, clauses.join(" AND "))
        };

        let params: Vec<SqlParam> = filter.iter().map(|(_, v)| to_param(v)).collect();
        let deleted = conn
            .execute(&sql, rusqlite::params_from_iter(params.iter()))
            .map_err(|e| Self::err(collection, e))?;
        Ok(deleted)
    }

    fn insert_many(&self, collection: &str, records: &[Record]) -> Result<(), PersistenceError> {
        let conn = self.conn.lock().unwrap();

        for record in records {
            let columns: Vec<&str> = record.keys().map(String::as_str).collect();
            let placeholders = vec!["?"; columns.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                collection,
                columns.join(", "),
                placeholders
            );

            let params: Vec<SqlParam> = record.values().map(to_param).collect();
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|e| Self::err(collection, e))?;
            stmt.execute(rusqlite::params_from_iter(params.iter()))
                .map_err(|e| Self::err(collection, e))?;
        }
        Ok(())
    }

    fn select_where(
        &self,
        collection: &str,
        filter: Filter,
        order_desc_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, PersistenceError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT * FROM {}", collection);
        if !filter.is_empty() {
            let clauses: Vec<String> = filter.iter().map(|(k, _)| format!("{k} = ?")).collect();
            sql.push_str(&format!(" WHERE {}", clauses.join(" AND ")));
        }
        if let Some(order_col) = order_desc_by {
            sql.push_str(&format!(" ORDER BY {} DESC", order_col));
        }
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let params: Vec<SqlParam> = filter.iter().map(|(_, v)| to_param(v)).collect();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| Self::err(collection, e))?;

        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                let mut record = Record::new();
                for (i, name) in column_names.iter().enumerate() {
                    record.insert(name.clone(), from_column(row.get_ref(i)?));
                }
                Ok(record)
            })
            .map_err(|e| Self::err(collection, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Self::err(collection, e))?;

        Ok(rows)
    }
}
