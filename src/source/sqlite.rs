//! SQLite-backed primary source
//!
//! Opens the content database lazily and read-only. A database that cannot be
//! opened is reported as unavailable on every query until it can be, so the
//! site keeps rendering from fallbacks while the file is missing.

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, Row, ToSql};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{PrimarySource, QueryShape, SectionQuery, SourceError};

/// SQLite content database
#[derive(Debug, Clone)]
pub struct SqliteSource {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Database path; `None` for connections supplied by the caller
    db_path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteSource {
    /// Source for the database at `path`; nothing is opened until the first query
    pub fn open_lazy(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                db_path: Some(path.into()),
                conn: Mutex::new(None),
            }),
        }
    }

    /// Source over an already opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Inner {
                db_path: None,
                conn: Mutex::new(Some(conn)),
            }),
        }
    }

    /// Database path, if this source was created from one
    pub fn db_path(&self) -> Option<&Path> {
        self.inner.db_path.as_deref()
    }
}

#[async_trait]
impl PrimarySource for SqliteSource {
    async fn fetch(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        let inner = Arc::clone(&self.inner);
        let query = query.clone();

        tokio::task::spawn_blocking(move || inner.run(&query))
            .await
            .map_err(|e| SourceError::Query(format!("query task failed: {}", e)))?
    }
}

impl Inner {
    fn run(&self, query: &SectionQuery) -> Result<Option<Value>, SourceError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| SourceError::Unavailable(format!("connection lock poisoned: {}", e)))?;

        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        let conn = guard
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable("no connection".to_string()))?;

        let rows = query_rows(conn, query).map_err(|e| SourceError::Query(e.to_string()))?;
        debug!(section = %query.section, rows = rows.len(), "Primary query finished");

        Ok(match query.shape {
            QueryShape::Single => rows.into_iter().next().map(Value::Object),
            QueryShape::List => Some(Value::Array(rows.into_iter().map(Value::Object).collect())),
        })
    }

    fn connect(&self) -> Result<Connection, SourceError> {
        let path = self
            .db_path
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("no database configured".to_string()))?;

        Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
            SourceError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })
    }
}

fn query_rows(conn: &Connection, query: &SectionQuery) -> rusqlite::Result<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(&query.statement)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let bound: Vec<(&str, SqlValue)> = query
        .params
        .iter()
        .map(|(name, value)| (name.as_str(), to_sql_value(value)))
        .collect();
    let params: Vec<(&str, &dyn ToSql)> = bound
        .iter()
        .map(|(name, value)| (*name, value as &dyn ToSql))
        .collect();

    let rows = stmt.query_map(params.as_slice(), |row| row_to_map(row, &columns))?;
    rows.collect()
}

fn row_to_map(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Map<String, Value>> {
    let mut map = Map::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        map.insert(name.clone(), value_as_json(row, idx)?);
    }
    Ok(map)
}

fn value_as_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    })
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
