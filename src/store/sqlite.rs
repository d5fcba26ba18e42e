//! SQLite-backed content store.
//!
//! A single connection sits behind a mutex; every operation runs on tokio's
//! blocking pool. Uniqueness of `name` is a table constraint, so concurrent
//! inserts of the same name are decided by SQLite itself.
//!
//! ## Tables
//!
//! - `content` - one row per record, `content` column holds the JSON payload
//! - `schema_version` - single-row schema version marker

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{ffi, params, params_from_iter, Connection, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ContentFilter, ContentStore, StoreError};
use crate::domain::{ContentRecord, NewContentRecord, RecordId};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

const CONTENT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    id          TEXT PRIMARY KEY,
    type        TEXT NOT NULL,
    name        TEXT NOT NULL UNIQUE,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_content_type ON content(type);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, type, name, content, created_at, updated_at FROM content";

/// Content store backed by a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!("Opening content database at {}", path.display());

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("Failed to open SQLite: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| StoreError::Backend(format!("Failed to set PRAGMA: {}", e)))?;

        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory content database");

        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Backend(format!("Failed to open in-memory SQLite: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn create(&self, record: NewContentRecord) -> Result<ContentRecord, StoreError> {
        self.with_conn(move |conn| insert_record(conn, record)).await
    }

    async fn find(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| find_records(conn, &filter)).await
    }

    async fn delete_one(&self, id: &RecordId) -> Result<(), StoreError> {
        let id = id.clone();
        self.with_conn(move |conn| {
            let changes = conn
                .execute("DELETE FROM content WHERE id = ?1", params![id.as_str()])
                .map_err(|e| StoreError::Backend(format!("Delete failed: {}", e)))?;

            debug!(%id, changes, "delete");
            Ok(())
        })
        .await
    }
}

/// Initialize the database schema
fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| StoreError::Backend(format!("Failed to create schema_version table: {}", e)))?;

    let current_version: i32 =
        match conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0)) {
            Ok(version) => version,
            Err(rusqlite::Error::QueryReturnedNoRows) => 0,
            Err(e) => {
                return Err(StoreError::Backend(format!(
                    "Failed to read schema_version: {}",
                    e
                )))
            }
        };

    if current_version >= SCHEMA_VERSION {
        debug!("Content schema is up to date (v{})", current_version);
        return Ok(());
    }

    info!("Creating content schema v{}", SCHEMA_VERSION);

    conn.execute_batch(CONTENT_SCHEMA)
        .map_err(|e| StoreError::Backend(format!("Failed to create content table: {}", e)))?;

    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| StoreError::Backend(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )
    .map_err(|e| StoreError::Backend(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

fn insert_record(conn: &Connection, record: NewContentRecord) -> Result<ContentRecord, StoreError> {
    let id = RecordId::new(Uuid::new_v4().to_string());
    let now = Utc::now();
    let stamp = format_timestamp(&now);

    let content = serde_json::to_string(record.content())
        .map_err(|e| StoreError::Backend(format!("Failed to serialize content: {}", e)))?;

    conn.execute(
        "INSERT INTO content (id, type, name, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id.as_str(),
            record.category(),
            record.name(),
            content,
            stamp,
            stamp
        ],
    )
    .map_err(|e| insert_error(e, record.name()))?;

    Ok(ContentRecord {
        id,
        category: record.category().to_string(),
        name: record.name().to_string(),
        content: record.content().clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Only a UNIQUE violation (the `name` column) is a conflict
fn insert_error(err: rusqlite::Error, name: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Conflict {
                field: "name".to_string(),
                value: name.to_string(),
            }
        }
        e => StoreError::Backend(format!("Insert failed: {}", e)),
    }
}

fn find_records(
    conn: &Connection,
    filter: &ContentFilter,
) -> Result<Vec<ContentRecord>, StoreError> {
    let mut sql = SELECT_COLUMNS.to_string();
    let mut args: Vec<&str> = Vec::new();

    if let Some(category) = &filter.category {
        sql.push_str(" WHERE type = ?1");
        args.push(category);
    }
    sql.push_str(" ORDER BY rowid");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::Backend(format!("Query prepare failed: {}", e)))?;

    let rows = stmt
        .query_map(params_from_iter(args), record_from_row)
        .map_err(|e| StoreError::Backend(format!("Query failed: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Backend(format!("Row parse failed: {}", e)))
}

fn record_from_row(row: &Row) -> Result<ContentRecord, rusqlite::Error> {
    let content: String = row.get(3)?;
    let content = serde_json::from_str(&content)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(ContentRecord {
        id: RecordId::new(row.get::<_, String>(0)?),
        category: row.get(1)?,
        name: row.get(2)?,
        content,
        created_at: timestamp_at(row, 4)?,
        updated_at: timestamp_at(row, 5)?,
    })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_at(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn new_record(category: &str, label: &str, content: serde_json::Value) -> NewContentRecord {
        NewContentRecord::new(
            category.to_string(),
            crate::domain::record::canonical_name(category, label),
            content,
        )
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = SqliteStore::open_in_memory().unwrap();

        let record = store
            .create(new_record("text", "welcome", json!("hello")))
            .await
            .unwrap();

        assert!(Uuid::parse_str(record.id.as_str()).is_ok());
        assert_eq!(record.name, "text:welcome");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_find_round_trips_records() {
        let store = SqliteStore::open_in_memory().unwrap();

        let created = store
            .create(new_record("text", "doc", json!({"nested": [1, 2, 3]})))
            .await
            .unwrap();

        let found = store.find(&ContentFilter::all()).await.unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_find_filters_by_category_in_insert_order() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.create(new_record("text", "b", json!("1"))).await.unwrap();
        store
            .create(new_record("url", "a", json!("https://a.example")))
            .await
            .unwrap();
        store.create(new_record("text", "a", json!("2"))).await.unwrap();

        let text = store.find(&ContentFilter::by_category("text")).await.unwrap();
        let names: Vec<_> = text.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["text:b", "text:a"]);

        let none = store.find(&ContentFilter::by_category("video")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .create(new_record("text", "welcome", json!("hello")))
            .await
            .unwrap();
        let err = store
            .create(new_record("text", "welcome", json!("again")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict { ref field, ref value }
                if field == "name" && value == "text:welcome"
        ));
    }

    #[tokio::test]
    async fn test_other_constraint_failures_are_backend_errors() {
        let store = SqliteStore::open_in_memory().unwrap();
        let existing = store
            .create(new_record("text", "first", json!("one")))
            .await
            .unwrap();

        let conn = store.conn.lock().unwrap();
        let insert = "INSERT INTO content (id, type, name, content, created_at, updated_at)
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

        // Primary key collision under a fresh name
        let err = conn
            .execute(
                insert,
                params![existing.id.as_str(), "text", "text:second", "\"two\"", "t", "t"],
            )
            .unwrap_err();
        assert!(matches!(
            insert_error(err, "text:second"),
            StoreError::Backend(_)
        ));

        // NOT NULL violation
        let err = conn
            .execute(
                insert,
                params![
                    "fresh-id",
                    Option::<String>::None,
                    "text:third",
                    "\"three\"",
                    "t",
                    "t"
                ],
            )
            .unwrap_err();
        assert!(matches!(insert_error(err, "text:third"), StoreError::Backend(_)));

        // Name collision
        let err = conn
            .execute(
                insert,
                params!["other-id", "text", "text:first", "\"dup\"", "t", "t"],
            )
            .unwrap_err();
        assert!(matches!(
            insert_error(err, "text:first"),
            StoreError::Conflict { .. }
        ));
    }

    #[test]
    fn test_unreadable_schema_version_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL);
             INSERT INTO schema_version (version) VALUES ('not-a-number');",
        )
        .unwrap();

        let err = init_schema(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref msg) if msg.contains("schema_version")));
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();

        let record = store
            .create(new_record("text", "gone", json!("bye")))
            .await
            .unwrap();

        store.delete_one(&record.id).await.unwrap();
        store.delete_one(&record.id).await.unwrap();
        store.delete_one(&RecordId::from("never-existed")).await.unwrap();

        assert!(store.find(&ContentFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("content.db");

        let created = {
            let store = SqliteStore::open(&path).unwrap();
            store
                .create(new_record("url", "docs", json!("https://docs.rs")))
                .await
                .unwrap()
        };

        let reopened = SqliteStore::open(&path).unwrap();
        let found = reopened.find(&ContentFilter::by_category("url")).await.unwrap();
        assert_eq!(found, vec![created]);
    }
}
