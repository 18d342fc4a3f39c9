use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe SQLite store
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                image_url TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS blobs (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                data BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_thoughts_created_at ON thoughts(created_at);
            "#,
        )?;
        Ok(())
    }

    // ==================== Thought Operations ====================

    pub fn create_thought(&self, content: &str, image_url: Option<&str>) -> StoreResult<Thought> {
        let conn = self.conn()?;
        let created_at = Utc::now().trunc_subsecs(6);

        conn.execute(
            "INSERT INTO thoughts (content, image_url, created_at) VALUES (?1, ?2, ?3)",
            params![content, image_url, format_datetime(&created_at)],
        )?;

        Ok(Thought {
            id: conn.last_insert_rowid(),
            content: content.to_string(),
            image_url: image_url.map(str::to_string),
            created_at,
        })
    }

    /// All thoughts, newest first
    pub fn list_thoughts(&self) -> StoreResult<Vec<Thought>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, content, image_url, created_at FROM thoughts
             ORDER BY created_at DESC, id DESC",
        )?;
        let thoughts = stmt
            .query_map([], row_to_thought)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(thoughts)
    }

    pub fn get_thought(&self, id: i64) -> StoreResult<Thought> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, content, image_url, created_at FROM thoughts WHERE id = ?1",
            params![id],
            row_to_thought,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("Thought {}", id)))
    }

    pub fn delete_thought(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM thoughts WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Thought {}", id)));
        }
        Ok(())
    }

    pub fn count_thoughts(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM thoughts", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Blob Operations ====================

    pub fn create_blob(&self, blob: &mut Blob) -> StoreResult<()> {
        let conn = self.conn()?;
        blob.id = Uuid::new_v4().to_string();
        blob.size = blob.data.len() as i64;
        blob.created_at = Utc::now().trunc_subsecs(6);

        conn.execute(
            r#"INSERT INTO blobs (id, filename, content_type, size, data, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                &blob.id,
                &blob.filename,
                &blob.content_type,
                blob.size,
                &blob.data,
                format_datetime(&blob.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_blob(&self, id: &str) -> StoreResult<Blob> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, filename, content_type, size, data, created_at FROM blobs WHERE id = ?1",
            params![id],
            |row| {
                Ok(Blob {
                    id: row.get("id")?,
                    filename: row.get("filename")?,
                    content_type: row.get("content_type")?,
                    size: row.get("size")?,
                    data: row.get("data")?,
                    created_at: parse_datetime(row.get::<_, String>("created_at")?),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("Blob {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn count_blobs(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_thought(row: &rusqlite::Row) -> rusqlite::Result<Thought> {
    Ok(Thought {
        id: row.get("id")?,
        content: row.get("content")?,
        image_url: row.get("image_url")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

// Fixed-width so that ORDER BY on the text column is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
