//! SQLite-backed document store.
//!
//! Each document is stored whole as a JSON body in its collection's table.
//! The connection sits behind a `Mutex`, so every single-document operation
//! is atomic with respect to the others.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::schema::{apply_schema, read_schema_version};
use crate::model::{Collection, Document, RecordId};

/// Errors from the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("document encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("lock poisoned: {0}")]
    Lock(String),
}

/// Document store over a single SQLite database.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and applying the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        debug!(path = %path.display(), "opened document store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// A private in-memory database, dropped with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version stamped in the database.
    pub fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let conn = self.lock()?;
        Ok(read_schema_version(&conn)?)
    }

    /// All documents of `T`'s collection in insertion order.
    pub fn list<T: Document>(&self) -> Result<Vec<T>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT body FROM {} ORDER BY created_at, rowid",
            T::COLLECTION.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for body in rows {
            docs.push(serde_json::from_str(&body?)?);
        }
        Ok(docs)
    }

    /// Fetch one document by id.
    pub fn get<T: Document>(&self, id: &RecordId) -> Result<Option<T>, StoreError> {
        let conn = self.lock()?;
        fetch_body(&conn, T::COLLECTION, id)?
            .map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Whether a record with `id` exists in `collection`.
    pub fn exists(&self, collection: Collection, id: &RecordId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", collection.table());
        let found = conn
            .query_row(&sql, params![id.as_str()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a new document.
    pub fn insert<T: Document>(&self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(doc)?;
        let now = now_epoch_millis();
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO {} (id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            T::COLLECTION.table()
        );
        conn.execute(&sql, params![doc.id().as_str(), body, now, now])?;
        debug!(collection = %T::COLLECTION, id = %doc.id(), "inserted document");
        Ok(())
    }

    /// Overwrite an existing document. Fails with `NotFound` if it is gone.
    pub fn replace<T: Document>(&self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(doc)?;
        let conn = self.lock()?;
        let sql = format!(
            "UPDATE {} SET body = ?1, updated_at = ?2 WHERE id = ?3",
            T::COLLECTION.table()
        );
        let rows = conn.execute(&sql, params![body, now_epoch_millis(), doc.id().as_str()])?;
        if rows == 0 {
            return Err(StoreError::NotFound(doc.id().to_string()));
        }
        debug!(collection = %T::COLLECTION, id = %doc.id(), "replaced document");
        Ok(())
    }

    /// Delete a document, returning it if it existed.
    pub fn remove<T: Document>(&self, id: &RecordId) -> Result<Option<T>, StoreError> {
        let conn = self.lock()?;
        let Some(body) = fetch_body(&conn, T::COLLECTION, id)? else {
            return Ok(None);
        };
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::COLLECTION.table());
        conn.execute(&sql, params![id.as_str()])?;
        debug!(collection = %T::COLLECTION, id = %id, "removed document");
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

fn fetch_body(
    conn: &Connection,
    collection: Collection,
    id: &RecordId,
) -> Result<Option<String>, StoreError> {
    let sql = format!("SELECT body FROM {} WHERE id = ?1", collection.table());
    Ok(conn
        .query_row(&sql, params![id.as_str()], |row| row.get(0))
        .optional()?)
}

fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
