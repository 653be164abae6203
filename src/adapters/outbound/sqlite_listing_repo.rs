//! SQLite Listing Repository
//!
//! Implements ListingRepository using SQLite for storage. Each listing is
//! kept as its JSON document, keyed by `_id`; `seq` records insertion order.

use crate::domain::entities::{Listing, ListingPatch};
use crate::domain::ports::{ListingRepository, StoreError};
use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS listings (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id  TEXT NOT NULL UNIQUE,
    doc TEXT NOT NULL
)";

/// SQLite-backed listing repository.
///
/// A single connection is shared behind a mutex; every call runs on the
/// blocking thread pool.
pub struct SqliteListingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteListingRepository {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(db_path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening listings database {}", db_path))?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or replace listings by `_id`. New ids go to the end.
    pub async fn upsert_all(&self, listings: Vec<Listing>) -> Result<usize, StoreError> {
        let mut rows = Vec::with_capacity(listings.len());
        for listing in listings {
            let id = listing
                .id()
                .ok_or_else(|| StoreError::InvalidDocument("listing without _id".to_string()))?;
            let doc = serde_json::to_string(&listing).map_err(anyhow::Error::from)?;
            rows.push((id, doc));
        }

        self.blocking(move |conn| {
            let tx = conn.transaction().map_err(anyhow::Error::from)?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO listings (id, doc) VALUES (?1, ?2)
                         ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
                    )
                    .map_err(anyhow::Error::from)?;
                for (id, doc) in &rows {
                    stmt.execute(params![id, doc]).map_err(anyhow::Error::from)?;
                }
            }
            tx.commit().map_err(anyhow::Error::from)?;
            Ok(rows.len())
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("spawn_blocking error: {:?}", e)))?
    }

    fn decode(doc: &str) -> Result<Listing, StoreError> {
        serde_json::from_str(doc).map_err(|e| StoreError::InvalidDocument(e.to_string()))
    }
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let doc: Option<String> = conn
                .query_row("SELECT doc FROM listings WHERE id = ?1", [&id], |row| row.get(0))
                .optional()
                .map_err(anyhow::Error::from)?;
            match doc {
                Some(doc) => Self::decode(&doc),
                None => Err(StoreError::NotFound(id)),
            }
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT doc FROM listings ORDER BY seq")
                .map_err(anyhow::Error::from)?;
            let docs = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(anyhow::Error::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(anyhow::Error::from)?;
            docs.iter().map(|doc| Self::decode(doc)).collect()
        })
        .await
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> Result<(), StoreError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let tx = conn.transaction().map_err(anyhow::Error::from)?;
            let doc: Option<String> = tx
                .query_row("SELECT doc FROM listings WHERE id = ?1", [&id], |row| row.get(0))
                .optional()
                .map_err(anyhow::Error::from)?;
            let Some(doc) = doc else {
                return Err(StoreError::NotFound(id));
            };

            let mut listing = Self::decode(&doc)?;
            listing.apply(&patch);
            let doc = serde_json::to_string(&listing).map_err(anyhow::Error::from)?;

            tx.execute("UPDATE listings SET doc = ?1 WHERE id = ?2", params![doc, id])
                .map_err(anyhow::Error::from)?;
            tx.commit().map_err(anyhow::Error::from)?;
            Ok(())
        })
        .await
    }
}
