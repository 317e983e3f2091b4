//! SQLite Document Store
//!
//! Keeps each document as one JSON row with a version counter used as the revision.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::traits::{Document, DocumentRef, DocumentStore, Precondition, Revision};
use crate::domain::{DomainError, DomainResult};

/// Local document store backed by one SQLite file
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database file and run migrations
    pub fn open(path: &Path) -> DomainResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path).map_err(storage_error)?;
        tracing::info!("Opened SQLite document store at {}", path.display());
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> DomainResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> DomainResult<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, doc: &DocumentRef) -> DomainResult<Option<Document>> {
        let conn = self.conn.lock().await;
        Ok(load(&conn, doc)?.map(|(fields, version)| Document {
            fields,
            revision: Revision::new(version.to_string()),
        }))
    }

    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: &[Value]) -> DomainResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_error)?;

        let Some((mut fields, version)) = load(&tx, doc)? else {
            return Ok(());
        };
        let Some(Value::Array(items)) = fields.get_mut(field) else {
            return Ok(());
        };
        let before = items.len();
        items.retain(|item| !values.contains(item));
        if items.len() == before {
            return Ok(());
        }

        save(&tx, doc, &fields, version + 1)?;
        tx.commit().map_err(storage_error)
    }

    async fn commit(
        &self,
        doc: &DocumentRef,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> DomainResult<Revision> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_error)?;

        let stored = load(&tx, doc)?;
        let current = stored.as_ref().map(|(_, version)| *version);
        let holds = match (&precondition, current) {
            (Precondition::Missing, None) => true,
            (Precondition::Revision(expected), Some(version)) => expected.as_str() == version.to_string(),
            _ => false,
        };
        if !holds {
            return Err(DomainError::Conflict(format!(
                "{} is at version {:?}, expected {:?}",
                doc, current, precondition
            )));
        }

        let mut merged = stored.map(|(stored_fields, _)| stored_fields).unwrap_or_default();
        merged.extend(fields);
        let next = current.unwrap_or(0) + 1;
        save(&tx, doc, &merged, next)?;
        tx.commit().map_err(storage_error)?;
        Ok(Revision::new(next.to_string()))
    }
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            version INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id)
        )",
    )
    .map_err(storage_error)
}

fn load(conn: &Connection, doc: &DocumentRef) -> DomainResult<Option<(Map<String, Value>, i64)>> {
    let row = conn
        .query_row(
            "SELECT body, version FROM documents WHERE collection = ?1 AND id = ?2",
            params![doc.collection, doc.document],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .map_err(storage_error)?;

    row.map(|(body, version)| {
        let fields = serde_json::from_str(&body)
            .map_err(|e| DomainError::Decode(format!("document {}: {}", doc, e)))?;
        Ok((fields, version))
    })
    .transpose()
}

fn save(conn: &Connection, doc: &DocumentRef, fields: &Map<String, Value>, version: i64) -> DomainResult<()> {
    let body = serde_json::to_string(fields).map_err(|e| DomainError::Storage(e.to_string()))?;
    conn.execute(
        "INSERT INTO documents (collection, id, body, version, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(collection, id) DO UPDATE SET
            body = excluded.body,
            version = excluded.version,
            updated_at = excluded.updated_at",
        params![
            doc.collection,
            doc.document,
            body,
            version,
            chrono::Utc::now().timestamp_millis()
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

fn storage_error(e: rusqlite::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}
