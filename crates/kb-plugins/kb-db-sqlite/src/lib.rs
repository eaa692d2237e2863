//! # kb-db-sqlite Implementation
//!
//! Maps the document model onto one SQLite table. Each row is a document:
//! its full path, the collection it belongs to, its id, and the JSON body.
//! A `WriteBatch` runs inside a single SQL transaction.

use std::str::FromStr;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use kb_core::traits::{Document, DocumentStore};
use kb_core::{CollectionPath, DocPath, Write, WriteBatch};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS documents (
        path    TEXT PRIMARY KEY,
        parent  TEXT NOT NULL,
        doc_id  TEXT NOT NULL,
        data    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS documents_by_parent ON documents (parent, doc_id)",
];

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `url` and ensures the schema.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = pool_options(url)
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite document store ready at {url}");
        Ok(Self { pool })
    }
}

/// In-memory databases live and die with their one connection: it must
/// never be shared, reaped when idle, or recycled.
fn pool_options(url: &str) -> SqlitePoolOptions {
    if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn decode(raw: &str) -> anyhow::Result<Document> {
    serde_json::from_str(raw).context("corrupt document body")
}

async fn fetch(conn: &mut SqliteConnection, path: &DocPath) -> anyhow::Result<Option<Document>> {
    let row = sqlx::query("SELECT data FROM documents WHERE path = ?")
        .bind(path.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| decode(&r.get::<String, _>("data"))).transpose()
}

async fn upsert(conn: &mut SqliteConnection, path: &DocPath, data: &Document) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO documents (path, parent, doc_id, data) VALUES (?, ?, ?, ?)
         ON CONFLICT(path) DO UPDATE SET data = excluded.data",
    )
    .bind(path.to_string())
    .bind(path.parent().to_string())
    .bind(path.id())
    .bind(serde_json::to_string(data)?)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn merge(conn: &mut SqliteConnection, path: &DocPath, fields: Document) -> anyhow::Result<()> {
    let mut doc = fetch(conn, path)
        .await?
        .ok_or_else(|| anyhow!("no document to update at {path}"))?;
    doc.extend(fields);
    upsert(conn, path, &doc).await
}

async fn remove(conn: &mut SqliteConnection, path: &DocPath) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM documents WHERE path = ?")
        .bind(path.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &DocPath) -> anyhow::Result<Option<Document>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, path).await
    }

    async fn set(&self, path: &DocPath, data: Document) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut *conn, path, &data).await
    }

    /// Read-merge-write inside a transaction so the merge sees a stable row.
    async fn update(&self, path: &DocPath, fields: Document) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        merge(&mut *tx, path, fields).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        remove(&mut *conn, path).await
    }

    async fn add(&self, collection: &CollectionPath, data: Document) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(&collection.doc(&id)?, data).await?;
        Ok(id)
    }

    async fn list(&self, collection: &CollectionPath) -> anyhow::Result<Vec<(String, Document)>> {
        let rows = sqlx::query("SELECT doc_id, data FROM documents WHERE parent = ? ORDER BY doc_id")
            .bind(collection.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> anyhow::Result<(String, Document)> {
                Ok((row.get("doc_id"), decode(&row.get::<String, _>("data"))?))
            })
            .collect()
    }

    /// Dropping the transaction on any error rolls every write back.
    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()> {
        batch.check_size()?;
        let count = batch.len();
        let mut tx = self.pool.begin().await?;
        for write in batch.into_writes() {
            match write {
                Write::Set { path, data } => upsert(&mut *tx, &path, &data).await?,
                Write::Update { path, fields } => merge(&mut *tx, &path, fields).await?,
                Write::Delete { path } => remove(&mut *tx, &path).await?,
            }
        }
        tx.commit().await?;
        log::debug!("committed batch of {count} writes");
        Ok(())
    }
}
