//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::batch::WriteBatch;
use crate::path::{CollectionPath, DocPath};

/// A stored document: a JSON object of top-level fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Document persistence contract.
///
/// Single-document calls act on one address. `commit` applies a whole
/// [`WriteBatch`] all-or-nothing. There is no read inside a batch and no
/// cross-call transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> anyhow::Result<Option<Document>>;

    /// Create or replace.
    async fn set(&self, path: &DocPath, data: Document) -> anyhow::Result<()>;

    /// Merge `fields` into an existing document. Fails if it is absent.
    async fn update(&self, path: &DocPath, fields: Document) -> anyhow::Result<()>;

    /// Deleting an absent document succeeds.
    async fn delete(&self, path: &DocPath) -> anyhow::Result<()>;

    /// Insert under a store-generated id and return that id.
    async fn add(&self, collection: &CollectionPath, data: Document) -> anyhow::Result<String>;

    /// Point-in-time snapshot of one collection, ordered by document id.
    async fn list(&self, collection: &CollectionPath) -> anyhow::Result<Vec<(String, Document)>>;

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()>;
}

/// Identity contract: turns a bearer credential into a verified uid.
pub trait AuthProvider: Send + Sync {
    /// Returns the caller's uid, or `None` when the credential is not valid.
    fn verify_token(&self, token: &str) -> Option<String>;
}
