//! # kb-store-memory
//!
//! In-process implementation of `DocumentStore`.
//! One lock guards every document, so a batch is staged against a
//! consistent view and applied in a single step, or not at all.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use kb_core::traits::{Document, DocumentStore};
use kb_core::{CollectionPath, DocPath, Write, WriteBatch};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<BTreeMap<DocPath, Document>>,
    /// Commits still to be refused, for exercising rollback.
    failing_commits: AtomicUsize,
    /// Successful writes of any kind, batches counted once.
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` commits fail without applying anything.
    pub fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every document keyed by its rendered path.
    pub async fn snapshot(&self) -> BTreeMap<String, Document> {
        let docs = self.docs.read().await;
        docs.iter().map(|(p, d)| (p.to_string(), d.clone())).collect()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn in_collection(doc: &DocPath, collection: &CollectionPath) -> bool {
    let parent = collection.segments();
    doc.segments().len() == parent.len() + 1 && doc.segments().starts_with(parent)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn set(&self, path: &DocPath, data: Document) -> anyhow::Result<()> {
        self.docs.write().await.insert(path.clone(), data);
        self.record_write();
        Ok(())
    }

    async fn update(&self, path: &DocPath, fields: Document) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(path)
            .ok_or_else(|| anyhow!("no document to update at {path}"))?;
        doc.extend(fields);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> anyhow::Result<()> {
        self.docs.write().await.remove(path);
        self.record_write();
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, data: Document) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(&collection.doc(&id)?, data).await?;
        Ok(id)
    }

    async fn list(&self, collection: &CollectionPath) -> anyhow::Result<Vec<(String, Document)>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(p, _)| in_collection(p, collection))
            .map(|(p, d)| (p.id().to_string(), d.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()> {
        batch.check_size()?;
        let mut docs = self.docs.write().await;
        if self.take_injected_failure() {
            bail!("commit rejected ({} writes discarded)", batch.len());
        }

        // Later writes in the batch see earlier ones; the map is untouched
        // until every write has been staged.
        let mut staged: BTreeMap<DocPath, Option<Document>> = BTreeMap::new();
        for write in batch.into_writes() {
            match write {
                Write::Set { path, data } => {
                    staged.insert(path, Some(data));
                }
                Write::Update { path, fields } => {
                    let current = match staged.get(&path) {
                        Some(doc) => doc.clone(),
                        None => docs.get(&path).cloned(),
                    };
                    let Some(mut doc) = current else {
                        bail!("no document to update at {path}");
                    };
                    doc.extend(fields);
                    staged.insert(path, Some(doc));
                }
                Write::Delete { path } => {
                    staged.insert(path, None);
                }
            }
        }

        log::debug!("committing {} staged documents", staged.len());
        for (path, doc) in staged {
            match doc {
                Some(doc) => {
                    docs.insert(path, doc);
                }
                None => {
                    docs.remove(&path);
                }
            }
        }
        self.record_write();
        Ok(())
    }
}
