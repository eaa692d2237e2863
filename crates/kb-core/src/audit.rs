//! # Chain Audit
//!
//! A read-only walk over both orderings. Writes never consult it; it exists
//! to observe whether concurrent callers have broken a chain.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{is_sentinel, ChainKind};
use crate::path::{self, CollectionPath};
use crate::traits::{Document, DocumentStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChainViolation {
    /// A next-pointer names a node that does not exist.
    #[serde(rename_all = "camelCase")]
    Dangling { chain: &'static str, id: String, next: String },
    /// Several nodes claim the same successor.
    #[serde(rename_all = "camelCase")]
    Merged { chain: &'static str, target: String, predecessors: Vec<String> },
    /// A card's successor sits in a different list. Allowed, only reported.
    #[serde(rename_all = "camelCase")]
    CrossList { card: String, next: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub lists: usize,
    pub cards: usize,
    pub violations: Vec<ChainViolation>,
}

impl ChainReport {
    pub fn is_clean(&self) -> bool {
        self.violations.iter().all(|v| matches!(v, ChainViolation::CrossList { .. }))
    }
}

fn str_field<'a>(doc: &'a Document, name: &str) -> &'a str {
    doc.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn check_chain(kind: ChainKind, nodes: &BTreeMap<String, Document>, out: &mut Vec<ChainViolation>) {
    let chain = kind.collection();
    let mut predecessors: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (id, doc) in nodes {
        let next = str_field(doc, kind.next_field());
        if is_sentinel(next) {
            continue;
        }
        if !nodes.contains_key(next) {
            out.push(ChainViolation::Dangling { chain, id: id.clone(), next: next.to_string() });
            continue;
        }
        predecessors.entry(next).or_default().push(id.clone());
    }
    for (target, preds) in predecessors {
        if preds.len() > 1 {
            out.push(ChainViolation::Merged { chain, target: target.to_string(), predecessors: preds });
        }
    }
}

async fn load(store: &dyn DocumentStore, collection: &str) -> Result<BTreeMap<String, Document>> {
    let docs = store.list(&CollectionPath::root(collection)?).await?;
    Ok(docs.into_iter().collect())
}

pub async fn audit_board(store: &dyn DocumentStore) -> Result<ChainReport> {
    let lists = load(store, path::LISTS).await?;
    let cards = load(store, path::CARDS).await?;

    let mut violations = Vec::new();
    check_chain(ChainKind::List, &lists, &mut violations);
    check_chain(ChainKind::Card, &cards, &mut violations);

    for (id, doc) in &cards {
        let next = str_field(doc, ChainKind::Card.next_field());
        if let Some(succ) = cards.get(next) {
            if str_field(succ, "listId") != str_field(doc, "listId") {
                violations.push(ChainViolation::CrossList { card: id.clone(), next: next.to_string() });
            }
        }
    }

    Ok(ChainReport { lists: lists.len(), cards: cards.len(), violations })
}
