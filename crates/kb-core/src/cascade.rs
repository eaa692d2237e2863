//! # Cascade Planner
//!
//! Removing a node is split into two stages:
//!
//! 1. **plan** — read every dependent sub-collection (members, message
//!    contents) of the cards being removed. Reads run concurrently and
//!    happen before any write; one failed read aborts the whole removal.
//! 2. **commit** — the plan becomes a single [`WriteBatch`]: the
//!    predecessor's pointer repair plus every delete.
//!
//! The dependent set is a point-in-time read. A member or message created
//! between plan and commit survives the cascade; committing straight after
//! planning keeps that window to one round trip.

use futures_util::future::{try_join, try_join_all};
use serde_json::Value;

use crate::batch::WriteBatch;
use crate::error::Result;
use crate::models::{is_sentinel, ChainKind};
use crate::path::{self, DocPath};
use crate::traits::{Document, DocumentStore};

/// Everything owned by one card, as read during planning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardDependents {
    pub card_id: String,
    pub member_ids: Vec<String>,
    pub content_ids: Vec<String>,
}

/// The writes a removal will commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadePlan {
    repair: Option<(DocPath, Document)>,
    deletes: Vec<DocPath>,
}

impl CascadePlan {
    /// Unlinks `target` from its chain: `predecessor.next := successor`
    /// (skipped when `predecessor` is the sentinel) and deletes the node.
    pub fn unlink(kind: ChainKind, predecessor: &str, target: &str, successor: &str) -> Result<Self> {
        let repair = if is_sentinel(predecessor) {
            None
        } else {
            let mut fields = Document::new();
            fields.insert(kind.next_field().to_string(), Value::String(successor.to_string()));
            Some((DocPath::root(kind.collection(), predecessor)?, fields))
        };
        let deletes = vec![DocPath::root(kind.collection(), target)?];
        Ok(Self { repair, deletes })
    }

    /// Adds a card's whole subtree: the card, its members, its message
    /// container and every message content.
    pub fn remove_card_subtree(&mut self, deps: &CardDependents) -> Result<()> {
        let card = path::card_doc(&deps.card_id)?;
        let members = card.collection(path::MEMBERS)?;
        for uid in &deps.member_ids {
            self.push_delete(members.doc(uid)?);
        }
        let container = path::message_doc(&deps.card_id)?;
        let contents = container.collection(path::CONTENTS)?;
        for content_id in &deps.content_ids {
            self.push_delete(contents.doc(content_id)?);
        }
        self.push_delete(container);
        self.push_delete(card);
        Ok(())
    }

    fn push_delete(&mut self, doc: DocPath) {
        if !self.deletes.contains(&doc) {
            self.deletes.push(doc);
        }
    }

    pub fn repair(&self) -> Option<&(DocPath, Document)> {
        self.repair.as_ref()
    }

    pub fn deletes(&self) -> &[DocPath] {
        &self.deletes
    }

    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        if let Some((pred, fields)) = self.repair {
            batch.update(pred, fields);
        }
        for doc in self.deletes {
            batch.delete(doc);
        }
        batch
    }
}

/// Reads one card's member and content sub-collections concurrently.
pub async fn read_card_dependents(store: &dyn DocumentStore, card_id: &str) -> Result<CardDependents> {
    let members = path::members_of(card_id)?;
    let contents = path::contents_of(card_id)?;
    let (member_docs, content_docs) = try_join(store.list(&members), store.list(&contents)).await?;
    Ok(CardDependents {
        card_id: card_id.to_string(),
        member_ids: member_docs.into_iter().map(|(id, _)| id).collect(),
        content_ids: content_docs.into_iter().map(|(id, _)| id).collect(),
    })
}

/// Plans `removeList`: unlink the list, then sweep every listed card.
pub async fn plan_list_removal(
    store: &dyn DocumentStore,
    prev_list_id: &str,
    remove_list_id: &str,
    next_list_id: &str,
    card_ids: &[String],
) -> Result<CascadePlan> {
    let mut plan = CascadePlan::unlink(ChainKind::List, prev_list_id, remove_list_id, next_list_id)?;
    let reads = card_ids.iter().map(|id| read_card_dependents(store, id));
    for deps in try_join_all(reads).await? {
        plan.remove_card_subtree(&deps)?;
    }
    log::debug!(
        "planned removal of list {remove_list_id}: {} cards, {} deletes",
        card_ids.len(),
        plan.deletes().len()
    );
    Ok(plan)
}

/// Plans `removeCard`: unlink the card and sweep its own subtree.
pub async fn plan_card_removal(
    store: &dyn DocumentStore,
    prev_card_id: &str,
    remove_card_id: &str,
    next_card_id: &str,
) -> Result<CascadePlan> {
    let mut plan = CascadePlan::unlink(ChainKind::Card, prev_card_id, remove_card_id, next_card_id)?;
    let deps = read_card_dependents(store, remove_card_id).await?;
    plan.remove_card_subtree(&deps)?;
    Ok(plan)
}
