//! # Domain Models
//!
//! The Linked-Order Model: lists and cards are explicit records keyed by id,
//! chained through `next_*_id` string fields. No node stores its position;
//! the chain is only ever walked by following successor ids.

use serde::{Deserialize, Serialize};

/// The "no successor" marker for `next_list_id` / `next_card_id`.
pub const SENTINEL: &str = "";

/// Returns true when a pointer value marks the tail of a chain.
pub fn is_sentinel(id: &str) -> bool {
    id == SENTINEL
}

/// A column on the board. Stored at `lists/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    /// Chosen by the client before the first write.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub next_list_id: String,
}

/// A card inside a list. Stored at `cards/{id}`.
///
/// `next_card_id` chains cards of the same `list_id`. Moving a card across
/// lists is a caller-submitted batch; nothing here asserts that the
/// successor belongs to the same list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardNode {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub list_id: String,
    pub next_card_id: String,
    /// Free-text body edited through `updateCard`.
    #[serde(default)]
    pub content: String,
    /// Denormalized copy of `cards/{id}/members`, rewritten in full after
    /// every membership mutation.
    #[serde(default)]
    pub members: Vec<CardMember>,
}

/// One entry of a card's member array. The authoritative copy lives at
/// `cards/{card}/members/{uid}` as `{ memberName }`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMember {
    pub uid: String,
    pub member_name: String,
}

/// A message body under `messages/{cardId}/contents/{contentId}`.
/// Contents are ordered by `timestamp`, not chained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub uid: String,
}

/// The kind of chain a pointer field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    List,
    Card,
}

impl ChainKind {
    /// The top-level collection holding nodes of this chain.
    pub fn collection(self) -> &'static str {
        match self {
            ChainKind::List => crate::path::LISTS,
            ChainKind::Card => crate::path::CARDS,
        }
    }

    /// The document field holding the successor id.
    pub fn next_field(self) -> &'static str {
        match self {
            ChainKind::List => "nextListId",
            ChainKind::Card => "nextCardId",
        }
    }
}
