//! Typed payloads for each operation, paired with the schema that
//! normalises the raw JSON before it is deserialised.

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{FieldKind as K, FieldSchema, FieldSpec as F};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    pub list_id: String,
    pub name: String,
    pub next_list_id: String,
}

pub const CREATE_LIST: &FieldSchema = &[
    F::required("listId", K::String),
    F::required("name", K::String),
    F::optional("nextListId", K::String),
];

/// Shared by `updateBatchList` and `updateBatchCard`. Items are checked
/// one by one in [`crate::service`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatchRequest {
    pub arr_list: Vec<Value>,
}

pub const UPDATE_BATCH: &FieldSchema = &[F::required("arrList", K::Array)];

pub const BATCH_ITEM: &FieldSchema = &[F::required("id", K::String)];

/// Fields a list batch item may rewrite.
pub const LIST_PATCH_FIELDS: &[&str] = &["name", "nextListId"];

/// Fields a card batch item may rewrite.
pub const CARD_PATCH_FIELDS: &[&str] = &["name", "listId", "nextCardId", "content"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveListRequest {
    pub prev_list_id: String,
    pub remove_list_id: String,
    pub next_list_id: String,
    pub card_ids: Vec<String>,
}

pub const REMOVE_LIST: &FieldSchema = &[
    F::optional("prevListId", K::String),
    F::required("removeListId", K::String),
    F::optional("nextListId", K::String),
    F::optional("cardIds", K::Array),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub card_id: String,
    pub name: String,
    pub list_id: String,
    pub next_card_id: String,
}

pub const CREATE_CARD: &FieldSchema = &[
    F::required("cardId", K::String),
    F::required("name", K::String),
    F::required("listId", K::String),
    F::optional("nextCardId", K::String),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub id: String,
    pub content: String,
    pub name: String,
}

pub const UPDATE_CARD: &FieldSchema = &[
    F::required("id", K::String),
    F::optional("content", K::String),
    F::required("name", K::String),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardMemberRequest {
    pub id: String,
    pub uid: String,
    pub member_name: String,
}

pub const ADD_CARD_MEMBER: &FieldSchema = &[
    F::required("id", K::String),
    F::required("uid", K::String),
    F::required("memberName", K::String),
];

#[derive(Debug, Deserialize)]
pub struct RemoveCardMemberRequest {
    pub id: String,
    pub uid: String,
}

pub const REMOVE_CARD_MEMBER: &FieldSchema = &[
    F::required("id", K::String),
    F::required("uid", K::String),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCardRequest {
    pub prev_card_id: String,
    pub remove_card_id: String,
    pub next_card_id: String,
}

pub const REMOVE_CARD: &FieldSchema = &[
    F::optional("prevCardId", K::String),
    F::required("removeCardId", K::String),
    F::optional("nextCardId", K::String),
];

/// `messageId` is the owning card's id; `contentId` one entry under it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub message_id: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub content: String,
}

pub const CREATE_MESSAGE: &FieldSchema = &[
    F::required("messageId", K::String),
    F::optional("contentId", K::String),
    F::required("content", K::String),
];

pub const UPDATE_MESSAGE: &FieldSchema = &[
    F::required("messageId", K::String),
    F::required("contentId", K::String),
    F::required("content", K::String),
];

pub const REMOVE_MESSAGE: &FieldSchema = &[
    F::required("messageId", K::String),
    F::required("contentId", K::String),
];
