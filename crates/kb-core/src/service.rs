//! # Board Service
//!
//! Every public operation follows the same order: caller identity, payload
//! validation, then store access. The first two never touch the store.
//! Nothing is retried; a failed store call ends the request.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::audit;
use crate::batch::WriteBatch;
use crate::cascade;
use crate::envelope::ResultEnvelope;
use crate::error::{AppError, Result};
use crate::models::{CardMember, CardNode, ListNode, MessageContent};
use crate::path::{self, DocPath};
use crate::requests::*;
use crate::schema::{parse_request, validate_fields};
use crate::traits::{Document, DocumentStore};

/// Who is calling. Built by the transport from a verified credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    uid: Option<String>,
}

impl CallContext {
    pub fn anonymous() -> Self {
        Self { uid: None }
    }

    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self { uid: Some(uid.into()) }
    }

    /// The verified uid, or `Unauthenticated`.
    pub fn require_uid(&self) -> Result<&str> {
        match self.uid.as_deref() {
            Some(uid) if !uid.is_empty() => Ok(uid),
            _ => Err(AppError::Unauthenticated),
        }
    }
}

/// The RPC operations, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateList,
    UpdateBatchList,
    RemoveList,
    CreateCard,
    UpdateBatchCard,
    UpdateCard,
    AddCardMember,
    RemoveCardMember,
    RemoveCard,
    CreateMessage,
    UpdateMessage,
    RemoveMessage,
    AuditBoard,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::CreateList,
        Operation::UpdateBatchList,
        Operation::RemoveList,
        Operation::CreateCard,
        Operation::UpdateBatchCard,
        Operation::UpdateCard,
        Operation::AddCardMember,
        Operation::RemoveCardMember,
        Operation::RemoveCard,
        Operation::CreateMessage,
        Operation::UpdateMessage,
        Operation::RemoveMessage,
        Operation::AuditBoard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateList => "createList",
            Operation::UpdateBatchList => "updateBatchList",
            Operation::RemoveList => "removeList",
            Operation::CreateCard => "createCard",
            Operation::UpdateBatchCard => "updateBatchCard",
            Operation::UpdateCard => "updateCard",
            Operation::AddCardMember => "addCardMember",
            Operation::RemoveCardMember => "removeCardMember",
            Operation::RemoveCard => "removeCard",
            Operation::CreateMessage => "createMessage",
            Operation::UpdateMessage => "updateMessage",
            Operation::RemoveMessage => "removeMessage",
            Operation::AuditBoard => "auditBoard",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| format!("unknown operation {s:?}"))
    }
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::store(format!("expected an object, got {other}"))),
    }
}

/// Picks the string-typed fields of a batch item that the node type allows.
fn patch_fields(item: &Value, allowed: &[&str]) -> Document {
    let mut fields = Document::new();
    for name in allowed {
        if let Some(Value::String(v)) = item.get(*name) {
            fields.insert(name.to_string(), Value::String(v.clone()));
        }
    }
    fields
}

pub struct BoardService {
    store: Arc<dyn DocumentStore>,
}

impl BoardService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Runs one operation and wraps the outcome in the wire envelope.
    /// Store failures are logged with their cause; callers only see `""`.
    pub async fn call(&self, op: Operation, ctx: &CallContext, payload: Value) -> ResultEnvelope {
        let res = match op {
            Operation::CreateList => self.create_list(ctx, payload).await,
            Operation::UpdateBatchList => self.update_batch_list(ctx, payload).await,
            Operation::RemoveList => self.remove_list(ctx, payload).await,
            Operation::CreateCard => self.create_card(ctx, payload).await,
            Operation::UpdateBatchCard => self.update_batch_card(ctx, payload).await,
            Operation::UpdateCard => self.update_card(ctx, payload).await,
            Operation::AddCardMember => self.add_card_member(ctx, payload).await,
            Operation::RemoveCardMember => self.remove_card_member(ctx, payload).await,
            Operation::RemoveCard => self.remove_card(ctx, payload).await,
            Operation::CreateMessage => self.create_message(ctx, payload).await,
            Operation::UpdateMessage => self.update_message(ctx, payload).await,
            Operation::RemoveMessage => self.remove_message(ctx, payload).await,
            Operation::AuditBoard => self.audit_board(ctx).await,
        };
        match &res {
            Ok(_) => log::info!("SUCCESS {op}"),
            Err(AppError::Store(cause)) => log::error!("ERROR {op}: {cause:#}"),
            Err(err) => log::warn!("REJECTED {op}: {err}"),
        }
        ResultEnvelope::from_result(res)
    }

    // ===== Lists

    pub async fn create_list(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: CreateListRequest = parse_request(payload, CREATE_LIST)?;
        let node = ListNode {
            id: req.list_id,
            name: req.name,
            next_list_id: req.next_list_id,
        };
        self.store.set(&path::list_doc(&node.id)?, to_document(&node)?).await?;
        Ok(Value::String(node.id))
    }

    pub async fn update_batch_list(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: UpdateBatchRequest = parse_request(payload, UPDATE_BATCH)?;
        self.commit_patches(path::LISTS, req.arr_list, LIST_PATCH_FIELDS).await?;
        Ok(Value::Null)
    }

    pub async fn remove_list(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: RemoveListRequest = parse_request(payload, REMOVE_LIST)?;
        let plan = cascade::plan_list_removal(
            self.store.as_ref(),
            &req.prev_list_id,
            &req.remove_list_id,
            &req.next_list_id,
            &req.card_ids,
        )
        .await?;
        self.store.commit(plan.into_batch()).await?;
        Ok(Value::Null)
    }

    // ===== Cards

    /// Writes the card and its empty message container as one batch.
    pub async fn create_card(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: CreateCardRequest = parse_request(payload, CREATE_CARD)?;
        let card = CardNode {
            id: req.card_id,
            name: req.name,
            list_id: req.list_id,
            next_card_id: req.next_card_id,
            content: String::new(),
            members: Vec::new(),
        };
        let mut batch = WriteBatch::new();
        batch
            .set(path::card_doc(&card.id)?, to_document(&card)?)
            .set(path::message_doc(&card.id)?, Document::new());
        self.store.commit(batch).await?;
        Ok(Value::String(card.id))
    }

    pub async fn update_batch_card(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: UpdateBatchRequest = parse_request(payload, UPDATE_BATCH)?;
        self.commit_patches(path::CARDS, req.arr_list, CARD_PATCH_FIELDS).await?;
        Ok(Value::Null)
    }

    /// Rewrites both `name` and `content`. A payload without `content`
    /// falls back to `""` and clears the card body, so editors must send
    /// the current body along with a rename.
    pub async fn update_card(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: UpdateCardRequest = parse_request(payload, UPDATE_CARD)?;
        let mut fields = Document::new();
        fields.insert("name".into(), Value::String(req.name));
        fields.insert("content".into(), Value::String(req.content));
        self.store.update(&path::card_doc(&req.id)?, fields).await?;
        Ok(Value::Null)
    }

    pub async fn remove_card(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: RemoveCardRequest = parse_request(payload, REMOVE_CARD)?;
        let plan = cascade::plan_card_removal(
            self.store.as_ref(),
            &req.prev_card_id,
            &req.remove_card_id,
            &req.next_card_id,
        )
        .await?;
        self.store.commit(plan.into_batch()).await?;
        Ok(Value::Null)
    }

    /// One `update` per item, committed together. An empty list writes
    /// nothing. Item ids are not checked for existence here; a missing
    /// node fails the whole commit.
    async fn commit_patches(&self, collection: &str, items: Vec<Value>, allowed: &[&str]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        for mut item in items {
            validate_fields(&mut item, BATCH_ITEM)
                .map_err(|_| AppError::Validation(vec!["arrList.id".into()]))?;
            let id = item["id"].as_str().unwrap_or_default();
            batch.update(DocPath::root(collection, id)?, patch_fields(&item, allowed));
        }
        self.store.commit(batch).await?;
        Ok(())
    }

    // ===== Members

    pub async fn add_card_member(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: AddCardMemberRequest = parse_request(payload, ADD_CARD_MEMBER)?;
        let member = path::members_of(&req.id)?.doc(&req.uid)?;
        self.store
            .set(&member, to_document(&json!({ "memberName": req.member_name }))?)
            .await?;
        let members = self.sync_members(&req.id).await?;
        Ok(serde_json::to_value(members)?)
    }

    pub async fn remove_card_member(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: RemoveCardMemberRequest = parse_request(payload, REMOVE_CARD_MEMBER)?;
        self.store.delete(&path::members_of(&req.id)?.doc(&req.uid)?).await?;
        let members = self.sync_members(&req.id).await?;
        Ok(serde_json::to_value(members)?)
    }

    /// Re-reads the member sub-collection and overwrites the card's
    /// denormalized array with it.
    async fn sync_members(&self, card_id: &str) -> Result<Vec<CardMember>> {
        let docs = self.store.list(&path::members_of(card_id)?).await?;
        let members: Vec<CardMember> = docs
            .into_iter()
            .map(|(uid, doc)| CardMember {
                uid,
                member_name: doc
                    .get("memberName")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();
        let mut fields = Document::new();
        fields.insert("members".into(), serde_json::to_value(&members)?);
        self.store.update(&path::card_doc(card_id)?, fields).await?;
        log::debug!("card {card_id} now has {} members", members.len());
        Ok(members)
    }

    // ===== Messages

    pub async fn create_message(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        let uid = ctx.require_uid()?.to_string();
        let req: MessageRequest = parse_request(payload, CREATE_MESSAGE)?;
        let entry = MessageContent {
            content: req.content,
            timestamp: chrono::Utc::now().timestamp_millis(),
            uid,
        };
        let contents = path::contents_of(&req.message_id)?;
        let data = to_document(&entry)?;
        let id = if req.content_id.is_empty() {
            self.store.add(&contents, data).await?
        } else {
            self.store.set(&contents.doc(&req.content_id)?, data).await?;
            req.content_id
        };
        Ok(Value::String(id))
    }

    pub async fn update_message(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: MessageRequest = parse_request(payload, UPDATE_MESSAGE)?;
        let doc = path::contents_of(&req.message_id)?.doc(&req.content_id)?;
        let mut fields = Document::new();
        fields.insert("content".into(), Value::String(req.content));
        self.store.update(&doc, fields).await?;
        Ok(Value::Null)
    }

    pub async fn remove_message(&self, ctx: &CallContext, payload: Value) -> Result<Value> {
        ctx.require_uid()?;
        let req: MessageRequest = parse_request(payload, REMOVE_MESSAGE)?;
        self.store
            .delete(&path::contents_of(&req.message_id)?.doc(&req.content_id)?)
            .await?;
        Ok(Value::Null)
    }

    // ===== Diagnostics

    pub async fn audit_board(&self, ctx: &CallContext) -> Result<Value> {
        ctx.require_uid()?;
        let report = audit::audit_board(self.store.as_ref()).await?;
        Ok(serde_json::to_value(report)?)
    }
}
