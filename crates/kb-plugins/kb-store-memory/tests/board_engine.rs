//! End-to-end behaviour of the board engine over the in-memory store.

use std::sync::Arc;

use kb_core::audit::audit_board;
use kb_core::path::{card_doc, contents_of, list_doc, members_of, message_doc};
use kb_core::{BoardService, CallContext, DocumentStore, Operation, ResultEnvelope};
use kb_store_memory::MemoryDocumentStore;
use serde_json::{json, Value};

fn setup() -> (Arc<MemoryDocumentStore>, BoardService) {
    let store = Arc::new(MemoryDocumentStore::new());
    let svc = BoardService::new(store.clone());
    (store, svc)
}

fn caller() -> CallContext {
    CallContext::authenticated("u-owner")
}

async fn call(svc: &BoardService, op: Operation, payload: Value) -> ResultEnvelope {
    svc.call(op, &caller(), payload).await
}

async fn field(store: &MemoryDocumentStore, path: &kb_core::DocPath, name: &str) -> Value {
    let doc = store.get(path).await.unwrap().expect("document exists");
    doc.get(name).cloned().unwrap_or(Value::Null)
}

#[tokio::test]
async fn batch_move_links_two_lists() {
    let (store, svc) = setup();
    let env = call(&svc, Operation::CreateList, json!({ "listId": "L1", "name": "Todo", "nextListId": "" })).await;
    assert!(env.result);
    assert_eq!(env.datas, "L1");
    call(&svc, Operation::CreateList, json!({ "listId": "L2", "name": "Done", "nextListId": "" })).await;

    let env = call(&svc, Operation::UpdateBatchList, json!({ "arrList": [{ "id": "L1", "nextListId": "L2" }] })).await;
    assert!(env.result);

    let next = field(&store, &list_doc("L1").unwrap(), "nextListId").await;
    assert_eq!(next, "L2");
    assert!(store.get(&list_doc("L2").unwrap()).await.unwrap().is_some());
    assert_eq!(field(&store, &list_doc("L1").unwrap(), "name").await, "Todo");
}

#[tokio::test]
async fn chain_stays_resolvable_through_creates_and_moves() {
    let (store, svc) = setup();
    // Build L1 -> L2 -> L3 -> L4 tail-first so every pointer resolves.
    for (id, next) in [("L4", ""), ("L3", "L4"), ("L2", "L3"), ("L1", "L2")] {
        let env = call(&svc, Operation::CreateList, json!({ "listId": id, "name": id, "nextListId": next })).await;
        assert!(env.result);
    }
    // Move L4 to the head: L4 -> L1 -> L2 -> L3.
    let env = call(
        &svc,
        Operation::UpdateBatchList,
        json!({ "arrList": [
            { "id": "L3", "nextListId": "" },
            { "id": "L4", "nextListId": "L1" },
        ] }),
    )
    .await;
    assert!(env.result);

    for (id, next) in [("C3", ""), ("C2", "C3"), ("C1", "C2")] {
        call(&svc, Operation::CreateCard, json!({ "cardId": id, "name": id, "listId": "L1", "nextCardId": next })).await;
    }
    // Move C3 into L2 on its own.
    call(
        &svc,
        Operation::UpdateBatchCard,
        json!({ "arrList": [
            { "id": "C2", "nextCardId": "" },
            { "id": "C3", "listId": "L2", "nextCardId": "" },
        ] }),
    )
    .await;

    let report = audit_board(store.as_ref()).await.unwrap();
    assert_eq!(report.lists, 4);
    assert_eq!(report.cards, 3);
    assert!(report.violations.is_empty(), "{:?}", report.violations);
}

#[tokio::test]
async fn new_card_gets_message_container_and_empty_members() {
    let (store, svc) = setup();
    let env = call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "Plan", "listId": "L1" })).await;
    assert_eq!(env.datas, "C1");

    let card = store.get(&card_doc("C1").unwrap()).await.unwrap().unwrap();
    assert_eq!(card["nextCardId"], "");
    assert_eq!(card["members"], json!([]));
    assert!(store.get(&message_doc("C1").unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn added_member_appears_in_array_and_sub_collection() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "c", "listId": "L1" })).await;
    let env = call(&svc, Operation::AddCardMember, json!({ "id": "C1", "uid": "u1", "memberName": "Alice" })).await;
    assert!(env.result);
    assert_eq!(env.datas, json!([{ "uid": "u1", "memberName": "Alice" }]));

    let members = field(&store, &card_doc("C1").unwrap(), "members").await;
    assert_eq!(members, json!([{ "uid": "u1", "memberName": "Alice" }]));
    let sub = store.get(&members_of("C1").unwrap().doc("u1").unwrap()).await.unwrap().unwrap();
    assert_eq!(sub["memberName"], "Alice");
}

#[tokio::test]
async fn member_array_tracks_sub_collection_after_mixed_mutations() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "c", "listId": "L1" })).await;

    let steps = [
        (Operation::AddCardMember, json!({ "id": "C1", "uid": "u2", "memberName": "Bob" })),
        (Operation::AddCardMember, json!({ "id": "C1", "uid": "u1", "memberName": "Alice" })),
        (Operation::AddCardMember, json!({ "id": "C1", "uid": "u3", "memberName": "Cara" })),
        (Operation::RemoveCardMember, json!({ "id": "C1", "uid": "u2" })),
        (Operation::AddCardMember, json!({ "id": "C1", "uid": "u1", "memberName": "Alice B." })),
    ];
    for (op, payload) in steps {
        assert!(call(&svc, op, payload).await.result);
    }

    let sub: Vec<Value> = store
        .list(&members_of("C1").unwrap())
        .await
        .unwrap()
        .into_iter()
        .map(|(uid, doc)| json!({ "uid": uid, "memberName": doc["memberName"] }))
        .collect();
    let array = field(&store, &card_doc("C1").unwrap(), "members").await;
    assert_eq!(array, Value::Array(sub));
    assert_eq!(array.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn removing_absent_member_still_rewrites_array() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "c", "listId": "L1" })).await;
    call(&svc, Operation::AddCardMember, json!({ "id": "C1", "uid": "u1", "memberName": "Alice" })).await;
    let before = store.write_count();

    let env = call(&svc, Operation::RemoveCardMember, json!({ "id": "C1", "uid": "u_nonexistent" })).await;
    assert!(env.result);
    assert_eq!(env.datas, json!([{ "uid": "u1", "memberName": "Alice" }]));
    // delete + array rewrite
    assert_eq!(store.write_count(), before + 2);
}

async fn seed_two_lists_with_cards(svc: &BoardService) {
    call(svc, Operation::CreateList, json!({ "listId": "L2", "name": "Done", "nextListId": "" })).await;
    call(svc, Operation::CreateList, json!({ "listId": "L1", "name": "Todo", "nextListId": "L2" })).await;
    call(svc, Operation::CreateCard, json!({ "cardId": "C2", "name": "b", "listId": "L2" })).await;
    call(svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "a", "listId": "L2", "nextCardId": "C2" })).await;
    call(svc, Operation::AddCardMember, json!({ "id": "C1", "uid": "u1", "memberName": "Alice" })).await;
    call(svc, Operation::AddCardMember, json!({ "id": "C1", "uid": "u2", "memberName": "Bob" })).await;
    let env = call(svc, Operation::CreateMessage, json!({ "messageId": "C2", "contentId": "m1", "content": "hi" })).await;
    assert_eq!(env.datas, "m1");
}

#[tokio::test]
async fn removing_a_list_cascades_through_its_cards() {
    let (store, svc) = setup();
    seed_two_lists_with_cards(&svc).await;

    let env = call(
        &svc,
        Operation::RemoveList,
        json!({ "prevListId": "L1", "removeListId": "L2", "nextListId": "", "cardIds": ["C1", "C2"] }),
    )
    .await;
    assert!(env.result, "{env:?}");

    assert_eq!(field(&store, &list_doc("L1").unwrap(), "nextListId").await, "");
    let remaining: Vec<String> = store.snapshot().await.into_keys().collect();
    assert_eq!(remaining, ["lists/L1"]);
}

#[tokio::test]
async fn interrupted_cascade_leaves_subtree_untouched() {
    let (store, svc) = setup();
    seed_two_lists_with_cards(&svc).await;
    let before = store.snapshot().await;

    store.fail_next_commits(1);
    let env = call(
        &svc,
        Operation::RemoveList,
        json!({ "prevListId": "L1", "removeListId": "L2", "nextListId": "", "cardIds": ["C1", "C2"] }),
    )
    .await;
    assert!(!env.result);
    assert_eq!(env.result_msg, "");
    assert_eq!(store.snapshot().await, before);

    store.fail_next_commits(1);
    let env = call(&svc, Operation::RemoveCard, json!({ "prevCardId": "", "removeCardId": "C1", "nextCardId": "C2" })).await;
    assert!(!env.result);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn removing_a_card_repairs_its_predecessor() {
    let (store, svc) = setup();
    for (id, next) in [("C3", ""), ("C2", "C3"), ("C1", "C2")] {
        call(&svc, Operation::CreateCard, json!({ "cardId": id, "name": id, "listId": "L1", "nextCardId": next })).await;
    }
    call(&svc, Operation::AddCardMember, json!({ "id": "C2", "uid": "u1", "memberName": "Alice" })).await;
    call(&svc, Operation::CreateMessage, json!({ "messageId": "C2", "content": "first" })).await;

    let env = call(&svc, Operation::RemoveCard, json!({ "prevCardId": "C1", "removeCardId": "C2", "nextCardId": "C3" })).await;
    assert!(env.result);

    assert_eq!(field(&store, &card_doc("C1").unwrap(), "nextCardId").await, "C3");
    let keys: Vec<String> = store.snapshot().await.into_keys().collect();
    assert!(keys.iter().all(|k| !k.contains("C2")), "{keys:?}");
    assert!(audit_board(store.as_ref()).await.unwrap().is_clean());
}

#[tokio::test]
async fn removing_with_a_missing_predecessor_changes_nothing() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "a", "listId": "L1" })).await;
    let before = store.snapshot().await;

    let env = call(&svc, Operation::RemoveCard, json!({ "prevCardId": "ghost", "removeCardId": "C1", "nextCardId": "" })).await;
    assert!(!env.result);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn empty_batches_write_nothing() {
    let (store, svc) = setup();
    for op in [Operation::UpdateBatchList, Operation::UpdateBatchCard] {
        let env = call(&svc, op, json!({ "arrList": [] })).await;
        assert!(env.result);
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn mistyped_optional_field_is_defaulted() {
    let (store, svc) = setup();
    let env = call(&svc, Operation::CreateList, json!({ "listId": "L1", "name": "Todo", "nextListId": 7 })).await;
    assert!(env.result);
    assert_eq!(field(&store, &list_doc("L1").unwrap(), "nextListId").await, "");
}

#[tokio::test]
async fn message_lifecycle() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "a", "listId": "L1" })).await;

    let env = call(&svc, Operation::CreateMessage, json!({ "messageId": "C1", "content": "hello" })).await;
    let content_id = env.datas.as_str().expect("generated id").to_string();
    let entry = contents_of("C1").unwrap().doc(&content_id).unwrap();
    assert_eq!(field(&store, &entry, "uid").await, "u-owner");
    assert!(field(&store, &entry, "timestamp").await.as_i64().unwrap_or_default() > 0);

    let env = call(&svc, Operation::UpdateMessage, json!({ "messageId": "C1", "contentId": content_id, "content": "edited" })).await;
    assert!(env.result);
    assert_eq!(field(&store, &entry, "content").await, "edited");

    let env = call(&svc, Operation::RemoveMessage, json!({ "messageId": "C1", "contentId": content_id })).await;
    assert!(env.result);
    assert!(store.get(&entry).await.unwrap().is_none());
}

#[tokio::test]
async fn audit_reports_broken_links() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateList, json!({ "listId": "L1", "name": "a", "nextListId": "L9" })).await;

    let env = call(&svc, Operation::AuditBoard, json!({})).await;
    assert!(env.result);
    assert_eq!(env.datas["violations"][0]["kind"], "dangling");
    assert_eq!(env.datas["violations"][0]["next"], "L9");
    assert!(!audit_board(store.as_ref()).await.unwrap().is_clean());
}

#[tokio::test]
async fn batch_naming_a_missing_node_applies_nothing() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateList, json!({ "listId": "L1", "name": "Todo" })).await;
    call(&svc, Operation::CreateList, json!({ "listId": "L2", "name": "Done" })).await;
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "a", "listId": "L1" })).await;
    let before = store.snapshot().await;

    let env = call(
        &svc,
        Operation::UpdateBatchList,
        json!({ "arrList": [{ "id": "L1", "nextListId": "L2" }, { "id": "ghost", "name": "x" }] }),
    )
    .await;
    assert!(!env.result);
    assert_eq!(env.result_msg, "");

    let env = call(
        &svc,
        Operation::UpdateBatchCard,
        json!({ "arrList": [{ "id": "C1", "listId": "L2" }, { "id": "ghost", "nextCardId": "" }] }),
    )
    .await;
    assert!(!env.result);

    assert_eq!(store.snapshot().await, before);
    assert_eq!(field(&store, &list_doc("L1").unwrap(), "nextListId").await, "");
}

#[tokio::test]
async fn batch_item_without_id_is_rejected() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateList, json!({ "listId": "L1", "name": "Todo" })).await;
    let before = store.write_count();

    for op in [Operation::UpdateBatchList, Operation::UpdateBatchCard] {
        let env = call(&svc, op, json!({ "arrList": [{ "id": "L1" }, { "name": "x" }] })).await;
        assert!(!env.result);
        assert_eq!(env.result_msg, "arrList.id is requirement!");
    }
    assert_eq!(store.write_count(), before);
}

#[tokio::test]
async fn update_card_writes_name_and_content() {
    let (store, svc) = setup();
    call(&svc, Operation::CreateCard, json!({ "cardId": "C1", "name": "a", "listId": "L1" })).await;
    let card = card_doc("C1").unwrap();

    let env = call(&svc, Operation::UpdateCard, json!({ "id": "C1", "name": "Draft", "content": "body" })).await;
    assert!(env.result);
    assert_eq!(field(&store, &card, "name").await, "Draft");
    assert_eq!(field(&store, &card, "content").await, "body");
    assert_eq!(field(&store, &card, "listId").await, "L1");

    // A rename without the body clears it.
    let env = call(&svc, Operation::UpdateCard, json!({ "id": "C1", "name": "renamed" })).await;
    assert!(env.result);
    assert_eq!(field(&store, &card, "name").await, "renamed");
    assert_eq!(field(&store, &card, "content").await, "");
}
