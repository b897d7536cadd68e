//! Postgres document store tests
//!
//! These need Docker (or `TEST_DATABASE_URL`) and are ignored by default:
//! `cargo test --test postgres_store_test -- --ignored`

mod helpers;

use std::sync::Arc;
use std::time::Duration;
use assert_matches::assert_matches;
use helpers::*;
use serde_json::{json, Map, Value};
use serial_test::serial;
use uniexp_admin::database::{collections, DocumentStore, FieldUpdate, Query, WriteOp};
use uniexp_admin::services::AttendanceOutcome;
use uniexp_admin::UniExpError;

fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_add_query_and_update() {
    let db = TestDatabase::new().await.expect("Failed to set up database");
    db.cleanup().await.unwrap();
    let store = db.store();

    let first = store
        .add(collections::REGISTRATION, data(json!({ "eventID": "e1", "isAttended": false })))
        .await
        .unwrap();
    let second = store
        .add(collections::REGISTRATION, data(json!({ "eventID": "e1", "isAttended": true })))
        .await
        .unwrap();
    store
        .add(collections::REGISTRATION, data(json!({ "eventID": "e2", "isAttended": false })))
        .await
        .unwrap();

    let docs = store
        .query(&Query::collection(collections::REGISTRATION).where_eq("eventID", "e1"))
        .await
        .unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);

    store
        .update(
            collections::REGISTRATION,
            &first,
            vec![
                ("isAttended".to_string(), FieldUpdate::Set(json!(true))),
                ("scans".to_string(), FieldUpdate::Increment(2)),
            ],
        )
        .await
        .unwrap();
    let updated = store.get(collections::REGISTRATION, &first).await.unwrap().unwrap();
    assert_eq!(updated.get("isAttended"), Some(&json!(true)));
    assert_eq!(updated.get("scans"), Some(&json!(2)));

    let missing = store.update(collections::REGISTRATION, "nope", vec![]).await;
    assert_matches!(missing, Err(UniExpError::DocumentNotFound { .. }));
    assert_eq!(db.count_documents(collections::REGISTRATION).await.unwrap(), 3);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_commit_is_all_or_nothing() {
    let db = TestDatabase::new().await.expect("Failed to set up database");
    db.cleanup().await.unwrap();
    let store = db.store();

    let id = store
        .add(collections::REGISTRATION, data(json!({ "isAttended": false })))
        .await
        .unwrap();

    let result = store
        .commit(vec![
            WriteOp::Update {
                collection: collections::REGISTRATION.to_string(),
                id: id.clone(),
                fields: vec![("isAttended".to_string(), FieldUpdate::Set(json!(true)))],
            },
            WriteOp::Update {
                collection: collections::quest_progress_list("missing"),
                id: "missing".to_string(),
                fields: vec![("progress".to_string(), FieldUpdate::Increment(1))],
            },
        ])
        .await;
    assert!(result.is_err());

    let unchanged = store.get(collections::REGISTRATION, &id).await.unwrap().unwrap();
    assert_eq!(unchanged.get("isAttended"), Some(&json!(false)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_subscription_sees_writes() {
    let db = TestDatabase::new().await.expect("Failed to set up database");
    db.cleanup().await.unwrap();
    let store = db.store();

    let mut live = store
        .subscribe(Query::collection(collections::FEEDBACK).where_eq("eventID", "e1"))
        .await
        .unwrap();
    assert!(live.next().await.unwrap().unwrap().is_empty());

    store
        .add(collections::FEEDBACK, data(json!({ "eventID": "e1" })))
        .await
        .unwrap();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), live.next())
        .await
        .expect("no change notification")
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.len(), 1);

    live.close();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_attendance_flow_on_postgres() {
    let db = TestDatabase::new().await.expect("Failed to set up database");
    db.cleanup().await.unwrap();
    let ctx = TestContext::with_store(Arc::new(db.store()));

    let event_id = ctx.create_event().await;
    let quest_id = ctx.add_attendance_quest(&event_id).await;
    let participant = ctx.register_participant(&event_id).await;

    let outcome = ctx
        .services
        .attendance
        .verify_attendance(&participant.student_id, &participant.registration_id)
        .await
        .unwrap();
    assert_eq!(outcome, AttendanceOutcome::QuestCompleted);

    let item = ctx
        .services
        .database
        .quest_progress
        .find_item(&participant.container_id, &quest_id)
        .await
        .unwrap()
        .unwrap();
    assert!(item.is_completed);
    assert_eq!(item.progress, 1);
}
