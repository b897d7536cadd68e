//! Aggregated view tests: partitioning, numbering, joins and live updates

mod helpers;

use std::collections::HashSet;
use std::time::Duration;
use assert_matches::assert_matches;
use helpers::*;
use proptest::prelude::*;
use serde_json::json;
use uniexp_admin::database::{collections, DocumentStore, FieldUpdate};
use uniexp_admin::models::Faculty;
use uniexp_admin::services::aggregation::{partition_rows, MissingRelation};
use uniexp_admin::services::NoticeLevel;
use uniexp_admin::UniExpError;

async fn mark_attended(ctx: &TestContext, registration_id: &str) {
    ctx.store
        .update(
            collections::REGISTRATION,
            registration_id,
            vec![("isAttended".to_string(), FieldUpdate::Set(json!(true)))],
        )
        .await
        .expect("Failed to mark attended");
}

#[tokio::test]
async fn test_attendance_partition_covers_every_registration() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;

    let mut participants = Vec::new();
    for _ in 0..5 {
        participants.push(ctx.register_participant(&event_id).await);
    }
    mark_attended(&ctx, &participants[1].registration_id).await;
    mark_attended(&ctx, &participants[3].registration_id).await;

    let view = ctx.services.aggregation.attendance_view(&event_id).await.unwrap();
    assert_eq!(view.matched_count(), 2);
    assert_eq!(view.unmatched_count(), 3);
    assert!(view.missing.is_empty());

    let attended: HashSet<&str> = view.matched.iter().map(|r| r.row.registration_id.as_str()).collect();
    let absent: HashSet<&str> = view.unmatched.iter().map(|r| r.row.registration_id.as_str()).collect();
    let all: HashSet<&str> = participants.iter().map(|p| p.registration_id.as_str()).collect();

    assert!(attended.is_disjoint(&absent));
    assert_eq!(attended.union(&absent).copied().collect::<HashSet<_>>(), all);
    assert_eq!(
        attended,
        HashSet::from([participants[1].registration_id.as_str(), participants[3].registration_id.as_str()])
    );
}

#[tokio::test]
async fn test_bil_is_contiguous_in_store_order() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;

    let mut participants = Vec::new();
    for _ in 0..4 {
        participants.push(ctx.register_participant(&event_id).await);
    }
    mark_attended(&ctx, &participants[0].registration_id).await;

    let view = ctx.services.aggregation.attendance_view(&event_id).await.unwrap();
    let absent_bils: Vec<usize> = view.unmatched.iter().map(|r| r.bil).collect();
    assert_eq!(absent_bils, vec![1, 2, 3]);

    let absent_ids: Vec<&str> = view.unmatched.iter().map(|r| r.row.registration_id.as_str()).collect();
    let expected: Vec<&str> = participants[1..].iter().map(|p| p.registration_id.as_str()).collect();
    assert_eq!(absent_ids, expected);
    assert_eq!(view.matched[0].bil, 1);
}

#[tokio::test]
async fn test_rows_carry_student_details() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let student_id = ctx
        .create_student(&named_student("Aina", "Rahman", 3, Faculty::ComputerScience))
        .await;
    ctx.register_existing(&event_id, &student_id).await;

    let view = ctx.services.aggregation.attendance_view(&event_id).await.unwrap();
    let row = &view.unmatched[0].row;
    assert_eq!(row.name, "Aina Rahman");
    assert_eq!(row.email, "aina.rahman@uni.edu");
    assert_eq!(row.year_of_study, 3);
    assert_eq!(row.faculty, Faculty::ComputerScience);
    assert!(row.scanned_at.is_none());
}

#[tokio::test]
async fn test_missing_student_is_reported_not_fatal() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let kept = ctx.register_participant(&event_id).await;
    let orphan = ctx.register_participant(&event_id).await;
    ctx.store.delete(collections::USER, &orphan.student_id).await.unwrap();

    let view = ctx.services.aggregation.participants_view(&event_id).await.unwrap();
    assert_eq!(view.total(), 1);
    assert_eq!(view.unmatched[0].row.registration_id, kept.registration_id);
    assert_eq!(
        view.missing,
        vec![MissingRelation::User {
            record_id: orphan.registration_id.clone(),
            student_id: orphan.student_id.clone(),
        }]
    );
}

#[tokio::test]
async fn test_unreadable_records_are_reported_not_fatal() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let kept = ctx.register_participant(&event_id).await;

    let bad_student = ctx
        .store
        .add(
            collections::USER,
            object(json!({
                "firstName": "Ali",
                "lastName": "Hassan",
                "email": "ali.hassan@uni.edu",
                "facultyID": 11,
                "yearOfStudy": 1
            })),
        )
        .await
        .unwrap();
    let bad_registration = ctx
        .store
        .add(
            collections::REGISTRATION,
            object(json!({ "eventID": event_id, "studentID": bad_student })),
        )
        .await
        .unwrap();
    let broken_row = ctx
        .store
        .add(
            collections::REGISTRATION,
            object(json!({ "eventID": event_id, "studentID": 42 })),
        )
        .await
        .unwrap();

    let view = ctx.services.aggregation.attendance_view(&event_id).await.unwrap();
    assert_eq!(view.total(), 1);
    assert_eq!(view.unmatched[0].row.registration_id, kept.registration_id);
    assert_eq!(view.missing.len(), 2);
    assert_matches!(
        &view.missing[0],
        MissingRelation::Malformed { collection, document_id, .. }
            if collection == collections::REGISTRATION && *document_id == broken_row
    );
    assert_matches!(
        &view.missing[1],
        MissingRelation::Malformed { collection, document_id, reason }
            if collection == collections::USER && *document_id == bad_student && reason.contains("unknown faculty 11")
    );
    assert!(view.unmatched.iter().all(|r| r.row.registration_id != bad_registration));
}

fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().expect("object literal")
}

#[tokio::test]
async fn test_watch_attendance_republishes_on_change() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let participant = ctx.register_participant(&event_id).await;

    let mut view = ctx.services.aggregation.watch_attendance(&event_id).await.unwrap();
    let first = view.next().await.unwrap().unwrap();
    assert_eq!((first.matched_count(), first.unmatched_count()), (0, 1));

    mark_attended(&ctx, &participant.registration_id).await;
    let second = tokio::time::timeout(Duration::from_secs(2), view.next())
        .await
        .expect("no update received")
        .unwrap()
        .unwrap();
    assert_eq!((second.matched_count(), second.unmatched_count()), (1, 0));

    view.close();
    assert!(view.is_closed());
    assert!(view.next().await.is_none());
}

#[tokio::test]
async fn test_feedback_view_joins_through_registration() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let student_id = ctx.create_student(&named_student("Wei", "Lim", 2, Faculty::Business)).await;
    let participant = ctx.register_existing(&event_id, &student_id).await;

    let db = &ctx.services.database;
    db.feedback
        .create(&test_feedback(&event_id, &participant.registration_id, 5, 4))
        .await
        .unwrap();
    db.feedback.create(&test_feedback(&event_id, "gone", 1, 1)).await.unwrap();

    let view = ctx.services.aggregation.feedback_view(&event_id).await.unwrap();
    assert_eq!(view.count(), 1);
    assert_eq!(view.rows[0].bil, 1);
    assert_eq!(view.rows[0].row.name, "Wei Lim");
    assert_eq!(view.rows[0].row.event_rating, 5);
    assert_eq!(view.average_ratings(), Some((5.0, 4.0)));
    assert_matches!(
        view.missing.as_slice(),
        [MissingRelation::Registration { registration_id, .. }] if registration_id == "gone"
    );
}

#[tokio::test]
async fn test_redemption_collected_toggle() {
    let ctx = TestContext::new();
    let db = &ctx.services.database;
    let merchandise_id = db.merchandise.create(&test_merchandise()).await.unwrap();
    let student_id = ctx.create_student(&fake_student()).await;
    let redemption_id = db
        .redemptions
        .create(&test_redemption(&merchandise_id, &student_id, false))
        .await
        .unwrap();

    let mut notices = ctx.services.notifications.subscribe();
    ctx.services.aggregation.set_collected(&redemption_id, true).await.unwrap();
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Success);

    let view = ctx.services.aggregation.redemption_view(&merchandise_id).await.unwrap();
    assert_eq!((view.matched_count(), view.unmatched_count()), (1, 0));

    ctx.services.aggregation.set_collected(&redemption_id, false).await.unwrap();
    let view = ctx.services.aggregation.redemption_view(&merchandise_id).await.unwrap();
    assert_eq!((view.matched_count(), view.unmatched_count()), (0, 1));
}

#[tokio::test]
async fn test_redemption_view_without_merchandise() {
    let ctx = TestContext::new();
    let view = ctx.services.aggregation.redemption_view("missing").await.unwrap();
    assert_eq!(view.total(), 0);
    assert_eq!(
        view.missing,
        vec![MissingRelation::Merchandise {
            merchandise_id: "missing".to_string()
        }]
    );
}

#[tokio::test]
async fn test_failed_write_surfaces_notice() {
    let ctx = TestContext::new();
    let mut notices = ctx.services.notifications.subscribe();

    let result = ctx.services.aggregation.set_verified("nope", true).await;
    assert_matches!(result, Err(UniExpError::RegistrationNotFound { .. }));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.dismissible);
}

#[tokio::test]
async fn test_set_verified_moves_participant() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let participant = ctx.register_participant(&event_id).await;

    ctx.services
        .aggregation
        .set_verified(&participant.registration_id, true)
        .await
        .unwrap();

    let view = ctx.services.aggregation.participants_view(&event_id).await.unwrap();
    assert_eq!(view.matched_count(), 1);
    assert!(view.matched[0].row.verified);
}

#[tokio::test]
async fn test_other_views_republish_on_change() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let participant = ctx.register_participant(&event_id).await;
    let db = &ctx.services.database;
    let merchandise_id = db.merchandise.create(&test_merchandise()).await.unwrap();
    let aggregation = &ctx.services.aggregation;

    let mut participants = aggregation.watch_participants(&event_id).await.unwrap();
    let mut feedback = aggregation.watch_feedback(&event_id).await.unwrap();
    let mut redemptions = aggregation.watch_redemptions(&merchandise_id).await.unwrap();
    assert_eq!(participants.next().await.unwrap().unwrap().matched_count(), 0);
    assert_eq!(feedback.next().await.unwrap().unwrap().count(), 0);
    assert_eq!(redemptions.next().await.unwrap().unwrap().total(), 0);

    aggregation.set_verified(&participant.registration_id, true).await.unwrap();
    db.feedback
        .create(&test_feedback(&event_id, &participant.registration_id, 3, 5))
        .await
        .unwrap();
    db.redemptions
        .create(&test_redemption(&merchandise_id, &participant.student_id, false))
        .await
        .unwrap();

    let within = Duration::from_secs(2);
    let verified = tokio::time::timeout(within, participants.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(verified.matched_count(), 1);
    let rated = tokio::time::timeout(within, feedback.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(rated.average_ratings(), Some((3.0, 5.0)));
    let pending = tokio::time::timeout(within, redemptions.next()).await.unwrap().unwrap().unwrap();
    assert_eq!((pending.matched_count(), pending.unmatched_count()), (0, 1));
}

proptest! {
    #[test]
    fn prop_partition_is_exact(flags in proptest::collection::vec(any::<bool>(), 0..60)) {
        let rows: Vec<(bool, usize)> = flags.iter().copied().zip(0..).collect();
        let (matched, unmatched) = partition_rows(rows);

        prop_assert_eq!(matched.len() + unmatched.len(), flags.len());
        prop_assert!(matched.iter().all(|n| flags[n.row]));
        prop_assert!(unmatched.iter().all(|n| !flags[n.row]));

        for side in [&matched, &unmatched] {
            let bils: Vec<usize> = side.iter().map(|n| n.bil).collect();
            prop_assert_eq!(bils, (1..=side.len()).collect::<Vec<_>>());
            prop_assert!(side.windows(2).all(|w| w[0].row < w[1].row));
        }
    }
}
