//! Quest creation and fan-out tests

mod helpers;

use std::sync::Arc;
use assert_matches::assert_matches;
use chrono::Utc;
use helpers::*;
use uniexp_admin::database::{collections, MemoryStore};
use uniexp_admin::models::EventCategory;
use uniexp_admin::services::{NewQuest, NoticeLevel, QuestTemplate, Rewards};
use uniexp_admin::UniExpError;

fn networking_quest() -> NewQuest {
    NewQuest::new(
        QuestTemplate::Networking { completion_num: 3 },
        Rewards { points: 20, diamonds: 10 },
    )
}

#[tokio::test]
async fn test_fan_out_reaches_every_participant() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let mut participants = Vec::new();
    for _ in 0..4 {
        participants.push(ctx.register_participant(&event_id).await);
    }

    let report = ctx.services.quests.create_quest(&event_id, &networking_quest()).await.unwrap();
    assert_eq!(report.containers, 4);
    assert_eq!(report.inserted, 4);
    assert!(report.is_complete());

    let progress = &ctx.services.database.quest_progress;
    for participant in &participants {
        let items = progress.list_items(&participant.container_id).await.unwrap();
        let matching: Vec<_> = items.iter().filter(|i| i.quest_id == report.quest_id).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].progress, 0);
        assert!(!matching[0].is_completed);
        assert!(!matching[0].rewards_claimed);
    }

    let quests = ctx.services.quests.list_quests(&event_id).await.unwrap();
    assert_eq!(quests.len(), 1);
    assert_eq!(quests[0].id, report.quest_id);
    assert_eq!(quests[0].completion_num, 3);
}

#[tokio::test]
async fn test_partial_failure_then_reconcile() {
    let flaky = Arc::new(FlakyStore::new(Arc::new(MemoryStore::new())));
    let ctx = TestContext::with_store(flaky.clone());
    let event_id = ctx.create_event().await;
    let mut participants = Vec::new();
    for _ in 0..4 {
        participants.push(ctx.register_participant(&event_id).await);
    }

    flaky.fail_writes_to(collections::quest_progress_list(&participants[1].container_id));
    flaky.fail_writes_to(collections::quest_progress_list(&participants[3].container_id));
    let mut notices = ctx.services.notifications.subscribe();

    let report = ctx.services.quests.create_quest(&event_id, &networking_quest()).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed.len(), 2);
    // two attempts per unreachable container
    assert_eq!(flaky.rejected(), 4);
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Warning);

    let quest_id = report.quest_id.clone();
    assert_matches!(report.ensure_complete(), Err(UniExpError::IncompleteFanOut { failed: 2, .. }));

    let progress = &ctx.services.database.quest_progress;
    let mut updated = 0;
    for participant in &participants {
        if progress.find_item(&participant.container_id, &quest_id).await.unwrap().is_some() {
            updated += 1;
        }
    }
    assert_eq!(updated, 2);

    flaky.heal();
    let repaired = ctx.services.quests.reconcile(&event_id, &quest_id).await.unwrap();
    assert_eq!((repaired.inserted, repaired.skipped), (2, 2));
    assert!(repaired.is_complete());

    for participant in &participants {
        let items = progress.list_items(&participant.container_id).await.unwrap();
        assert_eq!(items.iter().filter(|i| i.quest_id == quest_id).count(), 1);
    }
}

#[tokio::test]
async fn test_invalid_quest_makes_no_writes() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    ctx.register_participant(&event_id).await;

    let quest = NewQuest::new(
        QuestTemplate::EarlyBird { max_early_bird: 0 },
        Rewards { points: 0, diamonds: 0 },
    );
    let errors = assert_matches!(
        ctx.services.quests.create_quest(&event_id, &quest).await,
        Err(UniExpError::Validation(errors)) => errors
    );
    assert_eq!(errors.fields(), vec!["diamondsRewards", "maxEarlyBird", "pointsRewards"]);
    assert!(ctx.services.quests.list_quests(&event_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_event_without_quest_document() {
    let ctx = TestContext::new();
    let event = test_event(ORGANISER, EventCategory::Sports, Utc::now());
    let event_id = ctx.services.database.events.create(&event).await.unwrap();

    let result = ctx.services.quests.create_quest(&event_id, &networking_quest()).await;
    assert_matches!(result, Err(UniExpError::DocumentNotFound { collection, .. }) if collection == "quest");
}

#[tokio::test]
async fn test_enroll_copies_existing_quests_once() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    ctx.add_attendance_quest(&event_id).await;
    ctx.services.quests.create_quest(&event_id, &networking_quest()).await.unwrap();

    let student_id = ctx.create_student(&fake_student()).await;
    let first = ctx.services.quests.enroll_participant(&event_id, &student_id).await.unwrap();
    let again = ctx.services.quests.enroll_participant(&event_id, &student_id).await.unwrap();
    assert_eq!(first, again);

    let items = ctx.services.database.quest_progress.list_items(&first).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.is_untouched()));
}

#[tokio::test]
async fn test_reconcile_unknown_quest() {
    let ctx = TestContext::new();
    let event_id = ctx.create_event().await;
    let result = ctx.services.quests.reconcile(&event_id, "no-such-quest").await;
    assert_matches!(result, Err(UniExpError::DocumentNotFound { .. }));
}
