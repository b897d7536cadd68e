//! Test context for unified test setup
//!
//! Wires every service over one store and offers shortcuts for seeding the
//! records most tests need.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tempfile::TempDir;
use uniexp_admin::config::Settings;
use uniexp_admin::database::{DocumentStore, MemoryStore};
use uniexp_admin::models::{EventCategory, QuestListItem, User};
use uniexp_admin::services::ServiceFactory;

use super::test_data::{attendance_quest, fake_student, test_event};

pub const ORGANISER: &str = "organiser-1";

/// A seeded participant
#[derive(Debug, Clone)]
pub struct Participant {
    pub student_id: String,
    pub registration_id: String,
    pub container_id: String,
}

pub struct TestContext {
    pub store: Arc<dyn DocumentStore>,
    pub services: ServiceFactory,
    pub settings: Settings,
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Context over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Context over a caller-provided store
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut settings = Settings::default();
        settings.export.output_dir = temp_dir.path().to_string_lossy().into_owned();

        let mut services = ServiceFactory::new(store.clone(), &settings).expect("Failed to build services");
        services.quests = services.quests.clone().with_retry(2, Duration::from_millis(1));

        Self {
            store,
            services,
            settings,
            temp_dir,
        }
    }

    /// An event with an empty quest collection
    pub async fn create_event(&self) -> String {
        let event = test_event(ORGANISER, EventCategory::Technology, Utc::now());
        let event_id = self.services.database.events.create(&event).await.expect("Failed to create event");
        self.services
            .quests
            .ensure_quest_collection(&event_id)
            .await
            .expect("Failed to create quest collection");
        event_id
    }

    /// Add a quest item directly, without fan-out
    pub async fn add_quest_item(&self, event_id: &str, item: &QuestListItem) -> String {
        let wrapper = self.services.quests.ensure_quest_collection(event_id).await.expect("quest collection");
        self.services.database.quests.add_item(&wrapper, item).await.expect("Failed to add quest")
    }

    pub async fn add_attendance_quest(&self, event_id: &str) -> String {
        self.add_quest_item(event_id, &attendance_quest()).await
    }

    pub async fn create_student(&self, student: &User) -> String {
        self.services.database.users.create(student).await.expect("Failed to create student")
    }

    /// Register a generated student and give them a progress container
    pub async fn register_participant(&self, event_id: &str) -> Participant {
        let student_id = self.create_student(&fake_student()).await;
        self.register_existing(event_id, &student_id).await
    }

    pub async fn register_existing(&self, event_id: &str, student_id: &str) -> Participant {
        let registration = self
            .services
            .database
            .register_for_event(event_id, student_id)
            .await
            .expect("Failed to register");
        let container_id = self
            .services
            .quests
            .enroll_participant(event_id, student_id)
            .await
            .expect("Failed to enroll");

        Participant {
            student_id: student_id.to_string(),
            registration_id: registration.id,
            container_id,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
