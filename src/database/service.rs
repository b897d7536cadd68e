//! Database service layer
//!
//! This module provides a high-level interface to database operations

use std::sync::Arc;
use crate::database::{
    DocumentStore, EventRepository, FeedbackRepository, MerchandiseRepository, QuestProgressRepository,
    QuestRepository, RedemptionRepository, RegistrationRepository, UserRepository,
};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub store: Arc<dyn DocumentStore>,
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub quests: QuestRepository,
    pub quest_progress: QuestProgressRepository,
    pub feedback: FeedbackRepository,
    pub merchandise: MerchandiseRepository,
    pub redemptions: RedemptionRepository,
}

impl DatabaseService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            events: EventRepository::new(store.clone()),
            registrations: RegistrationRepository::new(store.clone()),
            quests: QuestRepository::new(store.clone()),
            quest_progress: QuestProgressRepository::new(store.clone()),
            feedback: FeedbackRepository::new(store.clone()),
            merchandise: MerchandiseRepository::new(store.clone()),
            redemptions: RedemptionRepository::new(store.clone()),
            store,
        }
    }

    /// Register a student for an event
    ///
    /// Registration normally happens in the student app; the dashboard uses
    /// this for imports and fixtures. The quest progress container is set up
    /// separately by `QuestService::enroll_participant`.
    pub async fn register_for_event(&self, event_id: &str, student_id: &str) -> Result<Registration> {
        self.events.get(event_id).await?;
        self.users.get(student_id).await?;

        let mut registration = Registration::new(event_id, student_id);
        registration.id = self.registrations.create(&registration).await?;
        Ok(registration)
    }
}
