//! Feedback repository implementation

use std::sync::Arc;
use crate::database::document::{collections, encode, Query};
use crate::database::store::DocumentStore;
use crate::models::feedback::Feedback;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct FeedbackRepository {
    store: Arc<dyn DocumentStore>,
}

impl FeedbackRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, feedback: &Feedback) -> Result<String> {
        self.store.add(collections::FEEDBACK, encode(feedback)?).await
    }

    pub fn event_query(event_id: &str) -> Query {
        Query::collection(collections::FEEDBACK).where_eq("eventID", event_id)
    }
}
