//! Event repository implementation

use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::database::document::{collections, encode, FieldUpdates, Query};
use crate::database::store::DocumentStore;
use crate::models::event::Event;
use crate::utils::errors::{Result, UniExpError};
use super::decode_all;

#[derive(Debug, Clone)]
pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a new event
    pub async fn create(&self, event: &Event) -> Result<String> {
        self.store.add(collections::EVENT, encode(event)?).await
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        match self.store.get(collections::EVENT, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Find event by ID, failing when it does not exist
    pub async fn get(&self, id: &str) -> Result<Event> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| UniExpError::EventNotFound { event_id: id.to_string() })
    }

    /// Partially update top-level fields
    pub async fn update_fields(&self, id: &str, fields: FieldUpdates) -> Result<()> {
        self.store.update(collections::EVENT, id, fields).await
    }

    /// Events of an organiser starting in `[start, end)`
    pub fn window_query(organiser_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Query {
        Query::collection(collections::EVENT)
            .where_eq("organiserID", organiser_id)
            .where_gte("eventStartDateTime", start.to_rfc3339())
            .where_lt("eventStartDateTime", end.to_rfc3339())
    }

    /// Events of an organiser inside the statistics window
    pub async fn list_in_window(&self, organiser_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Event>> {
        let docs = self.store.query(&Self::window_query(organiser_id, start, end)).await?;
        decode_all(&docs)
    }
}
