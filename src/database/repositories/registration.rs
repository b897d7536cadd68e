//! Registration repository implementation

use std::sync::Arc;
use serde_json::Value;
use crate::database::document::{collections, encode, FieldUpdate, Query};
use crate::database::store::DocumentStore;
use crate::models::registration::Registration;
use crate::utils::errors::{Result, UniExpError};
use super::decode_all;

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    store: Arc<dyn DocumentStore>,
}

impl RegistrationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Register a student for an event
    pub async fn create(&self, registration: &Registration) -> Result<String> {
        self.store.add(collections::REGISTRATION, encode(registration)?).await
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Registration>> {
        match self.store.get(collections::REGISTRATION, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Find registration by ID, failing when it does not exist
    pub async fn get(&self, id: &str) -> Result<Registration> {
        self.find_by_id(id).await?.ok_or_else(|| UniExpError::RegistrationNotFound {
            registration_id: id.to_string(),
        })
    }

    /// Registrations of one event
    pub fn event_query(event_id: &str) -> Query {
        Query::collection(collections::REGISTRATION).where_eq("eventID", event_id)
    }

    /// Registrations of a batch of events (at most ten ids)
    pub fn batch_query(event_ids: &[String]) -> Query {
        Query::collection(collections::REGISTRATION).where_in("eventID", event_ids.iter().cloned())
    }

    /// Get registrations for a batch of events
    pub async fn list_for_events(&self, event_ids: &[String]) -> Result<Vec<Registration>> {
        let docs = self.store.query(&Self::batch_query(event_ids)).await?;
        decode_all(&docs)
    }

    /// Mark payment proof as verified or not
    pub async fn set_verified(&self, id: &str, verified: bool) -> Result<()> {
        self.store
            .update(
                collections::REGISTRATION,
                id,
                vec![("isVerified".to_string(), FieldUpdate::Set(Value::Bool(verified)))],
            )
            .await
    }

    /// Clear attendance and its scan time
    pub async fn clear_attendance(&self, id: &str) -> Result<()> {
        self.store
            .update(
                collections::REGISTRATION,
                id,
                vec![
                    ("isAttended".to_string(), FieldUpdate::Set(Value::Bool(false))),
                    ("attendanceScannedTime".to_string(), FieldUpdate::Set(Value::Null)),
                ],
            )
            .await
    }
}
