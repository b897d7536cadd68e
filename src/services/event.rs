//! Event details service
//!
//! The details form sends only the top-level keys that actually changed.

use serde_json::{Map, Value};
use tracing::debug;
use crate::config::UploadsConfig;
use crate::database::document::encode;
use crate::database::{DatabaseService, FieldUpdate, FieldUpdates};
use crate::models::Event;
use crate::services::images::ImagePolicy;
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, ValidationErrors};
use crate::utils::logging::log_admin_action;

/// Field updates turning `original` into `edited`, one per changed key
pub fn diff_fields(original: &Map<String, Value>, edited: &Map<String, Value>) -> FieldUpdates {
    let mut updates: FieldUpdates = edited
        .iter()
        .filter(|(key, value)| original.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), FieldUpdate::Set(value.clone())))
        .collect();

    updates.extend(
        original
            .keys()
            .filter(|key| !edited.contains_key(key.as_str()))
            .map(|key| (key.clone(), FieldUpdate::Delete)),
    );
    updates
}

#[derive(Debug, Clone)]
pub struct EventService {
    db: DatabaseService,
    notifications: NotificationService,
    images: ImagePolicy,
    payment_proof: ImagePolicy,
}

impl EventService {
    pub fn new(db: DatabaseService, notifications: NotificationService, uploads: &UploadsConfig) -> Self {
        Self {
            db,
            notifications,
            images: ImagePolicy::event_images(uploads),
            payment_proof: ImagePolicy::payment_proof(uploads),
        }
    }

    pub fn validate(&self, event: &Event) -> Result<()> {
        let mut errors = ValidationErrors::new();

        if event.name.trim().is_empty() {
            errors.add("name", "Event name is required");
        }
        if event.location.name.trim().is_empty() {
            errors.add("location", "Location is required");
        }
        if event.event_end_date_time < event.event_start_date_time {
            errors.add("eventEndDateTime", "Event cannot end before it starts");
        }
        if event.registration_closing_date > event.event_start_date_time {
            errors.add("registrationClosingDate", "Registration must close before the event starts");
        }
        if event.capacity == Some(0) {
            errors.add("capacity", "Capacity must be greater than 0");
        }
        self.images.check("images", &event.images, &mut errors);

        errors.into_result()
    }

    /// Check a payment proof payload against its size cap
    pub fn validate_payment_proof(&self, payload: &str) -> Result<()> {
        let mut errors = ValidationErrors::new();
        self.payment_proof
            .check("paymentProofBase64", std::slice::from_ref(&payload.to_string()), &mut errors);
        errors.into_result()
    }

    /// Save the details form; returns the keys that were written
    pub async fn update_details(&self, event_id: &str, original: &Event, edited: &Event) -> Result<Vec<String>> {
        self.validate(edited)?;

        let updates = diff_fields(&encode(original)?, &encode(edited)?);
        if updates.is_empty() {
            debug!(event_id = %event_id, "No event changes to save");
            return Ok(Vec::new());
        }

        let changed: Vec<String> = updates.iter().map(|(key, _)| key.clone()).collect();
        let result = self.db.events.update_fields(event_id, updates).await;
        if result.is_ok() {
            log_admin_action("update_event", event_id, Some(&changed.join(",")));
        }
        self.notifications
            .report(result, |_| "Event details saved.".to_string())
            .map(|_| changed)
    }
}
