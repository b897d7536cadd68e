//! Registration model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A student's registration for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "studentID")]
    pub student_id: String,
    #[serde(default)]
    pub is_attended: bool,
    #[serde(default)]
    pub attendance_scanned_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof_base64: Option<String>,
}

impl Registration {
    pub fn new(event_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            event_id: event_id.into(),
            student_id: student_id.into(),
            is_attended: false,
            attendance_scanned_time: None,
            is_verified: false,
            payment_proof_base64: None,
        }
    }
}
