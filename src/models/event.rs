//! Event model

use std::fmt;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    pub event_start_date_time: DateTime<Utc>,
    pub event_end_date_time: DateTime<Utc>,
    pub registration_closing_date: DateTime<Utc>,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub payment_proof_required: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: EventStatus,
    #[serde(rename = "organiserID")]
    pub organiser_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Event category, stored as its numeric code 1-7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventCategory {
    Academic,
    Sports,
    Cultural,
    Volunteering,
    Entrepreneurship,
    Technology,
    Leadership,
}

impl EventCategory {
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Academic,
        EventCategory::Sports,
        EventCategory::Cultural,
        EventCategory::Volunteering,
        EventCategory::Entrepreneurship,
        EventCategory::Technology,
        EventCategory::Leadership,
    ];

    pub fn code(self) -> u8 {
        match self {
            EventCategory::Academic => 1,
            EventCategory::Sports => 2,
            EventCategory::Cultural => 3,
            EventCategory::Volunteering => 4,
            EventCategory::Entrepreneurship => 5,
            EventCategory::Technology => 6,
            EventCategory::Leadership => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventCategory::Academic => "Academic",
            EventCategory::Sports => "Sports",
            EventCategory::Cultural => "Cultural",
            EventCategory::Volunteering => "Volunteering",
            EventCategory::Entrepreneurship => "Entrepreneurship",
            EventCategory::Technology => "Technology",
            EventCategory::Leadership => "Leadership",
        }
    }
}

impl TryFrom<u8> for EventCategory {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        EventCategory::ALL
            .iter()
            .copied()
            .find(|category| category.code() == code)
            .ok_or_else(|| format!("unknown event category {}", code))
    }
}

impl From<EventCategory> for u8 {
    fn from(category: EventCategory) -> Self {
        category.code()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Scheduled,
    Postponed,
    Ongoing,
    Cancelled,
    Completed,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            EventStatus::Scheduled => "Scheduled",
            EventStatus::Postponed => "Postponed",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Cancelled => "Cancelled",
            EventStatus::Completed => "Completed",
        };
        f.write_str(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes_round_trip_through_serde() {
        assert_eq!(serde_json::to_value(EventCategory::Technology).unwrap(), serde_json::json!(6));
        let parsed: EventCategory = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(parsed, EventCategory::Cultural);
        assert!(serde_json::from_value::<EventCategory>(serde_json::json!(8)).is_err());
    }
}
