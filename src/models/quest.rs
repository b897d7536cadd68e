//! Quest and quest progress models

use std::fmt;
use serde::{Deserialize, Serialize};

/// Per-event wrapper document owning the `questList` sub-collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCollection {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestType {
    #[serde(rename = "attendance")]
    Attendance,
    #[serde(rename = "earlyBird")]
    EarlyBird,
    #[serde(rename = "q&a")]
    QnA,
    #[serde(rename = "networking")]
    Networking,
    #[serde(rename = "feedback")]
    Feedback,
}

impl QuestType {
    /// Value stored in the `questType` field
    pub fn as_str(self) -> &'static str {
        match self {
            QuestType::Attendance => "attendance",
            QuestType::EarlyBird => "earlyBird",
            QuestType::QnA => "q&a",
            QuestType::Networking => "networking",
            QuestType::Feedback => "feedback",
        }
    }
}

impl fmt::Display for QuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quest of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestListItem {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub quest_name: String,
    pub description: String,
    pub quest_type: QuestType,
    pub completion_num: u32,
    pub points_rewards: u32,
    pub diamonds_rewards: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_early_bird: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// Per-student progress container for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "studentID")]
    pub student_id: String,
}

/// Progress of one student on one quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgressListItem {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "questID")]
    pub quest_id: String,
    pub progress: u32,
    pub is_completed: bool,
    pub rewards_claimed: bool,
}

impl QuestProgressListItem {
    /// Fresh progress entry for a quest
    pub fn zero(quest_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            quest_id: quest_id.into(),
            progress: 0,
            is_completed: false,
            rewards_claimed: false,
        }
    }

    /// No progress made and nothing claimed yet
    pub fn is_untouched(&self) -> bool {
        !self.is_completed && self.progress == 0 && !self.rewards_claimed
    }
}
