//! Attendance verification
//!
//! Marking a registration as attended also completes the event's attendance
//! quest for the student, provided the student has not touched it yet. Every
//! lookup runs before the first write and both writes go out as one atomic
//! batch, so a failed lookup or a rejected commit leaves nothing behind.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use crate::database::{collections, DatabaseService, FieldUpdate, WriteOp};
use crate::models::quest::QuestType;
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, UniExpError};
use crate::utils::logging::log_admin_action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceOutcome {
    /// Attendance recorded and the attendance quest completed
    QuestCompleted,
    /// Attendance recorded; the quest had already been progressed
    AttendanceOnly,
}

impl AttendanceOutcome {
    pub fn message(self) -> &'static str {
        match self {
            AttendanceOutcome::QuestCompleted => "Attendance verified and attendance quest completed.",
            AttendanceOutcome::AttendanceOnly => "Attendance verified.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl AttendanceService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Verify a scanned attendance
    pub async fn verify_attendance(&self, student_id: &str, registration_id: &str) -> Result<AttendanceOutcome> {
        let result = self.mark_attended(student_id, registration_id).await;
        if let Ok(outcome) = &result {
            log_admin_action("verify_attendance", registration_id, Some(outcome.message()));
        }
        self.notifications.report(result, |outcome| outcome.message().to_string())
    }

    async fn mark_attended(&self, student_id: &str, registration_id: &str) -> Result<AttendanceOutcome> {
        let registration = self.db.registrations.get(registration_id).await?;
        if registration.student_id != student_id {
            return Err(UniExpError::InvalidInput(format!(
                "registration {} does not belong to student {}",
                registration_id, student_id
            )));
        }
        let event_id = registration.event_id.as_str();

        let quest_not_found = || UniExpError::QuestNotFound {
            event_id: event_id.to_string(),
            quest_type: QuestType::Attendance.to_string(),
        };
        let progress_not_found = || UniExpError::QuestProgressNotFound {
            event_id: event_id.to_string(),
            student_id: student_id.to_string(),
        };

        let wrapper = self.db.quests.find_collection(event_id).await?.ok_or_else(quest_not_found)?;
        let quest = self
            .db
            .quests
            .find_by_type(&wrapper.id, QuestType::Attendance)
            .await?
            .ok_or_else(quest_not_found)?;
        let container = self
            .db
            .quest_progress
            .find_container(event_id, student_id)
            .await?
            .ok_or_else(progress_not_found)?;
        let item = self
            .db
            .quest_progress
            .find_item(&container.id, &quest.id)
            .await?
            .ok_or_else(progress_not_found)?;

        let mut writes = vec![WriteOp::Update {
            collection: collections::REGISTRATION.to_string(),
            id: registration.id.clone(),
            fields: vec![
                ("isAttended".to_string(), FieldUpdate::Set(Value::Bool(true))),
                ("attendanceScannedTime".to_string(), FieldUpdate::ServerTimestamp),
            ],
        }];

        let outcome = if item.is_untouched() {
            writes.push(WriteOp::Update {
                collection: collections::quest_progress_list(&container.id),
                id: item.id.clone(),
                fields: vec![
                    ("isCompleted".to_string(), FieldUpdate::Set(Value::Bool(true))),
                    ("progress".to_string(), FieldUpdate::Increment(1)),
                ],
            });
            AttendanceOutcome::QuestCompleted
        } else {
            debug!(
                registration_id = %registration_id,
                progress = item.progress,
                completed = item.is_completed,
                "Attendance quest already progressed"
            );
            AttendanceOutcome::AttendanceOnly
        };

        self.db.store.commit(writes).await?;
        info!(event_id = %event_id, student_id = %student_id, outcome = ?outcome, "Attendance verified");
        Ok(outcome)
    }

    /// Undo an attendance scan; quest progress is left as it is
    pub async fn revoke_attendance(&self, registration_id: &str) -> Result<()> {
        let result = async {
            self.db.registrations.get(registration_id).await?;
            self.db.registrations.clear_attendance(registration_id).await
        }
        .await;

        if result.is_ok() {
            log_admin_action("revoke_attendance", registration_id, None);
        }
        self.notifications.report(result, |_| "Attendance revoked.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages_differ() {
        assert_ne!(
            AttendanceOutcome::QuestCompleted.message(),
            AttendanceOutcome::AttendanceOnly.message()
        );
    }
}
