//! Quest service implementation
//!
//! Creating a quest appends it to the event's `questList` and then fans a
//! zero-state progress entry out to every participant container of the
//! event. The fan-out is idempotent: a container that already holds an entry
//! for the quest is skipped, so a partial run can simply be repeated with
//! [`QuestService::reconcile`] until every container is covered.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::database::{collections, DatabaseService};
use crate::models::quest::{QuestListItem, QuestProgress, QuestProgressListItem, QuestType};
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, UniExpError, ValidationErrors};
use crate::utils::logging::{log_admin_action, log_fan_out_result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

pub const EARLY_BIRD_NAME: &str = "Early Bird";
pub const EARLY_BIRD_DESCRIPTION: &str = "Be one of the first participants to check in at the event.";
pub const QNA_NAME: &str = "Q&A";
pub const QNA_DESCRIPTION: &str = "Answer the event question correctly.";
pub const NETWORKING_NAME: &str = "Networking";
pub const NETWORKING_DESCRIPTION: &str = "Connect with other participants during the event.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub points: u32,
    pub diamonds: u32,
}

/// The quest types an administrator can add, with their own parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "questType", rename_all = "camelCase")]
pub enum QuestTemplate {
    EarlyBird { max_early_bird: u32 },
    #[serde(rename = "q&a")]
    QnA { question: String, correct_answer: String },
    Networking { completion_num: u32 },
}

/// A quest as submitted from the creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuest {
    pub template: QuestTemplate,
    pub rewards: Rewards,
}

impl NewQuest {
    pub fn new(template: QuestTemplate, rewards: Rewards) -> Self {
        Self { template, rewards }
    }

    pub fn quest_type(&self) -> QuestType {
        match self.template {
            QuestTemplate::EarlyBird { .. } => QuestType::EarlyBird,
            QuestTemplate::QnA { .. } => QuestType::QnA,
            QuestTemplate::Networking { .. } => QuestType::Networking,
        }
    }

    /// Check every field and report all failures at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        match &self.template {
            QuestTemplate::EarlyBird { max_early_bird } => {
                if *max_early_bird == 0 {
                    errors.add("maxEarlyBird", "Number of early birds must be greater than 0");
                }
            }
            QuestTemplate::QnA { question, correct_answer } => {
                if question.trim().is_empty() {
                    errors.add("question", "Question is required");
                }
                if correct_answer.trim().is_empty() {
                    errors.add("correctAnswer", "Correct answer is required");
                }
            }
            QuestTemplate::Networking { completion_num } => {
                if *completion_num == 0 {
                    errors.add("completionNum", "Number of connections must be greater than 0");
                }
            }
        }

        if self.rewards.points == 0 {
            errors.add("pointsRewards", "Points reward must be greater than 0");
        }
        if self.rewards.diamonds == 0 {
            errors.add("diamondsRewards", "Diamonds reward must be greater than 0");
        }

        errors.into_result()
    }

    /// The `questList` entry for this quest
    pub fn to_item(&self) -> QuestListItem {
        let (quest_name, description, completion_num) = match &self.template {
            QuestTemplate::EarlyBird { .. } => (EARLY_BIRD_NAME, EARLY_BIRD_DESCRIPTION, 1),
            QuestTemplate::QnA { .. } => (QNA_NAME, QNA_DESCRIPTION, 1),
            QuestTemplate::Networking { completion_num } => (NETWORKING_NAME, NETWORKING_DESCRIPTION, *completion_num),
        };

        let mut item = QuestListItem {
            id: String::new(),
            quest_name: quest_name.to_string(),
            description: description.to_string(),
            quest_type: self.quest_type(),
            completion_num,
            points_rewards: self.rewards.points,
            diamonds_rewards: self.rewards.diamonds,
            max_early_bird: None,
            question: None,
            correct_answer: None,
        };

        match &self.template {
            QuestTemplate::EarlyBird { max_early_bird } => item.max_early_bird = Some(*max_early_bird),
            QuestTemplate::QnA { question, correct_answer } => {
                item.question = Some(question.trim().to_string());
                item.correct_answer = Some(correct_answer.trim().to_string());
            }
            QuestTemplate::Networking { .. } => {}
        }

        item
    }
}

/// A container the fan-out could not reach
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedContainer {
    pub container_id: String,
    pub student_id: String,
    pub error: String,
}

/// Outcome of one fan-out run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    pub quest_id: String,
    pub containers: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: Vec<FailedContainer>,
}

impl FanOutReport {
    fn new(quest_id: &str, containers: usize) -> Self {
        Self {
            quest_id: quest_id.to_string(),
            containers,
            inserted: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn a partial run into `IncompleteFanOut`
    pub fn ensure_complete(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(UniExpError::IncompleteFanOut {
                quest_id: self.quest_id,
                failed: self.failed.len(),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestService {
    db: DatabaseService,
    notifications: NotificationService,
    max_attempts: u32,
    retry_delay: Duration,
}

impl QuestService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self {
            db,
            notifications,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Attempts per container before it is reported as failed
    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Id of the event's quest wrapper, creating it when absent
    pub async fn ensure_quest_collection(&self, event_id: &str) -> Result<String> {
        match self.db.quests.find_collection(event_id).await? {
            Some(wrapper) => Ok(wrapper.id),
            None => {
                let id = self.db.quests.create_collection(event_id).await?;
                debug!(event_id = %event_id, quest_doc = %id, "Created quest collection");
                Ok(id)
            }
        }
    }

    /// Every quest of an event; empty when the event has no quest document
    pub async fn list_quests(&self, event_id: &str) -> Result<Vec<QuestListItem>> {
        match self.db.quests.find_collection(event_id).await? {
            Some(wrapper) => self.db.quests.list_items(&wrapper.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Add a quest to an event and fan it out to every participant
    ///
    /// Validation failures make no store call. A run that leaves some
    /// containers unreached still returns `Ok`; check the report or call
    /// [`FanOutReport::ensure_complete`].
    pub async fn create_quest(&self, event_id: &str, quest: &NewQuest) -> Result<FanOutReport> {
        quest.validate()?;

        let result = self.create_and_fan_out(event_id, quest).await;
        match &result {
            Ok(report) if report.is_complete() => {
                log_admin_action("create_quest", event_id, Some(quest.quest_type().as_str()));
                self.notifications.success(format!(
                    "{} quest created for {} participants.",
                    quest.to_item().quest_name,
                    report.containers
                ));
            }
            Ok(report) => self.notifications.failure(&UniExpError::IncompleteFanOut {
                quest_id: report.quest_id.clone(),
                failed: report.failed.len(),
            }),
            Err(e) => self.notifications.failure(e),
        }
        result
    }

    async fn create_and_fan_out(&self, event_id: &str, quest: &NewQuest) -> Result<FanOutReport> {
        let wrapper = self
            .db
            .quests
            .find_collection(event_id)
            .await?
            .ok_or_else(|| UniExpError::DocumentNotFound {
                collection: collections::QUEST.to_string(),
                id: event_id.to_string(),
            })?;

        let quest_id = self.db.quests.add_item(&wrapper.id, &quest.to_item()).await?;
        info!(event_id = %event_id, quest_id = %quest_id, quest_type = %quest.quest_type(), "Quest created");

        self.fan_out(event_id, &quest_id).await
    }

    /// Re-run the fan-out of an existing quest until every container has it
    pub async fn reconcile(&self, event_id: &str, quest_id: &str) -> Result<FanOutReport> {
        let known = self.list_quests(event_id).await?.iter().any(|q| q.id == quest_id);
        if !known {
            return Err(UniExpError::DocumentNotFound {
                collection: collections::QUEST.to_string(),
                id: quest_id.to_string(),
            });
        }

        let result = self.fan_out(event_id, quest_id).await;
        if let Ok(report) = &result {
            log_admin_action("reconcile_quest", quest_id, Some(&format!("{} inserted", report.inserted)));
        }
        self.notifications.report(result, |report| {
            format!("Quest synchronised: {} participants updated.", report.inserted)
        })
    }

    async fn fan_out(&self, event_id: &str, quest_id: &str) -> Result<FanOutReport> {
        let containers = self.db.quest_progress.list_containers(event_id).await?;
        let mut report = FanOutReport::new(quest_id, containers.len());

        for container in &containers {
            match self.attach_with_retry(container, quest_id).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => report.failed.push(FailedContainer {
                    container_id: container.id.clone(),
                    student_id: container.student_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        log_fan_out_result(quest_id, report.inserted, report.skipped, report.failed.len());
        Ok(report)
    }

    async fn attach_with_retry(&self, container: &QuestProgress, quest_id: &str) -> Result<bool> {
        let mut attempt = 1;
        loop {
            match self.attach(&container.id, quest_id).await {
                Ok(inserted) => return Ok(inserted),
                Err(e) if attempt < self.max_attempts && e.is_recoverable() => {
                    warn!(
                        container_id = %container.id,
                        attempt = attempt,
                        error = %e,
                        "Fan-out write failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Insert the zero-state entry unless the container already has one
    async fn attach(&self, container_id: &str, quest_id: &str) -> Result<bool> {
        if self.db.quest_progress.find_item(container_id, quest_id).await?.is_some() {
            return Ok(false);
        }
        self.db
            .quest_progress
            .add_item(container_id, &QuestProgressListItem::zero(quest_id))
            .await?;
        Ok(true)
    }

    /// Give a newly registered student a progress container holding one
    /// zero-state entry per existing quest; returns the container id
    pub async fn enroll_participant(&self, event_id: &str, student_id: &str) -> Result<String> {
        let container_id = match self.db.quest_progress.find_container(event_id, student_id).await? {
            Some(existing) => existing.id,
            None => self.db.quest_progress.create_container(event_id, student_id).await?,
        };

        for quest in self.list_quests(event_id).await? {
            self.attach(&container_id, &quest.id).await?;
        }

        debug!(event_id = %event_id, student_id = %student_id, container_id = %container_id, "Participant enrolled");
        Ok(container_id)
    }
}
