//! Aggregated dashboard views
//!
//! Each view watches one filtered collection, joins every record with the
//! student (and, for feedback, the registration) it refers to, and splits
//! the joined rows into two numbered lists. Every change triggers a full
//! re-fetch and re-join; row counts are small enough that diffing is not
//! worth its complexity.
//!
//! A record whose related document is missing or unreadable is left out of
//! both lists and reported in `missing` instead of failing the whole view.

use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use serde::de::DeserializeOwned;
use crate::database::document::collections;
use crate::database::repositories::{FeedbackRepository, RedemptionRepository, RegistrationRepository};
use crate::database::{DatabaseService, Snapshot, Subscription, UserRepository};
use crate::models::{Faculty, Feedback, Redemption, Registration, User};
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, UniExpError};
use crate::utils::logging::{log_admin_action, log_dropped_row};

/// A row with its 1-based display number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Numbered<T> {
    pub bil: usize,
    #[serde(flatten)]
    pub row: T,
}

/// Number rows 1..=n in their current order
pub fn number_rows<T>(rows: Vec<T>) -> Vec<Numbered<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| Numbered { bil: index + 1, row })
        .collect()
}

/// Split rows on a predicate result, keeping order and numbering each side
pub fn partition_rows<T>(rows: Vec<(bool, T)>) -> (Vec<Numbered<T>>, Vec<Numbered<T>>) {
    let (matched, unmatched): (Vec<_>, Vec<_>) = rows.into_iter().partition(|(flag, _)| *flag);
    (
        number_rows(matched.into_iter().map(|(_, row)| row).collect()),
        number_rows(unmatched.into_iter().map(|(_, row)| row).collect()),
    )
}

/// A record that could not be joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MissingRelation {
    User { record_id: String, student_id: String },
    Registration { record_id: String, registration_id: String },
    Merchandise { merchandise_id: String },
    /// A stored document that cannot be decoded
    Malformed { collection: String, document_id: String, reason: String },
}

/// Rows split into two exclusive buckets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionedView<T> {
    pub key: String,
    pub matched: Vec<Numbered<T>>,
    pub unmatched: Vec<Numbered<T>>,
    pub missing: Vec<MissingRelation>,
}

impl<T> PartitionedView<T> {
    fn build(key: &str, rows: Vec<(bool, T)>, missing: Vec<MissingRelation>) -> Self {
        let (matched, unmatched) = partition_rows(rows);
        Self {
            key: key.to_string(),
            matched,
            unmatched,
            missing,
        }
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

/// `matched` = attended, `unmatched` = absent
pub type AttendanceView = PartitionedView<AttendeeRow>;
/// `matched` = payment verified, `unmatched` = awaiting verification
pub type ParticipantView = PartitionedView<ParticipantRow>;
/// `matched` = collected, `unmatched` = awaiting collection
pub type RedemptionView = PartitionedView<RedemptionRow>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRow {
    pub registration_id: String,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub year_of_study: u8,
    pub faculty: Faculty,
    pub scanned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRow {
    pub registration_id: String,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub year_of_study: u8,
    pub faculty: Faculty,
    pub payment_proof: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRow {
    pub feedback_id: String,
    pub registration_id: String,
    pub name: String,
    pub email: String,
    pub event_rating: u8,
    pub gamification_rating: u8,
    pub overall_improvement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRow {
    pub redemption_id: String,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub selected_size: Option<String>,
    pub quantity: u32,
    pub collected: bool,
}

/// Feedback has no partition: one numbered list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackView {
    pub key: String,
    pub rows: Vec<Numbered<FeedbackRow>>,
    pub missing: Vec<MissingRelation>,
}

impl FeedbackView {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Mean event and gamification ratings, `None` without feedback
    pub fn average_ratings(&self) -> Option<(f64, f64)> {
        if self.rows.is_empty() {
            return None;
        }
        let n = self.rows.len() as f64;
        let event: u32 = self.rows.iter().map(|r| r.row.event_rating as u32).sum();
        let gamification: u32 = self.rows.iter().map(|r| r.row.gamification_rating as u32).sum();
        Some((event as f64 / n, gamification as f64 / n))
    }
}

/// Outcome of fetching a related document
#[derive(Debug, Clone)]
enum Lookup<T> {
    Found(T),
    Missing,
    Malformed(String),
}

impl<T> Lookup<T> {
    /// Store failures still fail the view; decode failures only the row
    fn from_result(result: Result<Option<T>>) -> Result<Self> {
        match result {
            Ok(Some(value)) => Ok(Lookup::Found(value)),
            Ok(None) => Ok(Lookup::Missing),
            Err(UniExpError::Serialization(e)) => Ok(Lookup::Malformed(e.to_string())),
            Err(e) => Err(e),
        }
    }
}

/// Decode a snapshot, reporting unreadable documents instead of failing
fn decode_rows<T: DeserializeOwned>(
    view: &str,
    collection: &str,
    docs: &Snapshot,
    missing: &mut Vec<MissingRelation>,
) -> Vec<T> {
    let mut rows = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.decode() {
            Ok(row) => rows.push(row),
            Err(e) => {
                log_dropped_row(view, &doc.id, collection);
                missing.push(MissingRelation::Malformed {
                    collection: collection.to_string(),
                    document_id: doc.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    rows
}

/// Per-recompute cache so a student appearing twice is fetched once
struct StudentDirectory<'a> {
    view: &'static str,
    users: &'a UserRepository,
    cache: HashMap<String, Lookup<User>>,
}

impl<'a> StudentDirectory<'a> {
    fn new(view: &'static str, users: &'a UserRepository) -> Self {
        Self {
            view,
            users,
            cache: HashMap::new(),
        }
    }

    /// The student behind `record_id`, or the reason the row is dropped
    async fn join(&mut self, record_id: &str, student_id: &str) -> Result<std::result::Result<User, MissingRelation>> {
        let lookup = match self.cache.get(student_id) {
            Some(cached) => cached.clone(),
            None => {
                let lookup = Lookup::from_result(self.users.find_by_id(student_id).await)?;
                self.cache.insert(student_id.to_string(), lookup.clone());
                lookup
            }
        };

        Ok(match lookup {
            Lookup::Found(user) => Ok(user),
            Lookup::Missing => {
                log_dropped_row(self.view, record_id, student_id);
                Err(MissingRelation::User {
                    record_id: record_id.to_string(),
                    student_id: student_id.to_string(),
                })
            }
            Lookup::Malformed(reason) => {
                log_dropped_row(self.view, record_id, student_id);
                Err(MissingRelation::Malformed {
                    collection: collections::USER.to_string(),
                    document_id: student_id.to_string(),
                    reason,
                })
            }
        })
    }
}

async fn build_attendance(db: &DatabaseService, event_id: &str, docs: &Snapshot) -> Result<AttendanceView> {
    let mut missing = Vec::new();
    let registrations: Vec<Registration> = decode_rows("attendance", collections::REGISTRATION, docs, &mut missing);
    let mut students = StudentDirectory::new("attendance", &db.users);
    let mut rows = Vec::with_capacity(registrations.len());

    for registration in registrations {
        match students.join(&registration.id, &registration.student_id).await? {
            Ok(user) => rows.push((
                registration.is_attended,
                AttendeeRow {
                    registration_id: registration.id,
                    student_id: registration.student_id,
                    name: user.full_name(),
                    email: user.email,
                    year_of_study: user.year_of_study,
                    faculty: user.faculty,
                    scanned_at: registration.attendance_scanned_time,
                },
            )),
            Err(dropped) => missing.push(dropped),
        }
    }

    Ok(PartitionedView::build(event_id, rows, missing))
}

async fn build_participants(db: &DatabaseService, event_id: &str, docs: &Snapshot) -> Result<ParticipantView> {
    let mut missing = Vec::new();
    let registrations: Vec<Registration> = decode_rows("participants", collections::REGISTRATION, docs, &mut missing);
    let mut students = StudentDirectory::new("participants", &db.users);
    let mut rows = Vec::with_capacity(registrations.len());

    for registration in registrations {
        match students.join(&registration.id, &registration.student_id).await? {
            Ok(user) => rows.push((
                registration.is_verified,
                ParticipantRow {
                    registration_id: registration.id,
                    student_id: registration.student_id,
                    name: user.full_name(),
                    email: user.email,
                    year_of_study: user.year_of_study,
                    faculty: user.faculty,
                    payment_proof: registration.payment_proof_base64,
                    verified: registration.is_verified,
                },
            )),
            Err(dropped) => missing.push(dropped),
        }
    }

    Ok(PartitionedView::build(event_id, rows, missing))
}

async fn build_feedback(db: &DatabaseService, event_id: &str, docs: &Snapshot) -> Result<FeedbackView> {
    let mut missing = Vec::new();
    let entries: Vec<Feedback> = decode_rows("feedback", collections::FEEDBACK, docs, &mut missing);
    let mut students = StudentDirectory::new("feedback", &db.users);
    let mut rows = Vec::with_capacity(entries.len());

    for feedback in entries {
        let registration = match Lookup::from_result(db.registrations.find_by_id(&feedback.registration_id).await)? {
            Lookup::Found(registration) => registration,
            Lookup::Missing => {
                log_dropped_row("feedback", &feedback.id, &feedback.registration_id);
                missing.push(MissingRelation::Registration {
                    record_id: feedback.id,
                    registration_id: feedback.registration_id,
                });
                continue;
            }
            Lookup::Malformed(reason) => {
                log_dropped_row("feedback", &feedback.id, &feedback.registration_id);
                missing.push(MissingRelation::Malformed {
                    collection: collections::REGISTRATION.to_string(),
                    document_id: feedback.registration_id,
                    reason,
                });
                continue;
            }
        };

        match students.join(&feedback.id, &registration.student_id).await? {
            Ok(user) => rows.push(FeedbackRow {
                feedback_id: feedback.id,
                registration_id: feedback.registration_id,
                name: user.full_name(),
                email: user.email,
                event_rating: feedback.event_feedback.value(),
                gamification_rating: feedback.gamification_feedback.value(),
                overall_improvement: feedback.overall_improvement,
            }),
            Err(dropped) => missing.push(dropped),
        }
    }

    Ok(FeedbackView {
        key: event_id.to_string(),
        rows: number_rows(rows),
        missing,
    })
}

async fn build_redemptions(db: &DatabaseService, merchandise_id: &str, docs: &Snapshot) -> Result<RedemptionView> {
    if db.merchandise.find_by_id(merchandise_id).await?.is_none() {
        log_dropped_row("redemption", merchandise_id, merchandise_id);
        let missing = vec![MissingRelation::Merchandise {
            merchandise_id: merchandise_id.to_string(),
        }];
        return Ok(PartitionedView::build(merchandise_id, Vec::new(), missing));
    }

    let mut missing = Vec::new();
    let redemptions: Vec<Redemption> = decode_rows("redemption", collections::REDEMPTION, docs, &mut missing);
    let mut students = StudentDirectory::new("redemption", &db.users);
    let mut rows = Vec::with_capacity(redemptions.len());

    for redemption in redemptions {
        match students.join(&redemption.id, &redemption.student_id).await? {
            Ok(user) => rows.push((
                redemption.collected,
                RedemptionRow {
                    redemption_id: redemption.id,
                    student_id: redemption.student_id,
                    name: user.full_name(),
                    email: user.email,
                    selected_size: redemption.selected_size,
                    quantity: redemption.quantity,
                    collected: redemption.collected,
                },
            )),
            Err(dropped) => missing.push(dropped),
        }
    }

    Ok(PartitionedView::build(merchandise_id, rows, missing))
}

/// Builds the attendance, participant, feedback and redemption views
#[derive(Debug, Clone)]
pub struct AggregationService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl AggregationService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    pub async fn attendance_view(&self, event_id: &str) -> Result<AttendanceView> {
        let docs = self.db.store.query(&RegistrationRepository::event_query(event_id)).await?;
        build_attendance(&self.db, event_id, &docs).await
    }

    pub async fn watch_attendance(&self, event_id: &str) -> Result<Subscription<AttendanceView>> {
        let source = self.db.store.subscribe(RegistrationRepository::event_query(event_id)).await?;
        let db = self.db.clone();
        let key = event_id.to_string();
        debug!(event_id = %key, "Watching attendance");

        Ok(source.map_snapshots(format!("attendance:{}", event_id), move |docs| {
            let db = db.clone();
            let key = key.clone();
            async move { build_attendance(&db, &key, &docs).await }
        }))
    }

    pub async fn participants_view(&self, event_id: &str) -> Result<ParticipantView> {
        let docs = self.db.store.query(&RegistrationRepository::event_query(event_id)).await?;
        build_participants(&self.db, event_id, &docs).await
    }

    pub async fn watch_participants(&self, event_id: &str) -> Result<Subscription<ParticipantView>> {
        let source = self.db.store.subscribe(RegistrationRepository::event_query(event_id)).await?;
        let db = self.db.clone();
        let key = event_id.to_string();

        Ok(source.map_snapshots(format!("participants:{}", event_id), move |docs| {
            let db = db.clone();
            let key = key.clone();
            async move { build_participants(&db, &key, &docs).await }
        }))
    }

    pub async fn feedback_view(&self, event_id: &str) -> Result<FeedbackView> {
        let docs = self.db.store.query(&FeedbackRepository::event_query(event_id)).await?;
        build_feedback(&self.db, event_id, &docs).await
    }

    pub async fn watch_feedback(&self, event_id: &str) -> Result<Subscription<FeedbackView>> {
        let source = self.db.store.subscribe(FeedbackRepository::event_query(event_id)).await?;
        let db = self.db.clone();
        let key = event_id.to_string();

        Ok(source.map_snapshots(format!("feedback:{}", event_id), move |docs| {
            let db = db.clone();
            let key = key.clone();
            async move { build_feedback(&db, &key, &docs).await }
        }))
    }

    pub async fn redemption_view(&self, merchandise_id: &str) -> Result<RedemptionView> {
        let docs = self
            .db
            .store
            .query(&RedemptionRepository::merchandise_query(merchandise_id))
            .await?;
        build_redemptions(&self.db, merchandise_id, &docs).await
    }

    pub async fn watch_redemptions(&self, merchandise_id: &str) -> Result<Subscription<RedemptionView>> {
        let source = self
            .db
            .store
            .subscribe(RedemptionRepository::merchandise_query(merchandise_id))
            .await?;
        let db = self.db.clone();
        let key = merchandise_id.to_string();

        Ok(source.map_snapshots(format!("redemption:{}", merchandise_id), move |docs| {
            let db = db.clone();
            let key = key.clone();
            async move { build_redemptions(&db, &key, &docs).await }
        }))
    }

    /// Approve or revoke a participant's payment proof
    pub async fn set_verified(&self, registration_id: &str, verified: bool) -> Result<()> {
        let result = async {
            self.db.registrations.get(registration_id).await?;
            self.db.registrations.set_verified(registration_id, verified).await
        }
        .await;

        if result.is_ok() {
            log_admin_action("set_verified", registration_id, Some(if verified { "verified" } else { "unverified" }));
        }
        self.notifications.report(result, |_| {
            if verified {
                "Participant verified.".to_string()
            } else {
                "Participant verification revoked.".to_string()
            }
        })
    }

    /// Mark a redemption as collected or not; fully reversible
    pub async fn set_collected(&self, redemption_id: &str, collected: bool) -> Result<()> {
        let result = self.db.redemptions.set_collected(redemption_id, collected).await;

        if result.is_ok() {
            log_admin_action("set_collected", redemption_id, Some(if collected { "collected" } else { "uncollected" }));
        }
        self.notifications.report(result, |_| {
            if collected {
                "Marked as collected.".to_string()
            } else {
                "Marked as not collected.".to_string()
            }
        })
    }
}
