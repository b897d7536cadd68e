//! Trend and statistics calculator
//!
//! Dashboard figures come from the organiser's events inside a sliding window
//! of months and from the registrations of those events. Registrations are
//! read in batches because the store caps `IN` filters at ten values.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, SelectAll, StreamExt};
use serde::Serialize;
use tracing::debug;
use crate::database::document::MAX_IN_VALUES;
use crate::database::repositories::decode_all;
use crate::database::{DatabaseService, EventRepository, RegistrationRepository, Snapshot, Subscription};
use crate::models::{Event, EventCategory, Registration};
use crate::utils::errors::Result;
use crate::utils::helpers::{chunk_ids, month_key, month_window, round_half_up, window_end, window_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Month-over-month change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub previous: u64,
    pub current: u64,
    pub direction: TrendDirection,
    pub percentage: i64,
}

impl Trend {
    /// Percentage is rounded; a rise from zero counts as 100%
    pub fn between(previous: u64, current: u64) -> Self {
        let direction = match current.cmp(&previous) {
            std::cmp::Ordering::Greater => TrendDirection::Up,
            std::cmp::Ordering::Less => TrendDirection::Down,
            std::cmp::Ordering::Equal => TrendDirection::Flat,
        };

        let percentage = if previous != 0 {
            round_half_up((current as f64 - previous as f64) / previous as f64 * 100.0)
        } else if current != 0 {
            100
        } else {
            0
        };

        Self {
            previous,
            current,
            direction,
            percentage,
        }
    }

    /// Trend between the last two entries of a monthly series
    pub fn of_series(series: &[u64]) -> Self {
        match series {
            [.., previous, current] => Self::between(*previous, *current),
            [current] => Self::between(0, *current),
            [] => Self::between(0, 0),
        }
    }
}

/// Monthly event counts per category and overall
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub months: Vec<String>,
    pub by_category: BTreeMap<EventCategory, Vec<u64>>,
    pub total: Vec<u64>,
}

impl EventCounts {
    /// Bucket events by start month; events outside `months` are ignored
    pub fn tally(events: &[Event], months: &[String]) -> Self {
        let index: HashMap<&str, usize> = months.iter().enumerate().map(|(i, m)| (m.as_str(), i)).collect();
        let mut by_category: BTreeMap<EventCategory, Vec<u64>> = EventCategory::ALL
            .iter()
            .map(|category| (*category, vec![0; months.len()]))
            .collect();
        let mut total = vec![0; months.len()];

        for event in events {
            let key = month_key(event.event_start_date_time);
            if let Some(&slot) = index.get(key.as_str()) {
                if let Some(counts) = by_category.get_mut(&event.category) {
                    counts[slot] += 1;
                }
                total[slot] += 1;
            }
        }

        Self {
            months: months.to_vec(),
            by_category,
            total,
        }
    }

    pub fn trend(&self) -> Trend {
        Trend::of_series(&self.total)
    }

    pub fn category_trend(&self, category: EventCategory) -> Trend {
        self.by_category
            .get(&category)
            .map(|series| Trend::of_series(series))
            .unwrap_or_else(|| Trend::between(0, 0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceTally {
    pub attended: u64,
    pub absent: u64,
}

impl AttendanceTally {
    pub fn from_registrations<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> Self {
        registrations.into_iter().fold(Self::default(), |mut tally, registration| {
            if registration.is_attended {
                tally.attended += 1;
            } else {
                tally.absent += 1;
            }
            tally
        })
    }

    pub fn total(&self) -> u64 {
        self.attended + self.absent
    }

    /// Attended share in percent, 0 without registrations
    pub fn attendance_rate(&self) -> i64 {
        if self.total() == 0 {
            0
        } else {
            round_half_up(self.attended as f64 / self.total() as f64 * 100.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub months: Vec<String>,
    pub events: EventCounts,
    pub event_trend: Trend,
    /// Registrations bucketed by their event's start month
    pub registrations: Vec<u64>,
    pub registration_trend: Trend,
    pub attendance: AttendanceTally,
}

impl DashboardStats {
    pub fn compute(events: &[Event], registrations: &[Registration], months: &[String]) -> Self {
        let counts = EventCounts::tally(events, months);
        let index: HashMap<&str, usize> = months.iter().enumerate().map(|(i, m)| (m.as_str(), i)).collect();
        let event_month: HashMap<&str, usize> = events
            .iter()
            .filter_map(|event| {
                index
                    .get(month_key(event.event_start_date_time).as_str())
                    .map(|slot| (event.id.as_str(), *slot))
            })
            .collect();

        let mut monthly_registrations = vec![0; months.len()];
        for registration in registrations {
            if let Some(&slot) = event_month.get(registration.event_id.as_str()) {
                monthly_registrations[slot] += 1;
            }
        }

        Self {
            months: months.to_vec(),
            event_trend: counts.trend(),
            events: counts,
            registration_trend: Trend::of_series(&monthly_registrations),
            registrations: monthly_registrations,
            attendance: AttendanceTally::from_registrations(registrations),
        }
    }
}

/// Split event ids into `IN`-sized batches
pub fn batch_event_ids(ids: &[String], size: usize) -> Vec<Vec<String>> {
    if ids.is_empty() {
        return Vec::new();
    }
    chunk_ids(ids, size.clamp(1, MAX_IN_VALUES))
}

enum DashboardChange {
    Events(Option<Result<Snapshot>>),
    Batch(usize, Result<Snapshot>),
    Rollover,
}

/// Source of the current time for live dashboards
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Time left until the month containing `now` ends
fn until_rollover(now: DateTime<Utc>) -> std::time::Duration {
    (window_end(now) - now).to_std().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct StatisticsService {
    db: DatabaseService,
    window_months: u32,
    batch_size: usize,
}

impl StatisticsService {
    pub fn new(db: DatabaseService, window_months: u32, batch_size: usize) -> Self {
        Self {
            db,
            window_months,
            batch_size: batch_size.clamp(1, MAX_IN_VALUES),
        }
    }

    /// Sum attended and absent registrations over the given events
    pub async fn attendance_tally(&self, event_ids: &[String]) -> Result<AttendanceTally> {
        let registrations = self.registrations_for(event_ids).await?;
        Ok(AttendanceTally::from_registrations(&registrations))
    }

    async fn registrations_for(&self, event_ids: &[String]) -> Result<Vec<Registration>> {
        let mut registrations = Vec::new();
        for batch in batch_event_ids(event_ids, self.batch_size) {
            registrations.extend(self.db.registrations.list_for_events(&batch).await?);
        }
        Ok(registrations)
    }

    /// Dashboard figures for the window ending with `now`'s month
    pub async fn dashboard(&self, organiser_id: &str, now: DateTime<Utc>) -> Result<DashboardStats> {
        let events = self
            .db
            .events
            .list_in_window(organiser_id, window_start(now, self.window_months), window_end(now))
            .await?;
        let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        let registrations = self.registrations_for(&ids).await?;

        debug!(organiser_id = %organiser_id, events = events.len(), registrations = registrations.len(), "Dashboard computed");
        Ok(DashboardStats::compute(&events, &registrations, &month_window(now, self.window_months)))
    }

    /// Live dashboard figures
    ///
    /// Recomputed in full whenever the windowed events or any registration
    /// batch changes. Batch subscriptions are rebuilt when the set of
    /// windowed event ids changes.
    pub async fn watch_dashboard(&self, organiser_id: &str) -> Result<Subscription<DashboardStats>> {
        self.watch_dashboard_with_clock(organiser_id, Arc::new(Utc::now)).await
    }

    /// Live dashboard figures with the window taken from `clock`
    ///
    /// The window is re-read on every emission and at each month boundary;
    /// when it moves the events subscription is reopened on the new range.
    pub async fn watch_dashboard_with_clock(
        &self,
        organiser_id: &str,
        clock: Clock,
    ) -> Result<Subscription<DashboardStats>> {
        let window_months = self.window_months;
        let now = clock();
        let mut start = window_start(now, window_months);
        let mut event_updates = self
            .db
            .store
            .subscribe(EventRepository::window_query(organiser_id, start, window_end(now)))
            .await?
            .into_stream();
        let store = self.db.store.clone();
        let organiser = organiser_id.to_string();
        let batch_size = self.batch_size;

        let stream = async_stream::try_stream! {
            let mut events: Vec<Event> = Vec::new();
            let mut batch_ids: Vec<Vec<String>> = Vec::new();
            let mut batch_rows: Vec<Vec<Registration>> = Vec::new();
            let mut batches: SelectAll<BoxStream<'static, (usize, Result<Snapshot>)>> = SelectAll::new();

            loop {
                let change = tokio::select! {
                    next = event_updates.next() => DashboardChange::Events(next),
                    Some((index, snapshot)) = batches.next(), if !batches.is_empty() => {
                        DashboardChange::Batch(index, snapshot)
                    }
                    _ = tokio::time::sleep(until_rollover(clock())) => DashboardChange::Rollover,
                };

                match change {
                    DashboardChange::Events(None) => break,
                    DashboardChange::Events(Some(snapshot)) => {
                        events = decode_all(&snapshot?)?;
                        let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
                        let chunks = batch_event_ids(&ids, batch_size);

                        if chunks != batch_ids {
                            batches = SelectAll::new();
                            batch_rows = Vec::with_capacity(chunks.len());
                            for (index, chunk) in chunks.iter().enumerate() {
                                let mut initial = store.subscribe(RegistrationRepository::batch_query(chunk)).await?;
                                let first = match initial.next().await {
                                    Some(snapshot) => decode_all(&snapshot?)?,
                                    None => Vec::new(),
                                };
                                batch_rows.push(first);
                                batches.push(initial.into_stream().map(move |s| (index, s)).boxed());
                            }
                            batch_ids = chunks;
                        }
                    }
                    DashboardChange::Batch(index, snapshot) => {
                        let rows: Vec<Registration> = decode_all(&snapshot?)?;
                        if let Some(slot) = batch_rows.get_mut(index) {
                            *slot = rows;
                        }
                    }
                    DashboardChange::Rollover => {}
                }

                let now = clock();
                let current_start = window_start(now, window_months);
                if current_start != start {
                    // the reopened subscription's first snapshot drives the next emission
                    debug!(organiser_id = %organiser, window_start = %current_start, "Dashboard window moved");
                    start = current_start;
                    event_updates = store
                        .subscribe(EventRepository::window_query(&organiser, start, window_end(now)))
                        .await?
                        .into_stream();
                    continue;
                }

                let registrations: Vec<Registration> = batch_rows.iter().flatten().cloned().collect();
                yield DashboardStats::compute(&events, &registrations, &month_window(now, window_months));
            }
        };

        Ok(Subscription::new(format!("dashboard:{}", organiser_id), stream))
    }
}
