//! Services module
//!
//! This module contains the dashboard's business logic services

pub mod aggregation;
pub mod attendance;
pub mod event;
pub mod export;
pub mod images;
pub mod links;
pub mod merchandise;
pub mod notification;
pub mod quest;
pub mod statistics;

// Re-export commonly used services
pub use aggregation::{AggregationService, AttendanceView, FeedbackView, MissingRelation, Numbered, ParticipantView, RedemptionView};
pub use attendance::{AttendanceOutcome, AttendanceService};
pub use event::EventService;
pub use export::{ExportService, Sheet};
pub use links::{LinkKind, LinkService};
pub use merchandise::{MerchandiseService, MerchandiseUpdate};
pub use notification::{Notice, NoticeLevel, NotificationService, NotificationStats};
pub use quest::{FanOutReport, NewQuest, QuestService, QuestTemplate, Rewards};
pub use statistics::{DashboardStats, StatisticsService, Trend, TrendDirection};

use std::sync::Arc;
use serde::Serialize;
use crate::config::settings::Settings;
use crate::database::{DatabaseService, DocumentStore};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub notifications: NotificationService,
    pub aggregation: AggregationService,
    pub quests: QuestService,
    pub attendance: AttendanceService,
    pub statistics: StatisticsService,
    pub events: EventService,
    pub merchandise: MerchandiseService,
    pub export: ExportService,
    pub links: LinkService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services sharing one store
    pub fn new(store: Arc<dyn DocumentStore>, settings: &Settings) -> Result<Self> {
        let database = DatabaseService::new(store);
        let notifications = NotificationService::new();

        Ok(Self {
            aggregation: AggregationService::new(database.clone(), notifications.clone()),
            quests: QuestService::new(database.clone(), notifications.clone()),
            attendance: AttendanceService::new(database.clone(), notifications.clone()),
            statistics: StatisticsService::new(
                database.clone(),
                settings.dashboard.trend_window_months,
                settings.dashboard.registration_batch_size,
            ),
            events: EventService::new(database.clone(), notifications.clone(), &settings.uploads),
            merchandise: MerchandiseService::new(database.clone(), notifications.clone(), &settings.uploads),
            export: ExportService::new(&settings.export),
            links: LinkService::new(&settings.links)?,
            database,
            notifications,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let store_healthy = self.database.store.health_check().await.unwrap_or(false);

        ServiceHealthStatus {
            store_backend: self.database.store.backend().to_string(),
            store_healthy,
            notifications: self.notifications.stats(),
        }
    }
}

/// Service health status
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub store_backend: String,
    pub store_healthy: bool,
    pub notifications: NotificationStats,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.store_healthy
    }
}
