//! Database module
//!
//! This module handles the document store: its abstraction, the in-memory and
//! Postgres backends, live subscriptions and the typed repositories.

pub mod connection;
pub mod document;
pub mod store;
pub mod subscription;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check, connect_store};
pub use document::{collections, Document, Filter, FieldUpdate, FieldUpdates, Query, Snapshot, WriteOp};
pub use store::DocumentStore;
pub use subscription::Subscription;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use repositories::{
    EventRepository, FeedbackRepository, MerchandiseRepository, QuestProgressRepository, QuestRepository,
    RedemptionRepository, RegistrationRepository, UserRepository,
};
pub use service::DatabaseService;
