//! UniEXP Admin Core
//!
//! The non-UI core of the UniEXP administrative dashboard: typed records over
//! a document store, live aggregated views of attendance, participants,
//! feedback and redemptions, quest creation with fan-out to every participant,
//! attendance verification, dashboard statistics, Excel export and signed
//! deep-link tokens.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, UniExpError};

// Re-export main components for easy access
pub use database::{DatabaseService, DocumentStore, MemoryStore, Subscription};
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
