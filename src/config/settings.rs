//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub links: LinksConfig,
    pub dashboard: DashboardConfig,
    pub uploads: UploadsConfig,
    pub export: ExportConfig,
}

/// Which document store implementation backs the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Postgres NOTIFY channel carrying changed collection paths
    pub notify_channel: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    pub json: bool,
}

/// Deep-link token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinksConfig {
    pub base_url: String,
    pub secret: String,
    pub token_ttl_seconds: u64,
}

/// Dashboard statistics configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub trend_window_months: u32,
    /// Upper bound of event ids per `IN` query
    pub registration_batch_size: usize,
}

/// Image upload limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadsConfig {
    pub max_images: usize,
    pub event_image_max_bytes: usize,
    pub payment_proof_max_bytes: usize,
    pub merchandise_image_max_bytes: usize,
}

/// Spreadsheet export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub column_width: f64,
    pub output_dir: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from a specific file (extension optional) layered over defaults
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("UNIEXP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::UniExpError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                url: "postgresql://localhost/uniexp".to_string(),
                max_connections: 10,
                min_connections: 1,
                notify_channel: "document_changes".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: "uniexp-admin.log".to_string(),
                json: false,
            },
            links: LinksConfig {
                base_url: "http://localhost:3000".to_string(),
                secret: "change-me-uniexp-link-secret".to_string(),
                token_ttl_seconds: 7 * 24 * 3600,
            },
            dashboard: DashboardConfig {
                trend_window_months: 12,
                registration_batch_size: 10,
            },
            uploads: UploadsConfig {
                max_images: 4,
                event_image_max_bytes: 50 * 1024,
                payment_proof_max_bytes: 50 * 1024,
                merchandise_image_max_bytes: 100 * 1024,
            },
            export: ExportConfig {
                column_width: 25.0,
                output_dir: "exports".to_string(),
            },
        }
    }
}
