//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::settings::StoreBackend;
use super::Settings;
use crate::database::document::MAX_IN_VALUES;
use crate::utils::errors::{Result, UniExpError};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_store_config(&settings.store)?;
    validate_logging_config(&settings.logging)?;
    validate_links_config(&settings.links)?;
    validate_dashboard_config(&settings.dashboard)?;
    validate_uploads_config(&settings.uploads)?;

    Ok(())
}

/// Validate document store configuration
fn validate_store_config(config: &super::StoreConfig) -> Result<()> {
    if config.backend == StoreBackend::Postgres && config.url.is_empty() {
        return Err(UniExpError::Config("Store URL is required for the postgres backend".to_string()));
    }

    if config.max_connections == 0 {
        return Err(UniExpError::Config("Max connections must be greater than 0".to_string()));
    }

    if config.min_connections > config.max_connections {
        return Err(UniExpError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    if config.notify_channel.is_empty() {
        return Err(UniExpError::Config("Notify channel is required".to_string()));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(UniExpError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(UniExpError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

/// Validate deep-link configuration
fn validate_links_config(config: &super::LinksConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(UniExpError::Config("Link base URL is required".to_string()));
    }

    url::Url::parse(&config.base_url)
        .map_err(|e| UniExpError::Config(format!("Invalid link base URL: {}", e)))?;

    if config.secret.is_empty() {
        return Err(UniExpError::Config("Link signing secret is required".to_string()));
    }

    if config.token_ttl_seconds == 0 {
        return Err(UniExpError::Config("Link token TTL must be greater than 0".to_string()));
    }

    Ok(())
}

/// Validate dashboard configuration
fn validate_dashboard_config(config: &super::DashboardConfig) -> Result<()> {
    if config.trend_window_months < 2 {
        return Err(UniExpError::Config(
            "Trend window must cover at least two months".to_string(),
        ));
    }

    if config.registration_batch_size == 0 || config.registration_batch_size > MAX_IN_VALUES {
        return Err(UniExpError::Config(format!(
            "Registration batch size must be between 1 and {}",
            MAX_IN_VALUES
        )));
    }

    Ok(())
}

/// Validate upload limits
fn validate_uploads_config(config: &super::UploadsConfig) -> Result<()> {
    if config.max_images == 0 {
        return Err(UniExpError::Config("Max images must be greater than 0".to_string()));
    }

    if config.event_image_max_bytes == 0
        || config.payment_proof_max_bytes == 0
        || config.merchandise_image_max_bytes == 0
    {
        return Err(UniExpError::Config("Image size caps must be greater than 0".to_string()));
    }

    Ok(())
}
