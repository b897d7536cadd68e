//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the UniEXP admin core.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{Result, UniExpError};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file appender on drop and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| UniExpError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log administrator actions with structured data
pub fn log_admin_action(action: &str, target: &str, details: Option<&str>) {
    info!(
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log document store operations
pub fn log_store_operation(operation: &str, collection: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            collection = collection,
            duration_ms = duration_ms,
            "Store operation completed"
        );
    } else {
        error!(
            operation = operation,
            collection = collection,
            duration_ms = duration_ms,
            "Store operation failed"
        );
    }
}

/// Log subscription lifecycle events
pub fn log_subscription_event(view: &str, key: &str, event: &str) {
    debug!(view = view, key = key, event = event, "Subscription event");
}

/// Log a row dropped from an aggregated view because a related record is missing
pub fn log_dropped_row(view: &str, record_id: &str, missing: &str) {
    warn!(
        view = view,
        record_id = record_id,
        missing = missing,
        "Row dropped: related record missing or unreadable"
    );
}

/// Log the outcome of a quest fan-out run
pub fn log_fan_out_result(quest_id: &str, inserted: usize, skipped: usize, failed: usize) {
    if failed == 0 {
        info!(
            quest_id = quest_id,
            inserted = inserted,
            skipped = skipped,
            "Quest fan-out completed"
        );
    } else {
        warn!(
            quest_id = quest_id,
            inserted = inserted,
            skipped = skipped,
            failed = failed,
            "Quest fan-out incomplete"
        );
    }
}
