//! Error handling for UniEXP admin
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Main error type for UniEXP admin operations
#[derive(Error, Debug)]
pub enum UniExpError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: String },

    #[error("Merchandise not found: {merchandise_id}")]
    MerchandiseNotFound { merchandise_id: String },

    #[error("Redemption not found: {redemption_id}")]
    RedemptionNotFound { redemption_id: String },

    #[error("No {quest_type} quest defined for event {event_id}")]
    QuestNotFound { event_id: String, quest_type: String },

    #[error("Quest progress not found for student {student_id} in event {event_id}")]
    QuestProgressNotFound { event_id: String, student_id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Link token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Spreadsheet export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Quest {quest_id} reached only part of its participants ({failed} containers failed)")]
    IncompleteFanOut { quest_id: String, failed: usize },
}

/// Result type alias for UniEXP admin operations
pub type Result<T> = std::result::Result<T, UniExpError>;

impl UniExpError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            UniExpError::Database(_) => true,
            UniExpError::Migration(_) => false,
            UniExpError::Store(_) => true,
            UniExpError::DocumentNotFound { .. } => false,
            UniExpError::EventNotFound { .. } => false,
            UniExpError::UserNotFound { .. } => false,
            UniExpError::RegistrationNotFound { .. } => false,
            UniExpError::MerchandiseNotFound { .. } => false,
            UniExpError::RedemptionNotFound { .. } => false,
            UniExpError::QuestNotFound { .. } => false,
            UniExpError::QuestProgressNotFound { .. } => false,
            UniExpError::Validation(_) => false,
            UniExpError::InvalidInput(_) => false,
            UniExpError::Config(_) => false,
            UniExpError::Serialization(_) => false,
            UniExpError::Io(_) => true,
            UniExpError::UrlParse(_) => false,
            UniExpError::Token(_) => false,
            UniExpError::Export(_) => false,
            UniExpError::IncompleteFanOut { .. } => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            UniExpError::Database(_) => ErrorSeverity::Critical,
            UniExpError::Migration(_) => ErrorSeverity::Critical,
            UniExpError::Config(_) => ErrorSeverity::Critical,
            UniExpError::Validation(_) => ErrorSeverity::Info,
            UniExpError::InvalidInput(_) => ErrorSeverity::Info,
            UniExpError::Token(_) => ErrorSeverity::Warning,
            UniExpError::IncompleteFanOut { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether this is one of the lookup-empty variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            UniExpError::DocumentNotFound { .. }
                | UniExpError::EventNotFound { .. }
                | UniExpError::UserNotFound { .. }
                | UniExpError::RegistrationNotFound { .. }
                | UniExpError::MerchandiseNotFound { .. }
                | UniExpError::RedemptionNotFound { .. }
                | UniExpError::QuestNotFound { .. }
                | UniExpError::QuestProgressNotFound { .. }
        )
    }

    /// Message shown to an administrator in the dashboard notification area
    pub fn user_message(&self) -> String {
        match self {
            UniExpError::Database(_) | UniExpError::Store(_) => {
                "The database could not be reached. Please try again.".to_string()
            }
            UniExpError::Validation(errors) => {
                format!("Please correct the highlighted fields ({}).", errors.fields().join(", "))
            }
            UniExpError::IncompleteFanOut { failed, .. } => format!(
                "The quest was created but {} participant(s) could not be updated. Retry to finish.",
                failed
            ),
            UniExpError::Token(_) => "This link is invalid or has expired.".to_string(),
            other if other.is_not_found() => other.to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Per-field form validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field; the first message for a field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise `UniExpError::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(UniExpError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_keep_first_message() {
        let mut errors = ValidationErrors::new();
        errors.add("points", "Points are required");
        errors.add("points", "Points must be greater than 0");
        errors.add("diamonds", "Diamonds are required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("points"), Some("Points are required"));
        assert_eq!(errors.fields(), vec!["diamonds", "points"]);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_not_found_classification() {
        let err = UniExpError::QuestNotFound {
            event_id: "e1".to_string(),
            quest_type: "attendance".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.user_message().contains("attendance"));

        let err = UniExpError::Store("timeout".to_string());
        assert!(!err.is_not_found());
        assert!(err.is_recoverable());
    }
}
