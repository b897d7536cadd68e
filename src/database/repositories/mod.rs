//! Database repositories module
//!
//! Typed access to each collection on top of a [`DocumentStore`](super::DocumentStore).

pub mod user;
pub mod event;
pub mod registration;
pub mod quest;
pub mod feedback;
pub mod merchandise;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use quest::{QuestRepository, QuestProgressRepository};
pub use feedback::FeedbackRepository;
pub use merchandise::{MerchandiseRepository, RedemptionRepository};

use serde::de::DeserializeOwned;
use super::document::Document;
use crate::utils::errors::Result;

/// Decode every document of a snapshot into a model
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>> {
    documents.iter().map(Document::decode).collect()
}
