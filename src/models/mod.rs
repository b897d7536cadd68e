//! Data models module
//!
//! Records as they are stored in the document store. Field names follow the
//! store's keys (`eventID`, `isAttended`, ...).

pub mod event;
pub mod registration;
pub mod user;
pub mod quest;
pub mod feedback;
pub mod merchandise;

// Re-export commonly used models
pub use event::{Event, EventCategory, EventStatus, Location};
pub use registration::Registration;
pub use user::{User, Faculty};
pub use quest::{QuestCollection, QuestListItem, QuestProgress, QuestProgressListItem, QuestType};
pub use feedback::{Feedback, Likert};
pub use merchandise::{Merchandise, MerchandiseCategory, Redemption};
