//! User repository implementation

use std::sync::Arc;
use crate::database::document::{collections, encode};
use crate::database::store::DocumentStore;
use crate::models::user::User;
use crate::utils::errors::{Result, UniExpError};

#[derive(Debug, Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a new user under a generated id
    pub async fn create(&self, user: &User) -> Result<String> {
        self.store.add(collections::USER, encode(user)?).await
    }

    /// Create or replace a user under a known id
    pub async fn save(&self, id: &str, user: &User) -> Result<()> {
        self.store.set(collections::USER, id, encode(user)?).await
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        match self.store.get(collections::USER, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Find user by ID, failing when it does not exist
    pub async fn get(&self, id: &str) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| UniExpError::UserNotFound { user_id: id.to_string() })
    }
}
