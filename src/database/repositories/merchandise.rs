//! Merchandise and redemption repositories

use std::sync::Arc;
use serde_json::Value;
use crate::database::document::{collections, encode, FieldUpdate, FieldUpdates, Query};
use crate::database::store::DocumentStore;
use crate::models::merchandise::{Merchandise, Redemption};
use crate::utils::errors::{Result, UniExpError};

#[derive(Debug, Clone)]
pub struct MerchandiseRepository {
    store: Arc<dyn DocumentStore>,
}

impl MerchandiseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, merchandise: &Merchandise) -> Result<String> {
        self.store.add(collections::MERCHANDISE, encode(merchandise)?).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Merchandise>> {
        match self.store.get(collections::MERCHANDISE, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Merchandise> {
        self.find_by_id(id).await?.ok_or_else(|| UniExpError::MerchandiseNotFound {
            merchandise_id: id.to_string(),
        })
    }

    pub async fn update_fields(&self, id: &str, fields: FieldUpdates) -> Result<()> {
        self.store.update(collections::MERCHANDISE, id, fields).await
    }
}

#[derive(Debug, Clone)]
pub struct RedemptionRepository {
    store: Arc<dyn DocumentStore>,
}

impl RedemptionRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, redemption: &Redemption) -> Result<String> {
        self.store.add(collections::REDEMPTION, encode(redemption)?).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Redemption>> {
        match self.store.get(collections::REDEMPTION, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub fn merchandise_query(merchandise_id: &str) -> Query {
        Query::collection(collections::REDEMPTION).where_eq("merchandiseID", merchandise_id)
    }

    /// Toggle the collected flag
    pub async fn set_collected(&self, id: &str, collected: bool) -> Result<()> {
        if self.find_by_id(id).await?.is_none() {
            return Err(UniExpError::RedemptionNotFound { redemption_id: id.to_string() });
        }

        self.store
            .update(
                collections::REDEMPTION,
                id,
                vec![("collected".to_string(), FieldUpdate::Set(Value::Bool(collected)))],
            )
            .await
    }
}
