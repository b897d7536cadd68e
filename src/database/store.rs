//! Document store abstraction
//!
//! The hosted database is an external collaborator. Everything the dashboard
//! needs from it is expressed by [`DocumentStore`]: keyed reads, filtered
//! queries, writes, atomic batches and push-based change subscriptions.

use std::fmt;
use async_trait::async_trait;
use serde_json::{Map, Value};
use super::document::{Document, FieldUpdates, Query, Snapshot, WriteOp};
use super::subscription::Subscription;
use crate::utils::errors::Result;

#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug + 'static {
    /// Backend name, e.g. "memory" or "postgres"
    fn backend(&self) -> &str;

    /// Check whether the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Read one document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Read every document matching the query, in insertion order
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Insert a document under a generated id and return that id
    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String>;

    /// Create or replace a document
    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()>;

    /// Change top-level fields of an existing document
    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> Result<()>;

    /// Remove a document; removing a missing document is not an error
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Apply all writes or none of them
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()>;

    /// Live view of a query: the current result set first, then a fresh
    /// result set after every change to the queried collection
    async fn subscribe(&self, query: Query) -> Result<Subscription<Snapshot>>;
}
