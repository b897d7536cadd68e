//! In-process document store
//!
//! Collections keep insertion order. Every committed write publishes the
//! changed collection path on a broadcast channel that drives subscriptions.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use super::document::{apply_updates, Document, FieldUpdates, Query, Snapshot, WriteOp};
use super::store::DocumentStore;
use super::subscription::Subscription;
use crate::utils::errors::{Result, UniExpError};
use crate::utils::helpers::generate_document_id;
use crate::utils::logging::log_store_operation;

const CHANGE_FEED_CAPACITY: usize = 256;

type Collections = HashMap<String, Vec<Document>>;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    changes: broadcast::Sender<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    /// Number of documents currently stored in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let documents = collections
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
            .unwrap_or_default();
        Ok(documents)
    }

    fn publish<'a>(&self, collections: impl IntoIterator<Item = &'a str>) {
        let changed: BTreeSet<&str> = collections.into_iter().collect();
        for collection in changed {
            // No receivers simply means nobody is subscribed yet
            let _ = self.changes.send(collection.to_string());
        }
    }

    fn apply(collections: &mut Collections, write: &WriteOp) -> Result<()> {
        let now = Utc::now();
        match write {
            WriteOp::Set { collection, id, data } => {
                let docs = collections.entry(collection.clone()).or_default();
                match docs.iter_mut().find(|doc| &doc.id == id) {
                    Some(doc) => doc.data = data.clone(),
                    None => docs.push(Document::new(id.clone(), data.clone())),
                }
            }
            WriteOp::Update { collection, id, fields } => {
                let doc = collections
                    .get_mut(collection)
                    .and_then(|docs| docs.iter_mut().find(|doc| &doc.id == id))
                    .ok_or_else(|| UniExpError::DocumentNotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    })?;
                apply_updates(&mut doc.data, fields, now);
            }
            WriteOp::Delete { collection, id } => {
                if let Some(docs) = collections.get_mut(collection) {
                    docs.retain(|doc| &doc.id != id);
                }
            }
        }
        Ok(())
    }

    async fn write(&self, operation: &str, write: WriteOp) -> Result<()> {
        let started = Instant::now();
        let result = {
            let mut collections = self.collections.write().await;
            Self::apply(&mut collections, &write)
        };
        log_store_operation(operation, write.collection(), started.elapsed().as_millis() as u64, result.is_ok());

        if result.is_ok() {
            self.publish([write.collection()]);
        }
        result
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        query.validate()?;
        self.run_query(query).await
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String> {
        let id = generate_document_id();
        self.write(
            "add",
            WriteOp::Set {
                collection: collection.to_string(),
                id: id.clone(),
                data,
            },
        )
        .await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()> {
        self.write(
            "set",
            WriteOp::Set {
                collection: collection.to_string(),
                id: id.to_string(),
                data,
            },
        )
        .await
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> Result<()> {
        self.write(
            "update",
            WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        )
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.write(
            "delete",
            WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )
        .await
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        let started = Instant::now();
        let result = {
            let mut collections = self.collections.write().await;
            // Stage on a copy so a failing write leaves nothing behind
            let mut staged = collections.clone();
            let applied = writes.iter().try_for_each(|write| Self::apply(&mut staged, write));
            if applied.is_ok() {
                *collections = staged;
            }
            applied
        };
        let collection = writes.first().map(WriteOp::collection).unwrap_or("-");
        log_store_operation("commit", collection, started.elapsed().as_millis() as u64, result.is_ok());

        if result.is_ok() {
            debug!(writes = writes.len(), "Batch committed");
            self.publish(writes.iter().map(WriteOp::collection));
        }
        result
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription<Snapshot>> {
        query.validate()?;

        // Subscribe before the first read so no change slips in between
        let mut changes = self.changes.subscribe();
        let store = self.clone();
        let label = format!("memory:{}", query.collection);

        let stream = async_stream::stream! {
            yield store.run_query(&query).await;
            loop {
                match changes.recv().await {
                    Ok(collection) if collection == query.collection => {
                        yield store.run_query(&query).await;
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        yield store.run_query(&query).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(Subscription::new(label, stream))
    }
}
