//! Store wrappers for fault injection and query inspection

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use serde_json::{Map, Value};
use uniexp_admin::database::{Document, DocumentStore, FieldUpdates, Filter, Query, Snapshot, Subscription, WriteOp};
use uniexp_admin::{Result, UniExpError};

/// Fails every write to the chosen collections until healed
#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    failing: Mutex<HashSet<String>>,
    rejected: Mutex<usize>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            rejected: Mutex::new(0),
        }
    }

    pub fn fail_writes_to(&self, collection: impl Into<String>) {
        self.failing.lock().unwrap().insert(collection.into());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Number of writes refused so far
    pub fn rejected(&self) -> usize {
        *self.rejected.lock().unwrap()
    }

    fn check(&self, collection: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(collection) {
            *self.rejected.lock().unwrap() += 1;
            return Err(UniExpError::Store(format!("injected failure writing to {}", collection)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    fn backend(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        self.inner.query(query).await
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String> {
        self.check(collection)?;
        self.inner.add(collection, data).await
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()> {
        self.check(collection)?;
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> Result<()> {
        self.check(collection)?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check(collection)?;
        self.inner.delete(collection, id).await
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        for write in &writes {
            self.check(write.collection())?;
        }
        self.inner.commit(writes).await
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription<Snapshot>> {
        self.inner.subscribe(query).await
    }
}

/// Records every one-shot query before passing it on
#[derive(Debug)]
pub struct RecordingStore {
    inner: Arc<dyn DocumentStore>,
    queries: Mutex<Vec<Query>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    /// Value counts of every `IN` filter issued against `collection`
    pub fn in_batch_sizes(&self, collection: &str) -> Vec<usize> {
        self.queries()
            .iter()
            .filter(|query| query.collection == collection)
            .flat_map(|query| {
                query.filters.iter().filter_map(|filter| match filter {
                    Filter::In(_, values) => Some(values.len()),
                    _ => None,
                })
            })
            .collect()
    }

    pub fn clear(&self) {
        self.queries.lock().unwrap().clear();
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    fn backend(&self) -> &str {
        "recording"
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.query(query).await
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String> {
        self.inner.add(collection, data).await
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()> {
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> Result<()> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.inner.delete(collection, id).await
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        self.inner.commit(writes).await
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription<Snapshot>> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.subscribe(query).await
    }
}
