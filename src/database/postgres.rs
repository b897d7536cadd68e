//! Postgres-backed document store
//!
//! All collections share the `documents` table; `data` holds the record as
//! JSONB and `seq` preserves insertion order. Writes announce the changed
//! collection with `pg_notify`, which [`PgListener`] turns into snapshots.

use std::time::Instant;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnection, PgListener};
use sqlx::PgPool;
use tracing::{debug, error};
use super::document::{apply_updates, Document, FieldUpdates, Query, Snapshot, WriteOp};
use super::store::DocumentStore;
use super::subscription::Subscription;
use crate::utils::errors::{Result, UniExpError};
use crate::utils::helpers::generate_document_id;
use crate::utils::logging::log_store_operation;

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    channel: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch(pool: &PgPool, query: &Query) -> Result<Vec<Document>> {
        let containment = Value::Object(query.equality_object());
        let rows = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY seq ASC",
        )
        .bind(&query.collection)
        .bind(containment)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, data)| match data {
                Value::Object(map) => Some(Document::new(id, map)),
                _ => None,
            })
            .filter(|doc| query.matches(doc))
            .collect())
    }

    async fn notify(conn: &mut PgConnection, channel: &str, collection: &str) -> Result<()> {
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(channel)
            .bind(collection)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn apply(conn: &mut PgConnection, write: &WriteOp) -> Result<()> {
        match write {
            WriteOp::Set { collection, id, data } => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, data)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
                    "#,
                )
                .bind(collection)
                .bind(id)
                .bind(Value::Object(data.clone()))
                .execute(&mut *conn)
                .await?;
            }
            WriteOp::Update { collection, id, fields } => {
                let current = sqlx::query_as::<_, (Value,)>(
                    "SELECT data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
                )
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

                let mut data = match current {
                    Some((Value::Object(map),)) => map,
                    _ => {
                        return Err(UniExpError::DocumentNotFound {
                            collection: collection.clone(),
                            id: id.clone(),
                        })
                    }
                };
                apply_updates(&mut data, fields, Utc::now());

                sqlx::query("UPDATE documents SET data = $3, updated_at = NOW() WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(id)
                    .bind(Value::Object(data))
                    .execute(&mut *conn)
                    .await?;
            }
            WriteOp::Delete { collection, id } => {
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn write_all(&self, operation: &str, writes: &[WriteOp]) -> Result<()> {
        let started = Instant::now();
        let collection = writes.first().map(WriteOp::collection).unwrap_or("-").to_string();

        let result: Result<()> = async {
            let mut tx = self.pool.begin().await?;
            for write in writes {
                Self::apply(&mut *tx, write).await?;
            }
            let mut notified: Vec<&str> = writes.iter().map(WriteOp::collection).collect();
            notified.sort_unstable();
            notified.dedup();
            for changed in notified {
                Self::notify(&mut *tx, &self.channel, changed).await?;
            }
            tx.commit().await?;
            Ok(())
        }
        .await;

        log_store_operation(operation, &collection, started.elapsed().as_millis() as u64, result.is_ok());
        result
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(id, data)| match data {
            Value::Object(map) => Some(Document::new(id, map)),
            _ => None,
        }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        query.validate()?;
        Self::fetch(&self.pool, query).await
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String> {
        let id = generate_document_id();
        let write = WriteOp::Set {
            collection: collection.to_string(),
            id: id.clone(),
            data,
        };
        self.write_all("add", std::slice::from_ref(&write)).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()> {
        let write = WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        };
        self.write_all("set", std::slice::from_ref(&write)).await
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> Result<()> {
        let write = WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        };
        self.write_all("update", std::slice::from_ref(&write)).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let write = WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        self.write_all("delete", std::slice::from_ref(&write)).await
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        self.write_all("commit", &writes).await?;
        debug!(writes = writes.len(), "Batch committed");
        Ok(())
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription<Snapshot>> {
        query.validate()?;

        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;

        let pool = self.pool.clone();
        let label = format!("postgres:{}", query.collection);

        let stream = async_stream::stream! {
            yield Self::fetch(&pool, &query).await;
            loop {
                match listener.recv().await {
                    Ok(notification) if notification.payload() == query.collection => {
                        yield Self::fetch(&pool, &query).await;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        error!(collection = %query.collection, error = %e, "Change listener failed");
                        yield Err(UniExpError::Database(e));
                        break;
                    }
                }
            }
        };

        Ok(Subscription::new(label, stream))
    }
}
