//! Quest and quest progress repositories

use std::sync::Arc;
use crate::database::document::{collections, encode, Query};
use crate::database::store::DocumentStore;
use crate::models::quest::{QuestCollection, QuestListItem, QuestProgress, QuestProgressListItem, QuestType};
use crate::utils::errors::Result;
use super::decode_all;

#[derive(Debug, Clone)]
pub struct QuestRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuestRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the quest wrapper document of an event
    pub async fn create_collection(&self, event_id: &str) -> Result<String> {
        let wrapper = QuestCollection {
            id: String::new(),
            event_id: event_id.to_string(),
        };
        self.store.add(collections::QUEST, encode(&wrapper)?).await
    }

    /// Find the quest wrapper document of an event
    pub async fn find_collection(&self, event_id: &str) -> Result<Option<QuestCollection>> {
        let query = Query::collection(collections::QUEST).where_eq("eventID", event_id);
        let docs = self.store.query(&query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Append a quest to the wrapper's `questList`
    pub async fn add_item(&self, collection_id: &str, item: &QuestListItem) -> Result<String> {
        self.store
            .add(&collections::quest_list(collection_id), encode(item)?)
            .await
    }

    /// Every quest of a wrapper, in creation order
    pub async fn list_items(&self, collection_id: &str) -> Result<Vec<QuestListItem>> {
        let query = Query::collection(collections::quest_list(collection_id));
        let docs = self.store.query(&query).await?;
        decode_all(&docs)
    }

    /// First quest of a given type
    pub async fn find_by_type(&self, collection_id: &str, quest_type: QuestType) -> Result<Option<QuestListItem>> {
        let query = Query::collection(collections::quest_list(collection_id))
            .where_eq("questType", quest_type.as_str());
        let docs = self.store.query(&query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestProgressRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuestProgressRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a student's progress container for an event
    pub async fn create_container(&self, event_id: &str, student_id: &str) -> Result<String> {
        let container = QuestProgress {
            id: String::new(),
            event_id: event_id.to_string(),
            student_id: student_id.to_string(),
        };
        self.store.add(collections::QUEST_PROGRESS, encode(&container)?).await
    }

    /// Every progress container of an event
    pub async fn list_containers(&self, event_id: &str) -> Result<Vec<QuestProgress>> {
        let query = Query::collection(collections::QUEST_PROGRESS).where_eq("eventID", event_id);
        let docs = self.store.query(&query).await?;
        decode_all(&docs)
    }

    /// A student's progress container for an event
    pub async fn find_container(&self, event_id: &str, student_id: &str) -> Result<Option<QuestProgress>> {
        let query = Query::collection(collections::QUEST_PROGRESS)
            .where_eq("eventID", event_id)
            .where_eq("studentID", student_id);
        let docs = self.store.query(&query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Append a progress entry to a container
    pub async fn add_item(&self, container_id: &str, item: &QuestProgressListItem) -> Result<String> {
        self.store
            .add(&collections::quest_progress_list(container_id), encode(item)?)
            .await
    }

    /// Every progress entry of a container
    pub async fn list_items(&self, container_id: &str) -> Result<Vec<QuestProgressListItem>> {
        let query = Query::collection(collections::quest_progress_list(container_id));
        let docs = self.store.query(&query).await?;
        decode_all(&docs)
    }

    /// The container's entry for one quest
    pub async fn find_item(&self, container_id: &str, quest_id: &str) -> Result<Option<QuestProgressListItem>> {
        let query = Query::collection(collections::quest_progress_list(container_id))
            .where_eq("questID", quest_id);
        let docs = self.store.query(&query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }
}
