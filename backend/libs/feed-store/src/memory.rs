//! In-process document store
//!
//! Every operation takes the collection lock once, so each call is atomic
//! with respect to every other call on the same store.

use crate::{Document, DocumentStore, Fields, StoreError, StoreResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Collection {
    next_seq: u64,
    docs: HashMap<String, Document>,
    /// seq -> id
    order: BTreeMap<u64, String>,
}

impl Collection {
    fn insert_new(&mut self, id: String, fields: Fields) -> Document {
        self.next_seq += 1;
        let doc = Document {
            id: id.clone(),
            seq: self.next_seq,
            fields,
        };
        self.order.insert(doc.seq, id.clone());
        self.docs.insert(id, doc.clone());
        doc
    }

    fn in_order(&self) -> impl DoubleEndedIterator<Item = &Document> {
        self.order.values().filter_map(|id| self.docs.get(id))
    }
}

/// Document store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.docs.len())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn create_with_generated_id(
        &self,
        collection: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        let doc = coll.insert_new(Uuid::new_v4().to_string(), fields);

        debug!(collection, id = %doc.id, seq = doc.seq, "Document created");
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();

        let doc = match coll.docs.get_mut(id) {
            Some(existing) => {
                existing.fields = fields;
                existing.clone()
            }
            None => coll.insert_new(id.to_string(), fields),
        };

        debug!(collection, id, seq = doc.seq, "Document put");
        Ok(doc)
    }

    async fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list_ordered_by_insertion(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut docs: Vec<Document> = match limit {
            Some(limit) => coll.in_order().rev().take(limit).cloned().collect(),
            None => coll.in_order().rev().cloned().collect(),
        };
        docs.reverse();
        Ok(docs)
    }

    async fn list_where_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(coll
            .in_order()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .cloned()
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match coll.docs.remove(id) {
            Some(doc) => {
                coll.order.remove(&doc.seq);
                debug!(collection, id, "Document deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn atomic_adjust_counter(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let current = match doc.fields.get(field) {
            None => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::InvalidData(format!("{}/{}.{} is not an integer", collection, id, field))
            })?,
        };
        let updated = current.checked_add(delta).ok_or_else(|| {
            StoreError::InvalidData(format!("{}/{}.{} would overflow", collection, id, field))
        })?;
        doc.fields.insert(field.to_string(), Value::from(updated));

        debug!(collection, id, field, delta, value = updated, "Counter adjusted");
        Ok(doc.clone())
    }
}
