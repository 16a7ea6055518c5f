//! Scripted store for fault-injection tests
//!
//! Wraps a `MemoryStore` and fails chosen operations on chosen collections a
//! given number of times before letting calls through. Every call is counted
//! so tests can assert how many attempts a provider made.

use async_trait::async_trait;
use feed_store::{Document, DocumentStore, Fields, MemoryStore, StoreError, StoreResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Put,
    Read,
    ListOrdered,
    ListWhere,
    Delete,
    Adjust,
}

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Conflict,
    Unavailable,
}

impl Fault {
    fn to_error(self, op: Op, collection: &str) -> StoreError {
        match self {
            Fault::Conflict => StoreError::Conflict(format!("{:?} on {} lost a race", op, collection)),
            Fault::Unavailable => StoreError::Unavailable(format!("{:?} on {} timed out", op, collection)),
        }
    }
}

#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    faults: Mutex<HashMap<(Op, String), (Fault, usize)>>,
    calls: Mutex<HashMap<(Op, String), usize>>,
    /// Collections whose next delete finds the document already removed
    raced_deletes: Mutex<HashSet<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `op` on `collection` with `fault`
    pub fn fail_next(&self, op: Op, collection: &str, fault: Fault, times: usize) {
        self.faults
            .lock()
            .unwrap()
            .insert((op, collection.to_string()), (fault, times));
    }

    /// Calls of `op` on `collection` so far, failed ones included
    pub fn calls(&self, op: Op, collection: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&(op, collection.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Make the next delete on `collection` lose a race: another deleter
    /// removes the document just before this call reaches it
    pub fn lose_next_delete_race(&self, collection: &str) {
        self.raced_deletes
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn check(&self, op: Op, collection: &str) -> StoreResult<()> {
        let key = (op, collection.to_string());
        *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

        let mut faults = self.faults.lock().unwrap();
        if let Some((fault, remaining)) = faults.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(fault.to_error(op, collection));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn create_with_generated_id(
        &self,
        collection: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        self.check(Op::Create, collection)?;
        self.inner.create_with_generated_id(collection, fields).await
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        self.check(Op::Put, collection)?;
        self.inner.put(collection, id, fields).await
    }

    async fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        self.check(Op::Read, collection)?;
        self.inner.read(collection, id).await
    }

    async fn list_ordered_by_insertion(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        self.check(Op::ListOrdered, collection)?;
        self.inner.list_ordered_by_insertion(collection, limit).await
    }

    async fn list_where_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        self.check(Op::ListWhere, collection)?;
        self.inner.list_where_equals(collection, field, value).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.check(Op::Delete, collection)?;
        let raced = self.raced_deletes.lock().unwrap().remove(collection);
        if raced {
            self.inner.delete(collection, id).await?;
        }
        self.inner.delete(collection, id).await
    }

    async fn atomic_adjust_counter(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<Document> {
        self.check(Op::Adjust, collection)?;
        self.inner
            .atomic_adjust_counter(collection, id, field, delta)
            .await
    }
}
