//! Bitter document store
//!
//! The persistence contract the feed providers are built on:
//! - Server-generated ids with a per-collection insertion sequence
//! - Insertion-ordered listing with a "most recent N" limit
//! - Equality queries on top-level fields
//! - Idempotent deletes (absent documents are not an error)
//! - Atomic integer counter adjustment
//!
//! Two adapters ship with the crate: [`MemoryStore`] for tests and
//! ephemeral runs, and [`RedisStore`] for a shared backing store.

mod error;
mod keys;

pub mod memory;
pub mod redis_store;

pub use error::{StoreError, StoreResult};
pub use keys::{StoreKey, STORE_VERSION};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Named attributes of a stored record
pub type Fields = serde_json::Map<String, Value>;

/// Shared handle to any store adapter
pub type SharedStore = Arc<dyn DocumentStore>;

/// Field name under which [`Document::decode`] exposes the document id
pub const ID_FIELD: &str = "id";

/// A stored record together with its identity and insertion position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Position in the collection's insertion order (1-based, never reused)
    pub seq: u64,
    pub fields: Fields,
}

impl Document {
    /// Decode the document into a typed entity. The id is injected as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut fields = self.fields.clone();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            StoreError::InvalidData(format!("document {} failed to decode: {}", self.id, e))
        })
    }

    /// Integer value of a field, if present
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }
}

/// Encode an entity into record fields. Any `id` attribute is dropped since
/// the store owns document identity.
pub fn encode_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove(ID_FIELD);
            Ok(fields)
        }
        other => Err(StoreError::InvalidData(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Persistence operations required by the feed providers
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record under a freshly generated id
    async fn create_with_generated_id(&self, collection: &str, fields: Fields)
        -> StoreResult<Document>;

    /// Insert or replace a record under a caller-supplied id.
    /// A replaced record keeps its insertion position.
    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document>;

    /// Read a record; `StoreError::NotFound` when absent
    async fn read(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// The most recent `limit` records (all when `None`), oldest first
    async fn list_ordered_by_insertion(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>>;

    /// All records whose top-level `field` equals `value`, oldest first
    async fn list_where_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    /// Remove a record. Returns whether it existed; absence is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Atomically add `delta` to an integer field and return the updated record.
    /// A missing field counts as zero.
    async fn atomic_adjust_counter(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<Document>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: String,
        body: String,
        score: i64,
    }

    #[test]
    fn test_encode_drops_id() {
        let note = Note {
            id: "n1".to_string(),
            body: "hello".to_string(),
            score: 2,
        };
        let fields = encode_fields(&note).unwrap();
        assert!(!fields.contains_key(ID_FIELD));
        assert_eq!(fields.get("body"), Some(&json!("hello")));
    }

    #[test]
    fn test_encode_rejects_non_object() {
        let err = encode_fields(&42).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_decode_injects_id() {
        let mut fields = Fields::new();
        fields.insert("body".to_string(), json!("hello"));
        fields.insert("score".to_string(), json!(-3));
        let doc = Document {
            id: "n9".to_string(),
            seq: 4,
            fields,
        };

        let note: Note = doc.decode().unwrap();
        assert_eq!(note.id, "n9");
        assert_eq!(note.score, -3);
        assert_eq!(doc.get_i64("score"), Some(-3));
        assert_eq!(doc.get_i64("body"), None);
    }

    #[test]
    fn test_decode_missing_field_is_invalid_data() {
        let doc = Document {
            id: "n1".to_string(),
            seq: 1,
            fields: Fields::new(),
        };
        let err = doc.decode::<Note>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }
}
