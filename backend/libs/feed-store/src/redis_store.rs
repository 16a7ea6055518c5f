//! Redis-backed document store
//!
//! Layout per collection (see [`StoreKey`]):
//! - `doc:{id}` hash, one JSON-encoded value per field plus `__seq`
//! - `order` sorted set scored by insertion sequence
//! - `seq` insertion counter
//! - `idx:{field}:{token}` sorted sets for fields declared with
//!   [`RedisStore::with_index`]
//!
//! Counter adjustments run as a Lua script so the existence check, the
//! increment and the read-back happen atomically on the server.

use crate::{Document, DocumentStore, Fields, StoreError, StoreKey, StoreResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Hash field holding the insertion sequence
const SEQ_FIELD: &str = "__seq";

const ADJUST_COUNTER_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
redis.call('HINCRBY', KEYS[1], ARGV[1], ARGV[2])
return redis.call('HGETALL', KEYS[1])
"#;

/// Default per-command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct RedisStore {
    redis: ConnectionManager,
    timeout: Duration,
    /// collection -> indexed fields
    indexes: HashMap<String, HashSet<String>>,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            timeout: DEFAULT_TIMEOUT,
            indexes: HashMap::new(),
        }
    }

    /// Open a connection manager for `redis_url`
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {}", e)))?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(manager))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maintain an equality index on `field` so `list_where_equals` is served
    /// from a sorted set instead of a scan
    pub fn with_index(mut self, collection: &str, field: &str) -> Self {
        self.indexes
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_string());
        self
    }

    fn indexed_fields(&self, collection: &str) -> impl Iterator<Item = &String> {
        self.indexes.get(collection).into_iter().flatten()
    }

    fn is_indexed(&self, collection: &str, field: &str) -> bool {
        self.indexes
            .get(collection)
            .map(|fields| fields.contains(field))
            .unwrap_or(false)
    }

    async fn bounded<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Redis command timed out");
                Err(StoreError::Unavailable(format!(
                    "redis command exceeded {:?}",
                    self.timeout
                )))
            }
        }
    }

    /// Index entries (key) a document contributes
    fn index_keys(&self, collection: &str, fields: &Fields) -> Vec<String> {
        self.indexed_fields(collection)
            .filter_map(|field| {
                fields
                    .get(field)
                    .map(|value| StoreKey::index(collection, field, &index_token(value)))
            })
            .collect()
    }

    async fn load_hash(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let key = StoreKey::doc(collection, id);
        let mut conn = self.redis.clone();
        let raw: HashMap<String, String> = self.bounded(conn.hgetall(&key)).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        decode_hash(id, raw).map(Some)
    }

    async fn load_many(&self, collection: &str, ids: Vec<String>) -> StoreResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(StoreKey::doc(collection, id));
        }
        let mut conn = self.redis.clone();
        let hashes: Vec<HashMap<String, String>> =
            self.bounded(pipe.query_async(&mut conn)).await?;

        let mut docs = Vec::with_capacity(ids.len());
        for (id, raw) in ids.into_iter().zip(hashes) {
            // Deleted between the index read and the fetch
            if raw.is_empty() {
                continue;
            }
            docs.push(decode_hash(&id, raw)?);
        }
        Ok(docs)
    }

    async fn write_new(&self, collection: &str, id: String, fields: Fields) -> StoreResult<Document> {
        let mut conn = self.redis.clone();
        let seq: u64 = self
            .bounded(conn.incr(StoreKey::seq(collection), 1u64))
            .await?;

        let doc = Document { id, seq, fields };
        let encoded = encode_hash(&doc)?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(StoreKey::doc(collection, &doc.id), encoded.as_slice())
            .ignore()
            .zadd(StoreKey::order(collection), &doc.id, seq)
            .ignore();
        for key in self.index_keys(collection, &doc.fields) {
            pipe.zadd(key, &doc.id, seq).ignore();
        }
        self.bounded(pipe.query_async::<_, ()>(&mut conn)).await?;

        Ok(doc)
    }
}

#[async_trait::async_trait]
impl DocumentStore for RedisStore {
    async fn create_with_generated_id(
        &self,
        collection: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let doc = self
            .write_new(collection, Uuid::new_v4().to_string(), fields)
            .await?;
        debug!(collection, id = %doc.id, seq = doc.seq, "Document created");
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let Some(existing) = self.load_hash(collection, id).await? else {
            let doc = self.write_new(collection, id.to_string(), fields).await?;
            debug!(collection, id, seq = doc.seq, "Document put (new)");
            return Ok(doc);
        };

        let doc = Document {
            id: id.to_string(),
            seq: existing.seq,
            fields,
        };
        let encoded = encode_hash(&doc)?;
        let doc_key = StoreKey::doc(collection, id);
        let mut pipe = redis::pipe();
        pipe.atomic().del(&doc_key).ignore();
        for key in self.index_keys(collection, &existing.fields) {
            pipe.zrem(key, id).ignore();
        }
        pipe.hset_multiple(&doc_key, encoded.as_slice()).ignore();
        for key in self.index_keys(collection, &doc.fields) {
            pipe.zadd(key, id, doc.seq).ignore();
        }
        let mut conn = self.redis.clone();
        self.bounded(pipe.query_async::<_, ()>(&mut conn)).await?;

        debug!(collection, id, seq = doc.seq, "Document put (replaced)");
        Ok(doc)
    }

    async fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        self.load_hash(collection, id)
            .await?
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list_ordered_by_insertion(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let start: isize = match limit {
            Some(0) => return Ok(Vec::new()),
            Some(limit) => order_range_start(limit),
            None => 0,
        };
        let mut conn = self.redis.clone();
        let ids: Vec<String> = self
            .bounded(conn.zrange(StoreKey::order(collection), start, -1))
            .await?;
        self.load_many(collection, ids).await
    }

    async fn list_where_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        if self.is_indexed(collection, field) {
            let key = StoreKey::index(collection, field, &index_token(value));
            let mut conn = self.redis.clone();
            let ids: Vec<String> = self.bounded(conn.zrange(key, 0, -1)).await?;
            return self.load_many(collection, ids).await;
        }

        debug!(collection, field, "Unindexed equality query, scanning collection");
        let docs = self.list_ordered_by_insertion(collection, None).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let Some(existing) = self.load_hash(collection, id).await? else {
            return Ok(false);
        };

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(StoreKey::doc(collection, id))
            .zrem(StoreKey::order(collection), id)
            .ignore();
        for key in self.index_keys(collection, &existing.fields) {
            pipe.zrem(key, id).ignore();
        }
        let mut conn = self.redis.clone();
        let (removed,): (u32,) = self.bounded(pipe.query_async(&mut conn)).await?;

        debug!(collection, id, "Document deleted");
        Ok(removed > 0)
    }

    async fn atomic_adjust_counter(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<Document> {
        let script = Script::new(ADJUST_COUNTER_LUA);
        let mut invocation = script.key(StoreKey::doc(collection, id));
        invocation.arg(field).arg(delta);

        let mut conn = self.redis.clone();
        let raw: Option<HashMap<String, String>> =
            self.bounded(invocation.invoke_async(&mut conn)).await?;
        let raw = raw.ok_or_else(|| StoreError::not_found(collection, id))?;

        debug!(collection, id, field, delta, "Counter adjusted");
        decode_hash(id, raw)
    }
}

/// ZRANGE start index selecting the last `limit` members. Limits too large
/// for a negative index select the whole set.
fn order_range_start(limit: usize) -> isize {
    isize::try_from(limit).map(|l| -l).unwrap_or(0)
}

/// Token identifying a field value inside an index key
fn index_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn encode_hash(doc: &Document) -> StoreResult<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(doc.fields.len() + 1);
    for (name, value) in &doc.fields {
        if name == SEQ_FIELD {
            return Err(StoreError::InvalidData(format!(
                "field name {} is reserved",
                SEQ_FIELD
            )));
        }
        pairs.push((name.clone(), serde_json::to_string(value)?));
    }
    pairs.push((SEQ_FIELD.to_string(), doc.seq.to_string()));
    Ok(pairs)
}

fn decode_hash(id: &str, mut raw: HashMap<String, String>) -> StoreResult<Document> {
    let seq = raw
        .remove(SEQ_FIELD)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| StoreError::InvalidData(format!("document {} has no sequence", id)))?;

    let mut fields = Fields::new();
    for (name, encoded) in raw {
        let value: Value = serde_json::from_str(&encoded).map_err(|e| {
            StoreError::InvalidData(format!("document {} field {}: {}", id, name, e))
        })?;
        fields.insert(name, value);
    }

    Ok(Document {
        id: id.to_string(),
        seq,
        fields,
    })
}
