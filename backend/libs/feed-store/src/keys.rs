//! Redis key schema
//!
//! All keys produced by the Redis adapter go through these builders.
//! Key format: v{VERSION}:{collection}:{kind}[:identifier...]

/// Key schema version - increment when changing key formats
pub const STORE_VERSION: u32 = 1;

/// Key builder
pub struct StoreKey;

impl StoreKey {
    /// Document hash
    /// Format: v1:{collection}:doc:{id}
    pub fn doc(collection: &str, id: &str) -> String {
        format!("v{}:{}:doc:{}", STORE_VERSION, collection, id)
    }

    /// Insertion-order index (sorted set scored by sequence)
    /// Format: v1:{collection}:order
    pub fn order(collection: &str) -> String {
        format!("v{}:{}:order", STORE_VERSION, collection)
    }

    /// Per-collection insertion sequence
    /// Format: v1:{collection}:seq
    pub fn seq(collection: &str) -> String {
        format!("v{}:{}:seq", STORE_VERSION, collection)
    }

    /// Equality index for one field value
    /// Format: v1:{collection}:idx:{field}:{token}
    pub fn index(collection: &str, field: &str, token: &str) -> String {
        format!("v{}:{}:idx:{}:{}", STORE_VERSION, collection, field, token)
    }
}
