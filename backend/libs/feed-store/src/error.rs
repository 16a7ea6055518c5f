//! Store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// An optimistic write lost a race and may be retried
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Backend unreachable, connection dropped or command timed out
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid document data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout()
            || err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
        {
            return StoreError::Unavailable(err.to_string());
        }

        match err.kind() {
            redis::ErrorKind::TypeError => StoreError::InvalidData(err.to_string()),
            redis::ErrorKind::ExecAbortError => StoreError::Conflict(err.to_string()),
            _ if err.to_string().contains("not an integer") => {
                StoreError::InvalidData(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
