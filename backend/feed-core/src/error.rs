/// Error types for the feed providers
///
/// Every provider operation either succeeds completely or returns one of
/// these. Only `StoreUnavailable` is worth retrying from the caller's side.
use feed_store::StoreError;
use thiserror::Error;

/// Result type for provider operations
pub type FeedResult<T> = std::result::Result<T, FeedError>;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Malformed input, e.g. empty text
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No user session is active
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Backing store failed transiently
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored data could not be interpreted
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether a caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                FeedError::NotFound(format!("{}/{}", collection, id))
            }
            StoreError::Unavailable(msg) => FeedError::StoreUnavailable(msg),
            // Conflicts that survive the retry loop are reported as transient
            StoreError::Conflict(msg) => FeedError::StoreUnavailable(msg),
            StoreError::InvalidData(msg) => FeedError::Internal(msg),
            StoreError::Serialization(e) => FeedError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: FeedError = StoreError::not_found("posts", "p1").into();
        assert!(matches!(err, FeedError::NotFound(ref m) if m == "posts/p1"));

        let err: FeedError = StoreError::Unavailable("timeout".into()).into();
        assert!(err.is_retryable());

        let err: FeedError = StoreError::Conflict("lost race".into()).into();
        assert!(err.is_retryable());

        let err: FeedError = StoreError::InvalidData("garbage".into()).into();
        assert!(matches!(err, FeedError::Internal(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(FeedError::NotAuthenticated.to_string(), "Not authenticated");
        assert_eq!(
            FeedError::validation("text must not be empty").to_string(),
            "Validation error: text must not be empty"
        );
        assert!(!FeedError::NotAuthenticated.is_retryable());
    }
}
