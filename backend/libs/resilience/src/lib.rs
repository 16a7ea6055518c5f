/// Resilience patterns for store access
///
/// - **Retry**: Exponential backoff with jitter for transient failures
/// - **Selective retry**: Only errors accepted by a predicate are retried
///   (e.g. optimistic write conflicts), everything else fails fast
///
/// # Example: retry a read-modify-write on conflict
///
/// ```rust,no_run
/// use resilience::{with_retry_if, RetryConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_retry_if(
///         RetryConfig::default(),
///         |err: &String| err.contains("conflict"),
///         || async { Ok::<_, String>(()) },
///     )
///     .await;
///     assert!(result.is_ok());
/// }
/// ```
pub mod retry;

pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
