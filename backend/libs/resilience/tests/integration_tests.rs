/// Integration tests for resilience library
use resilience::{with_retry, with_retry_if, RetryConfig, RetryError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, PartialEq)]
enum WriteError {
    Conflict,
    Timeout,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn fast(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

#[tokio::test]
async fn test_conflicts_retried_until_success() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result = with_retry_if(fast(5), |e: &WriteError| *e == WriteError::Conflict, || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(WriteError::Conflict)
            } else {
                Ok("written")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "written");
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_other_errors_fail_fast() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result: Result<(), _> = with_retry_if(fast(5), |e: &WriteError| *e == WriteError::Conflict, || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(WriteError::Timeout)
        }
    })
    .await;

    assert!(matches!(result, Err(RetryError::NotRetryable(WriteError::Timeout))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exhaustion_reports_attempts_and_last_error() {
    let result: Result<(), _> =
        with_retry(fast(2), || async { Err(WriteError::Conflict) }).await;

    match result {
        Err(RetryError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last, WriteError::Conflict);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_backoff_is_capped() {
    let config = RetryConfig {
        max_retries: 4,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(10),
        backoff_multiplier: 10.0,
        jitter: false,
    };

    let start = Instant::now();
    let _: Result<(), _> = with_retry(config, || async { Err(WriteError::Conflict) }).await;

    // 5 + 10 + 10 + 10 ms
    assert!(start.elapsed() >= Duration::from_millis(35));
    assert!(start.elapsed() < Duration::from_secs(2));
}
