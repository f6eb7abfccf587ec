//! Deadlines and bounded retry for store and corpus calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::feed::core::config::RetryPolicy;
use crate::feed::core::errors::{FeedError, FeedResult};

/// Await `fut`, failing with `FeedError::Timeout` after `millis`.
///
/// # Errors
/// Returns the future's own error, or a timeout.
pub async fn with_timeout<T, Fut>(operation: &'static str, millis: u64, fut: Fut) -> FeedResult<T>
where
    Fut: Future<Output = FeedResult<T>>,
{
    tokio::time::timeout(Duration::from_millis(millis), fut)
        .await
        .map_err(|_| FeedError::Timeout { operation, millis })?
}

/// Exponential backoff for `attempt` (0-based), capped, with up to 50% jitter.
#[must_use]
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> u64 {
    let delay = policy
        .backoff_base_ms
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(policy.backoff_max_ms);
    let jitter = if delay > 1 {
        rand::thread_rng().gen_range(0..=delay / 2)
    } else {
        0
    };
    delay.saturating_add(jitter).min(policy.backoff_max_ms)
}

/// Run `call` until it succeeds, fails with a non-transient error, or
/// `policy.max_retries` retries are used up.
///
/// # Errors
/// Returns the first non-transient error or the last transient one.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> FeedResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FeedResult<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = backoff_delay(policy, attempt);
                info!(operation, attempt, delay_ms = delay, error = %err, "transient failure, backing off");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(operation, attempts = attempt + 1, error = %err, "retries exhausted");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            backoff_base_ms: 100,
            backoff_max_ms: 1_000,
        };
        assert!(backoff_delay(&policy, 0) >= 100);
        assert!(backoff_delay(&policy, 0) <= 150);
        assert_eq!(backoff_delay(&policy, 8), 1_000);
        assert_eq!(backoff_delay(&policy, u32::MAX), 1_000);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(&fast_policy(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FeedError::TokioSqlite(tokio_rusqlite::Error::ConnectionClosed))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_validation() {
        let calls = AtomicU32::new(0);
        let result: FeedResult<()> = retry_transient(&fast_policy(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FeedError::Validation("bad".to_string()))
        })
        .await;
        assert!(matches!(result, Err(FeedError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: FeedResult<()> = retry_transient(&fast_policy(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FeedError::Timeout {
                operation: "test",
                millis: 1,
            })
        })
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: FeedResult<()> = with_timeout("slow", 10, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(FeedError::Timeout { operation: "slow", millis: 10 })
        ));
    }
}
