//! Retry utilities for scraping-provider calls.
//!
//! Transient failures (rate limiting, network errors, provider 5xx, snapshots
//! that miss the poll deadline) are retried with exponential back-off and
//! jitter. Everything else is propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a single back-off sleep.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: network-level failure (connection reset, timeout, etc.).
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
/// - [`ScraperError::SnapshotTimeout`]: the job did not finish before the poll deadline.
///
/// Non-retriable errors (propagated immediately):
/// - [`ScraperError::UnexpectedStatus`] with a 4xx status (bad key, bad dataset id).
/// - [`ScraperError::Deserialize`]: the response does not parse; retrying won't fix it.
/// - [`ScraperError::SnapshotFailed`]: the provider reported the job as failed.
/// - [`ScraperError::Normalization`] and [`ScraperError::InvalidBaseUrl`].
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. }
        | ScraperError::Http(_)
        | ScraperError::SnapshotTimeout { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::Deserialize { .. }
        | ScraperError::SnapshotFailed { .. }
        | ScraperError::Normalization { .. }
        | ScraperError::InvalidBaseUrl { .. } => false,
    }
}

/// Wait before retry number `attempt` (1-based).
///
/// A rate-limited error waits at least the provider's `Retry-After`; the
/// result never exceeds [`MAX_DELAY_MS`].
fn retry_delay_ms(attempt: u32, backoff_base_ms: u64, err: &ScraperError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(20));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    let requested = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };

    jittered.max(requested).min(MAX_DELAY_MS)
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// With `max_retries = 2` the operation is attempted at most 3 times. The
/// wait before the n-th retry is `backoff_base_ms * 2^(n-1)` milliseconds,
/// capped at 60 s and scaled by a random factor in `[0.75, 1.25)`. A 429
/// waits at least as long as its `Retry-After` header asks.
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | base × 2⁰ ± 25 % |
/// | 2 (second retry) | base × 2¹ ± 25 % |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;

                let delay_ms = retry_delay_ms(attempt, backoff_base_ms, &err);

                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient scraper error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ScraperError {
        ScraperError::RateLimited {
            url: "https://provider.test/datasets/v3/trigger".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[test]
    fn rate_limited_delay_honors_retry_after() {
        let err = ScraperError::RateLimited {
            url: "u".to_owned(),
            retry_after_secs: 2,
        };
        assert_eq!(retry_delay_ms(1, 0, &err), 2_000);
        // Backoff larger than the hint wins.
        let delay = retry_delay_ms(1, 4_000, &err);
        assert!((3_000..=5_000).contains(&delay), "delay was {delay}");
    }

    #[test]
    fn retry_after_is_capped() {
        let err = ScraperError::RateLimited {
            url: "u".to_owned(),
            retry_after_secs: 3_600,
        };
        assert_eq!(retry_delay_ms(1, 0, &err), MAX_DELAY_MS);
    }

    #[test]
    fn backoff_doubles_with_jitter_for_other_errors() {
        let err = ScraperError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned(),
        };
        let first = retry_delay_ms(1, 1_000, &err);
        let second = retry_delay_ms(2, 1_000, &err);
        assert!((750..=1_250).contains(&first), "first was {first}");
        assert!((1_500..=2_500).contains(&second), "second was {second}");
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        assert!(is_retriable(&ScraperError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned()
        }));
        assert!(!is_retriable(&ScraperError::UnexpectedStatus {
            status: 401,
            url: "u".to_owned()
        }));
    }

    #[test]
    fn snapshot_timeout_is_retriable_snapshot_failure_is_not() {
        assert!(is_retriable(&ScraperError::SnapshotTimeout {
            snapshot_id: "s".to_owned(),
            waited_secs: 60
        }));
        assert!(!is_retriable(&ScraperError::SnapshotFailed {
            snapshot_id: "s".to_owned(),
            reason: "dataset error".to_owned()
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(rate_limited())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                let e = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
                Err::<u32, ScraperError>(ScraperError::Deserialize {
                    context: "test".to_owned(),
                    source: e,
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn zero_retries_makes_a_single_attempt() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(0, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(rate_limited())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }
}
