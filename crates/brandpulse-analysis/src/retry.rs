//! Retry policy for model calls.
//!
//! Network failures, rate limiting, provider 5xx, and model output that does
//! not fit the response schema are retried with exponential back-off and
//! jitter. A model that answered with prose instead of JSON often gets it
//! right on the next sample.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalysisError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &AnalysisError) -> bool {
    match err {
        AnalysisError::Http(_)
        | AnalysisError::RateLimited { .. }
        | AnalysisError::EmptyResponse
        | AnalysisError::Schema(_) => true,
        AnalysisError::ApiStatus { status, .. } => *status >= 500,
        AnalysisError::Deserialize { .. }
        | AnalysisError::InvalidBaseUrl { .. }
        | AnalysisError::AllBatchesFailed { .. } => false,
    }
}

/// Jittered exponential backoff, raised to the provider's `Retry-After` on a
/// 429 and capped at 60 s.
fn retry_delay_ms(attempt: u32, backoff_base_ms: u64, err: &AnalysisError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(20));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    let requested = match err {
        AnalysisError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    jittered.max(requested).min(MAX_DELAY_MS)
}

/// Executes `operation`, retrying transient failures up to `max_retries`
/// additional times. The n-th retry waits `backoff_base_ms * 2^(n-1)` ms,
/// capped at 60 s, scaled by a random factor in `[0.75, 1.25)`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
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
                    "model call failed, retrying after backoff"
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

    #[test]
    fn schema_violations_are_retriable() {
        assert!(is_retriable(&AnalysisError::Schema("missing summary".into())));
        assert!(is_retriable(&AnalysisError::EmptyResponse));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&AnalysisError::ApiStatus {
            status: 401,
            body: "invalid api key".into()
        }));
        assert!(is_retriable(&AnalysisError::ApiStatus {
            status: 502,
            body: String::new()
        }));
    }

    #[test]
    fn rate_limit_waits_for_retry_after() {
        let err = AnalysisError::RateLimited {
            retry_after_secs: 3,
        };
        assert_eq!(retry_delay_ms(1, 0, &err), 3_000);
        assert_eq!(
            retry_delay_ms(
                1,
                0,
                &AnalysisError::RateLimited {
                    retry_after_secs: 900
                }
            ),
            MAX_DELAY_MS
        );
        assert_eq!(retry_delay_ms(1, 0, &AnalysisError::EmptyResponse), 0);
    }

    #[tokio::test]
    async fn retries_schema_error_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AnalysisError::Schema("not json".into()))
                } else {
                    Ok::<_, AnalysisError>("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AnalysisError::EmptyResponse)
            }
        })
        .await;
        assert!(matches!(result, Err(AnalysisError::EmptyResponse)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
