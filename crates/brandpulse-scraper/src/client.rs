use std::sync::Arc;
use std::time::Duration;

use brandpulse_core::{AppConfig, DatasetIds, Platform};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{ProgressResponse, SnapshotState, TriggerResponse};

/// Connection settings for the scraping provider.
#[derive(Clone)]
pub struct ScraperSettings {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Delay between snapshot progress checks.
    pub poll_interval_ms: u64,
    /// How long to wait for a snapshot to become ready before giving up on the attempt.
    pub snapshot_timeout_secs: u64,
    pub dataset_ids: DatasetIds,
}

impl ScraperSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.scraper_api_key.clone(),
            base_url: config.scraper_base_url.clone(),
            request_timeout_secs: config.scraper_request_timeout_secs,
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_retry_backoff_base_ms,
            poll_interval_ms: config.scraper_poll_interval_ms,
            snapshot_timeout_secs: config.scraper_snapshot_timeout_secs,
            dataset_ids: config.dataset_ids.clone(),
        }
    }
}

impl std::fmt::Debug for ScraperSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperSettings")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("snapshot_timeout_secs", &self.snapshot_timeout_secs)
            .field("dataset_ids", &self.dataset_ids)
            .finish()
    }
}

/// HTTP client for the scraping provider's dataset API.
///
/// One collection is a three-step job: trigger a keyword discovery on the
/// platform's dataset, poll the snapshot until it is ready, then download the
/// snapshot as a JSON array. [`ScraperClient::fetch_items`] runs the whole
/// sequence and retries it as one unit on transient errors, so a retry after a
/// snapshot timeout starts a fresh job.
///
/// When a limiter is attached every request holds one permit while it is in
/// flight; the poll sleep does not.
pub struct ScraperClient {
    client: Client,
    base_url: String,
    api_key: String,
    dataset_ids: DatasetIds,
    max_retries: u32,
    backoff_base_ms: u64,
    poll_interval: Duration,
    snapshot_timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl ScraperClient {
    /// Creates a `ScraperClient` with the configured timeout, credentials, and retry policy.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidBaseUrl`] if `base_url` is not an absolute
    ///   `http`/`https` URL.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let parsed = Url::parse(&settings.base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidBaseUrl {
                base_url: settings.base_url.clone(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("brandpulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            api_key: settings.api_key.clone(),
            dataset_ids: settings.dataset_ids.clone(),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            snapshot_timeout: Duration::from_secs(settings.snapshot_timeout_secs),
            limiter: None,
        })
    }

    /// Shares an outbound-request limiter with other clients.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Runs one discovery job for `brand` on `platform` and returns the raw
    /// snapshot items in provider order.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`], [`ScraperError::Http`],
    ///   [`ScraperError::SnapshotTimeout`], or a 5xx
    ///   [`ScraperError::UnexpectedStatus`] once all retries are exhausted.
    /// - [`ScraperError::UnexpectedStatus`] for 4xx responses (not retried).
    /// - [`ScraperError::SnapshotFailed`] if the provider reports the job failed.
    /// - [`ScraperError::Deserialize`] if a response does not have the expected shape.
    pub async fn fetch_items(
        &self,
        brand: &str,
        platform: Platform,
        limit: u32,
    ) -> Result<Vec<Value>, ScraperError> {
        let dataset_id = self.dataset_ids.for_platform(platform);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let snapshot_id = self.trigger(dataset_id, brand, limit).await?;
            tracing::debug!(%platform, %snapshot_id, "snapshot triggered");
            self.wait_until_ready(&snapshot_id).await?;
            self.download(&snapshot_id).await
        })
        .await
    }

    async fn trigger(
        &self,
        dataset_id: &str,
        brand: &str,
        limit: u32,
    ) -> Result<String, ScraperError> {
        let url = format!("{}/datasets/v3/trigger", self.base_url);
        let limit = limit.to_string();
        let request = self
            .client
            .post(&url)
            .query(&[
                ("dataset_id", dataset_id),
                ("type", "discover_new"),
                ("discover_by", "keyword"),
                ("limit_per_input", limit.as_str()),
                ("include_errors", "true"),
            ])
            .json(&[serde_json::json!({ "keyword": brand })]);

        let response: TriggerResponse = self
            .send_json(request, &url, &format!("trigger for dataset {dataset_id}"))
            .await?;
        Ok(response.snapshot_id)
    }

    async fn wait_until_ready(&self, snapshot_id: &str) -> Result<(), ScraperError> {
        let url = format!("{}/datasets/v3/progress/{snapshot_id}", self.base_url);
        let started = tokio::time::Instant::now();

        loop {
            let progress: ProgressResponse = self
                .send_json(
                    self.client.get(&url),
                    &url,
                    &format!("progress of snapshot {snapshot_id}"),
                )
                .await?;

            match progress.state() {
                SnapshotState::Ready => return Ok(()),
                SnapshotState::Failed => {
                    return Err(ScraperError::SnapshotFailed {
                        snapshot_id: snapshot_id.to_owned(),
                        reason: progress
                            .error
                            .unwrap_or_else(|| "no reason given".to_owned()),
                    });
                }
                SnapshotState::Running => {}
            }

            if started.elapsed() >= self.snapshot_timeout {
                return Err(ScraperError::SnapshotTimeout {
                    snapshot_id: snapshot_id.to_owned(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tracing::debug!(snapshot_id, status = %progress.status, "snapshot not ready");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn download(&self, snapshot_id: &str) -> Result<Vec<Value>, ScraperError> {
        let url = format!("{}/datasets/v3/snapshot/{snapshot_id}", self.base_url);
        let request = self.client.get(&url).query(&[("format", "json")]);
        self.send_json(request, &url, &format!("snapshot {snapshot_id}"))
            .await
    }

    /// Sends an authenticated request and parses a JSON body, mapping 429 and
    /// other non-2xx statuses to typed errors.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
        context: &str,
    ) -> Result<T, ScraperError> {
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> ScraperSettings {
        ScraperSettings {
            api_key: "secret-key".to_owned(),
            base_url: base_url.to_owned(),
            request_timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
            poll_interval_ms: 0,
            snapshot_timeout_secs: 1,
            dataset_ids: DatasetIds::default(),
        }
    }

    #[test]
    fn new_rejects_relative_base_url() {
        let result = ScraperClient::new(&settings("api.brightdata.com"));
        assert!(matches!(result, Err(ScraperError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn new_rejects_non_http_scheme() {
        let result = ScraperClient::new(&settings("ftp://api.brightdata.com"));
        assert!(matches!(
            result,
            Err(ScraperError::InvalidBaseUrl { ref reason, .. }) if reason.contains("ftp")
        ));
    }

    #[test]
    fn new_strips_trailing_slash() {
        let client = ScraperClient::new(&settings("https://api.brightdata.com/")).unwrap();
        assert_eq!(client.base_url, "https://api.brightdata.com");
    }

    #[test]
    fn settings_debug_redacts_api_key() {
        let debug = format!("{:?}", settings("https://api.brightdata.com"));
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[redacted]"));
    }
}
