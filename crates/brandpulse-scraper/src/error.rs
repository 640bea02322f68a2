use brandpulse_core::Platform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by scraping provider at {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("snapshot {snapshot_id} failed on the provider: {reason}")]
    SnapshotFailed { snapshot_id: String, reason: String },

    #[error("snapshot {snapshot_id} not ready after {waited_secs}s")]
    SnapshotTimeout { snapshot_id: String, waited_secs: u64 },

    #[error("normalization error for {platform} item: {reason}")]
    Normalization { platform: Platform, reason: String },

    #[error("invalid scraper base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
