use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by model provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("model API returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model output violates the response schema: {0}")]
    Schema(String),

    #[error("invalid model base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("analysis unavailable: all {batches} batch(es) failed; last error: {last_error}")]
    AllBatchesFailed { batches: usize, last_error: String },
}
