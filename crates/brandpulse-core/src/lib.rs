//! Domain model, configuration, aggregation, and report assembly for
//! brandpulse.
//!
//! Everything here is synchronous and free of network access. Collection and
//! analysis live in `brandpulse-scraper` and `brandpulse-analysis`; this crate
//! defines the contracts they exchange.

pub mod aggregate;
pub mod analysis;
pub mod app_config;
pub mod collection;
pub mod config;
pub mod error;
pub mod mention;
pub mod platform;
pub mod report;
pub mod request;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregate::{aggregate, AggregatedReport};
pub use analysis::{
    AnalysisDegraded, AnalysisOutput, BatchOutcome, BatchStatus, MentionNote, Sentiment,
    EMPTY_SUMMARY,
};
pub use app_config::{AppConfig, DatasetIds, Environment, LlmProvider};
pub use collection::{CollectionResult, CollectionStatus};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use mention::{Engagement, Mention, MentionId};
pub use platform::Platform;
pub use report::{assemble, FinalReport};
pub use request::{MonitorRequest, ValidatedRequest, DEFAULT_MENTION_LIMIT, MAX_MENTION_LIMIT};
