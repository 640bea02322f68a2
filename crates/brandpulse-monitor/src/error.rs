use brandpulse_core::{AggregatedReport, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every analysis batch failed. The collected data is still returned.
    #[error("analysis unavailable: {reason}")]
    AnalysisUnavailable {
        reason: String,
        aggregated: Box<AggregatedReport>,
    },

    #[error("analysis references mention {mention_id} which is not in the aggregated mentions")]
    InvalidAnalysisReference { mention_id: String },

    #[error("failed to build {client} client: {reason}")]
    ClientSetup {
        client: &'static str,
        reason: String,
    },
}

impl From<CoreError> for MonitorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAnalysisReference { mention_id } => {
                MonitorError::InvalidAnalysisReference { mention_id }
            }
            CoreError::InvalidInput(reason) => MonitorError::InvalidInput(reason),
            CoreError::UnknownPlatform(name) => {
                MonitorError::InvalidInput(format!("unknown platform: {name}"))
            }
        }
    }
}

impl MonitorError {
    /// The aggregated collection data carried by an analysis failure.
    #[must_use]
    pub fn aggregated(&self) -> Option<&AggregatedReport> {
        match self {
            MonitorError::AnalysisUnavailable { aggregated, .. } => Some(aggregated),
            _ => None,
        }
    }
}
