use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("analysis references mention {mention_id} which is not in the aggregated mentions")]
    InvalidAnalysisReference { mention_id: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
