use crate::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Language-model backend serving an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    Ollama,
}

impl LlmProvider {
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::Ollama => "http://localhost:11434/v1",
        }
    }

    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Groq => "llama3-70b-8192",
            LlmProvider::Ollama => "deepseek-r1",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Provider dataset id for each platform's scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetIds {
    pub linkedin: String,
    pub instagram: String,
    pub x: String,
    pub youtube: String,
}

impl DatasetIds {
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::LinkedIn => &self.linkedin,
            Platform::Instagram => &self.instagram,
            Platform::X => &self.x,
            Platform::YouTube => &self.youtube,
        }
    }
}

impl Default for DatasetIds {
    fn default() -> Self {
        Self {
            linkedin: "gd_lyy3tktm25m4avu764".to_string(),
            instagram: "gd_lk5ns7kz21pck8jpis".to_string(),
            x: "gd_lwxkxvnf1cynvib9co".to_string(),
            youtube: "gd_lk56epmy2i5g7lzu0k".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub scraper_api_key: String,
    pub scraper_base_url: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub scraper_poll_interval_ms: u64,
    pub scraper_snapshot_timeout_secs: u64,
    pub dataset_ids: DatasetIds,
    pub default_mention_limit: u32,
    pub max_concurrent_requests: usize,
    pub llm_provider: LlmProvider,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_request_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_base_ms: u64,
    pub analysis_max_batch_tokens: usize,
    pub analysis_concurrency: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("scraper_api_key", &"[redacted]")
            .field("scraper_base_url", &self.scraper_base_url)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field("scraper_poll_interval_ms", &self.scraper_poll_interval_ms)
            .field(
                "scraper_snapshot_timeout_secs",
                &self.scraper_snapshot_timeout_secs,
            )
            .field("dataset_ids", &self.dataset_ids)
            .field("default_mention_limit", &self.default_mention_limit)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("llm_provider", &self.llm_provider)
            .field("llm_base_url", &self.llm_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_base_ms", &self.llm_retry_backoff_base_ms)
            .field("analysis_max_batch_tokens", &self.analysis_max_batch_tokens)
            .field("analysis_concurrency", &self.analysis_concurrency)
            .finish()
    }
}
