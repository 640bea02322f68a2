use std::str::FromStr;

use crate::app_config::{AppConfig, DatasetIds, Environment, LlmProvider};
use crate::request::{DEFAULT_MENTION_LIMIT, MAX_MENTION_LIMIT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("BRANDPULSE_ENV", "development"));
    let log_level = or_default("BRANDPULSE_LOG_LEVEL", "info");

    let scraper_api_key = require("BRANDPULSE_SCRAPER_API_KEY")?;
    let scraper_base_url = or_default("BRANDPULSE_SCRAPER_BASE_URL", "https://api.brightdata.com");
    let scraper_request_timeout_secs =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_max_retries = parse_num::<u32, _>(&lookup, "BRANDPULSE_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_SCRAPER_RETRY_BACKOFF_BASE_MS", "1000")?;
    let scraper_poll_interval_ms =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_SCRAPER_POLL_INTERVAL_MS", "10000")?;
    let scraper_snapshot_timeout_secs =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_SCRAPER_SNAPSHOT_TIMEOUT_SECS", "60")?;

    let defaults = DatasetIds::default();
    let dataset_ids = DatasetIds {
        linkedin: or_default("BRANDPULSE_DATASET_LINKEDIN", &defaults.linkedin),
        instagram: or_default("BRANDPULSE_DATASET_INSTAGRAM", &defaults.instagram),
        x: or_default("BRANDPULSE_DATASET_X", &defaults.x),
        youtube: or_default("BRANDPULSE_DATASET_YOUTUBE", &defaults.youtube),
    };

    let default_mention_limit = parse_num::<u32, _>(
        &lookup,
        "BRANDPULSE_DEFAULT_MENTION_LIMIT",
        &DEFAULT_MENTION_LIMIT.to_string(),
    )?;
    if default_mention_limit == 0 || default_mention_limit > MAX_MENTION_LIMIT {
        return Err(ConfigError::InvalidEnvVar {
            var: "BRANDPULSE_DEFAULT_MENTION_LIMIT".to_string(),
            reason: format!("must be between 1 and {MAX_MENTION_LIMIT}"),
        });
    }

    let max_concurrent_requests =
        parse_num::<usize, _>(&lookup, "BRANDPULSE_MAX_CONCURRENT_REQUESTS", "4")?.max(1);

    let llm_provider = parse_llm_provider(&or_default("BRANDPULSE_LLM_PROVIDER", "ollama"))?;
    let llm_base_url = or_default("BRANDPULSE_LLM_BASE_URL", llm_provider.default_base_url());
    let llm_api_key = match llm_provider {
        LlmProvider::Groq => Some(require("GROQ_API_KEY")?),
        LlmProvider::Ollama => lookup("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
    };
    let llm_model = or_default("BRANDPULSE_LLM_MODEL", llm_provider.default_model());
    let llm_temperature = parse_num::<f32, _>(&lookup, "BRANDPULSE_LLM_TEMPERATURE", "0.2")?;
    let llm_request_timeout_secs =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_LLM_REQUEST_TIMEOUT_SECS", "120")?;
    let llm_max_retries = parse_num::<u32, _>(&lookup, "BRANDPULSE_LLM_MAX_RETRIES", "2")?;
    let llm_retry_backoff_base_ms =
        parse_num::<u64, _>(&lookup, "BRANDPULSE_LLM_RETRY_BACKOFF_BASE_MS", "1000")?;

    let analysis_max_batch_tokens =
        parse_num::<usize, _>(&lookup, "BRANDPULSE_ANALYSIS_MAX_BATCH_TOKENS", "6000")?;
    if analysis_max_batch_tokens == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BRANDPULSE_ANALYSIS_MAX_BATCH_TOKENS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let analysis_concurrency =
        parse_num::<usize, _>(&lookup, "BRANDPULSE_ANALYSIS_CONCURRENCY", "2")?.max(1);

    Ok(AppConfig {
        env,
        log_level,
        scraper_api_key,
        scraper_base_url,
        scraper_request_timeout_secs,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        scraper_poll_interval_ms,
        scraper_snapshot_timeout_secs,
        dataset_ids,
        default_mention_limit,
        max_concurrent_requests,
        llm_provider,
        llm_base_url,
        llm_api_key,
        llm_model,
        llm_temperature,
        llm_request_timeout_secs,
        llm_max_retries,
        llm_retry_backoff_base_ms,
        analysis_max_batch_tokens,
        analysis_concurrency,
    })
}

/// Parse a numeric env var, falling back to `default` when unset.
fn parse_num<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_llm_provider(s: &str) -> Result<LlmProvider, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "groq" => Ok(LlmProvider::Groq),
        "ollama" => Ok(LlmProvider::Ollama),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDPULSE_LLM_PROVIDER".to_string(),
            reason: format!("expected 'groq' or 'ollama', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
