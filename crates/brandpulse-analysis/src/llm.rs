//! OpenAI-compatible chat-completions client.
//!
//! Both supported providers (Groq's hosted API and a local Ollama) expose
//! `POST {base}/chat/completions` with the same request shape. Requests ask
//! for `response_format: json_object`; replies are still sanitized because
//! some models wrap the object in a markdown fence or add prose around it.

use std::sync::Arc;
use std::time::Duration;

use brandpulse_core::{AppConfig, LlmProvider};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::AnalysisError;
use crate::retry::retry_with_backoff;

/// Connection and sampling settings for the model provider.
#[derive(Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl LlmSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            provider: config.llm_provider,
            base_url: config.llm_base_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            request_timeout_secs: config.llm_request_timeout_secs,
            max_retries: config.llm_max_retries,
            backoff_base_ms: config.llm_retry_backoff_base_ms,
        }
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_retries: u32,
    backoff_base_ms: u64,
    limiter: Option<Arc<Semaphore>>,
}

impl LlmClient {
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidBaseUrl`] if the base URL is not an absolute
    ///   `http`/`https` URL.
    /// - [`AnalysisError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &LlmSettings) -> Result<Self, AnalysisError> {
        let parsed = Url::parse(&settings.base_url).map_err(|e| AnalysisError::InvalidBaseUrl {
            base_url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AnalysisError::InvalidBaseUrl {
                base_url: settings.base_url.clone(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("brandpulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(
            provider = %settings.provider,
            model = %settings.model,
            "model client ready"
        );

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            limiter: None,
        })
    }

    /// Shares an outbound-request limiter with other clients.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Sends `system` + `user` and hands the sanitized reply to `parse`.
    ///
    /// The call and the parse are retried together, so a reply that fails
    /// `parse` with [`AnalysisError::Schema`] triggers a fresh completion.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retriable error (4xx status, malformed response envelope).
    pub async fn complete_json<T, F>(
        &self,
        system: &str,
        user: &str,
        parse: F,
    ) -> Result<T, AnalysisError>
    where
        F: Fn(&str) -> Result<T, AnalysisError>,
    {
        let parse = &parse;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let content = self.chat(system, user).await?;
            parse(&sanitize_json(&content))
        })
        .await
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, AnalysisError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(AnalysisError::RateLimited { retry_after_secs });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalysisError::ApiStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Deserialize {
                context: "chat completion response".to_owned(),
                source: e,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

/// Strips markdown fences and surrounding prose from a model reply, leaving
/// the outermost JSON object when one is present.
///
/// Reasoning models emit a `<think>...</think>` preamble before the answer;
/// it is dropped first so braces inside it are not mistaken for the object.
pub(crate) fn sanitize_json(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(end) = text.rfind("</think>") {
        text = text[end + "</think>".len()..].trim();
    }

    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.rfind("```").map_or(rest, |end| &rest[..end]).trim();
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_json_strips_fenced_block() {
        let raw = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(sanitize_json(raw), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn sanitize_json_strips_bare_fence() {
        assert_eq!(sanitize_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn sanitize_json_extracts_object_from_prose() {
        let raw = "Here is the analysis: {\"a\": {\"b\": 2}} Hope this helps!";
        assert_eq!(sanitize_json(raw), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn sanitize_json_drops_think_preamble() {
        let raw = "<think>maybe {not this}</think>\n{\"sentiment\": \"positive\"}";
        assert_eq!(sanitize_json(raw), "{\"sentiment\": \"positive\"}");
    }

    #[test]
    fn sanitize_json_leaves_plain_text_alone() {
        assert_eq!(sanitize_json("  no json here "), "no json here");
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let settings = LlmSettings {
            provider: LlmProvider::Ollama,
            base_url: "localhost:11434".into(),
            api_key: None,
            model: "deepseek-r1".into(),
            temperature: 0.2,
            request_timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
        };
        assert!(matches!(
            LlmClient::new(&settings),
            Err(AnalysisError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn settings_debug_redacts_api_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Groq,
            base_url: "https://api.groq.com/openai/v1".into(),
            api_key: Some("gsk-secret".into()),
            model: "llama3-70b-8192".into(),
            temperature: 0.2,
            request_timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("gsk-secret"));
    }
}
