//! Language-model analysis of aggregated brand mentions.
//!
//! Talks to an OpenAI-compatible chat endpoint (Groq or a local Ollama),
//! splits the mentions into token-bounded batches, summarizes each batch, and
//! merges the batch summaries into one [`brandpulse_core::AnalysisOutput`].

pub mod analyzer;
pub mod batch;
pub mod error;
pub mod llm;
pub mod summary;

mod prompt;
mod retry;

pub use analyzer::{Analyzer, AnalyzerSettings};
pub use batch::{estimate_tokens, mention_tokens, plan_batches};
pub use error::AnalysisError;
pub use llm::{LlmClient, LlmSettings};
pub use prompt::MAX_PROMPT_TEXT_CHARS;
pub use summary::{parse_summary, BatchNote, BatchSummary};
