use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Mention, MentionId, Platform};

/// Summary text of the analysis produced for an empty mention set.
pub const EMPTY_SUMMARY: &str = "no data";

/// Overall sentiment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
    Unknown,
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "mixed" => Ok(Sentiment::Mixed),
            "unknown" => Ok(Sentiment::Unknown),
            other => Err(format!("unrecognized sentiment '{other}'")),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Mixed => write!(f, "mixed"),
            Sentiment::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Summarized,
    Failed { reason: String },
}

/// What happened to one batch of mentions during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub index: usize,
    /// Every mention assigned to this batch, in order.
    pub mention_ids: Vec<MentionId>,
    #[serde(flatten)]
    pub status: BatchStatus,
}

impl BatchOutcome {
    #[must_use]
    pub fn is_summarized(&self) -> bool {
        matches!(self.status, BatchStatus::Summarized)
    }
}

/// Flag attached to an analysis built from incomplete input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDegraded {
    pub reason: String,
    pub failed_batches: usize,
    /// Mentions left out of the narrative. They still count in totals.
    pub excluded_mentions: usize,
}

/// How a single post uses the brand, as read by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionNote {
    pub mention_id: MentionId,
    pub platform: Platform,
    pub url: String,
    /// One line on how the brand appears in the post.
    pub title: String,
    /// Brand-relevant lines from the post.
    pub points: Vec<String>,
}

/// Language-model derived summary of the aggregated mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub sentiment: Sentiment,
    pub themes: BTreeSet<String>,
    /// Representative mentions, in the order they appear in the input.
    pub notable_mentions: Vec<Mention>,
    pub summary: String,
    /// Per-post notes, in the order the posts appear in the input.
    #[serde(default)]
    pub mention_notes: Vec<MentionNote>,
    /// Mentions whose batch was summarized successfully.
    pub analyzed_mentions: usize,
    pub batches: Vec<BatchOutcome>,
    pub degraded: Option<AnalysisDegraded>,
}

impl AnalysisOutput {
    /// The defined result for an input with no usable mentions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sentiment: Sentiment::Unknown,
            themes: BTreeSet::new(),
            notable_mentions: Vec::new(),
            summary: EMPTY_SUMMARY.to_string(),
            mention_notes: Vec::new(),
            analyzed_mentions: 0,
            batches: Vec::new(),
            degraded: None,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}
