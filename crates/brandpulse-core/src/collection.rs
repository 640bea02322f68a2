use serde::{Deserialize, Serialize};

use crate::{Mention, Platform};

/// Outcome category of one platform's collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Success,
    /// The provider call succeeded but some items were skipped as malformed.
    PartialSuccess,
    Failed,
}

impl CollectionStatus {
    /// `true` for statuses whose mentions feed totals and analysis.
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(
            self,
            CollectionStatus::Success | CollectionStatus::PartialSuccess
        )
    }
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionStatus::Success => write!(f, "success"),
            CollectionStatus::PartialSuccess => write!(f, "partial_success"),
            CollectionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one platform's collection attempt.
///
/// Built only through the constructors below so that `error` is present
/// exactly when the status is not [`CollectionStatus::Success`] and a failed
/// result never carries mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    platform: Platform,
    status: CollectionStatus,
    mentions: Vec<Mention>,
    error: Option<String>,
    skipped_items: usize,
}

impl CollectionResult {
    /// Build a result from normalized mentions.
    ///
    /// The status is `Success` when nothing was skipped and `PartialSuccess`
    /// otherwise.
    #[must_use]
    pub fn collected(platform: Platform, mentions: Vec<Mention>, skipped_items: usize) -> Self {
        if skipped_items == 0 {
            Self {
                platform,
                status: CollectionStatus::Success,
                mentions,
                error: None,
                skipped_items,
            }
        } else {
            Self {
                platform,
                status: CollectionStatus::PartialSuccess,
                mentions,
                error: Some(format!(
                    "skipped {skipped_items} malformed item{}",
                    if skipped_items == 1 { "" } else { "s" }
                )),
                skipped_items,
            }
        }
    }

    /// Build a failed result carrying the cause.
    #[must_use]
    pub fn failed(platform: Platform, cause: impl Into<String>) -> Self {
        Self {
            platform,
            status: CollectionStatus::Failed,
            mentions: Vec::new(),
            error: Some(cause.into()),
            skipped_items: 0,
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn status(&self) -> CollectionStatus {
        self.status
    }

    /// Mentions in the order the source returned them.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn skipped_items(&self) -> usize {
        self.skipped_items
    }

    /// Number of mentions this result contributes to totals.
    #[must_use]
    pub fn mention_count(&self) -> usize {
        if self.status.is_usable() {
            self.mentions.len()
        } else {
            0
        }
    }
}
