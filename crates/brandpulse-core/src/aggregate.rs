//! Keyed merge of per-platform collection results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CollectionResult, Mention, Platform};

/// Merged view of every platform's collection outcome for one brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub brand: String,
    pub results: BTreeMap<Platform, CollectionResult>,
    /// Sum of mention counts across `Success` and `PartialSuccess` results.
    pub total_mentions: usize,
    pub collected_at: DateTime<Utc>,
}

impl AggregatedReport {
    /// Mentions from usable results, flattened in platform order with each
    /// platform's source order preserved.
    pub fn usable_mentions(&self) -> impl Iterator<Item = &Mention> {
        self.results
            .values()
            .filter(|r| r.status().is_usable())
            .flat_map(CollectionResult::mentions)
    }

    /// Platforms whose collection failed outright.
    #[must_use]
    pub fn failed_platforms(&self) -> Vec<Platform> {
        self.results
            .values()
            .filter(|r| !r.status().is_usable())
            .map(CollectionResult::platform)
            .collect()
    }
}

/// Merge collector outputs keyed by platform.
///
/// Every input platform gets exactly one entry regardless of status. If the
/// same platform appears twice the first result wins and the duplicate is
/// logged and dropped.
#[must_use]
pub fn aggregate(brand: &str, results: Vec<CollectionResult>) -> AggregatedReport {
    let mut by_platform: BTreeMap<Platform, CollectionResult> = BTreeMap::new();

    for result in results {
        let platform = result.platform();
        if by_platform.contains_key(&platform) {
            tracing::warn!(
                brand,
                platform = platform.slug(),
                "duplicate collection result for platform; keeping the first"
            );
            continue;
        }
        by_platform.insert(platform, result);
    }

    let total_mentions = by_platform
        .values()
        .map(CollectionResult::mention_count)
        .sum();

    tracing::debug!(
        brand,
        platforms = by_platform.len(),
        total_mentions,
        "aggregated collection results"
    );

    AggregatedReport {
        brand: brand.to_string(),
        results: by_platform,
        total_mentions,
        collected_at: Utc::now(),
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
