//! The per-platform collector: fetch, normalize, and classify the outcome.

use brandpulse_core::{CollectionResult, Platform};

use crate::client::ScraperClient;
use crate::normalize::normalize_items;

/// Collects up to `limit` mentions of `brand` on `platform`.
///
/// Never returns an error: a provider failure that survives the client's
/// retries becomes a `Failed` result carrying the cause, so one platform
/// cannot abort the others.
pub async fn collect(
    client: &ScraperClient,
    brand: &str,
    platform: Platform,
    limit: u32,
) -> CollectionResult {
    match client.fetch_items(brand, platform, limit).await {
        Ok(items) => {
            let normalized = normalize_items(platform, &items, limit as usize);
            tracing::info!(
                %platform,
                raw = items.len(),
                mentions = normalized.mentions.len(),
                skipped = normalized.skipped,
                "collection complete"
            );
            CollectionResult::collected(platform, normalized.mentions, normalized.skipped)
        }
        Err(e) => {
            tracing::warn!(%platform, error = %e, "collection failed");
            CollectionResult::failed(platform, e.to_string())
        }
    }
}
