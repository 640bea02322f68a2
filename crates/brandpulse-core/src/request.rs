use std::collections::BTreeSet;

use crate::{CoreError, Platform};

/// Default per-platform mention cap when the caller gives none.
pub const DEFAULT_MENTION_LIMIT: u32 = 50;

/// Upper bound on any per-platform mention limit.
pub const MAX_MENTION_LIMIT: u32 = 500;

/// Caller input for one monitoring run.
#[derive(Debug, Clone, Default)]
pub struct MonitorRequest {
    pub brand: String,
    pub platforms: Vec<Platform>,
    pub limit: Option<u32>,
}

/// A request that passed validation. Only constructible via
/// [`MonitorRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    brand: String,
    platforms: BTreeSet<Platform>,
    limit: u32,
}

impl MonitorRequest {
    /// Check the request before any network call is made.
    ///
    /// Trims the brand, deduplicates platforms, and applies `default_limit`
    /// when no limit was given.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if the brand is blank, no platform
    /// was selected, or the limit is outside `1..=MAX_MENTION_LIMIT`.
    pub fn validate(&self, default_limit: u32) -> Result<ValidatedRequest, CoreError> {
        let brand = self.brand.trim();
        if brand.is_empty() {
            return Err(CoreError::InvalidInput(
                "brand name must not be empty".to_string(),
            ));
        }

        if self.platforms.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one platform must be selected".to_string(),
            ));
        }

        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 || limit > MAX_MENTION_LIMIT {
            return Err(CoreError::InvalidInput(format!(
                "mention limit must be between 1 and {MAX_MENTION_LIMIT}, got {limit}"
            )));
        }

        Ok(ValidatedRequest {
            brand: brand.to_string(),
            platforms: self.platforms.iter().copied().collect(),
            limit,
        })
    }
}

impl ValidatedRequest {
    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    #[must_use]
    pub fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// URL-safe slug of the brand name, used as a log field.
    #[must_use]
    pub fn brand_slug(&self) -> String {
        self.brand
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}
