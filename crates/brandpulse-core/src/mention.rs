use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Platform;

/// Stable identifier for a mention, derived from its platform and URL.
///
/// The same provider payload always yields the same id, which is what lets the
/// analyzer reference mentions by id and the assembler check those references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionId(String);

impl MentionId {
    /// Derive the id for a mention at `url` on `platform`.
    #[must_use]
    pub fn derive(platform: Platform, url: &str) -> Self {
        let digest = format!(
            "{:x}",
            Sha256::digest(format!("{}:{}", platform.slug(), url.trim()).as_bytes())
        );
        Self(format!("{}-{}", platform.slug(), &digest[..12]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MentionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MentionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Engagement counters reported by the platform. Absent when the provider
/// did not report the field or reported something unparseable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
}

impl Engagement {
    /// Sum of all reported interaction counters (views excluded).
    #[must_use]
    pub fn interactions(&self) -> u64 {
        [self.likes, self.comments, self.shares]
            .into_iter()
            .flatten()
            .fold(0u64, u64::saturating_add)
    }
}

/// One observed occurrence of the brand on a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: MentionId,
    pub platform: Platform,
    /// Author handle or user id as reported by the platform.
    pub author: String,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub hashtags: Vec<String>,
    pub engagement: Engagement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_id_is_deterministic() {
        let a = MentionId::derive(Platform::X, "https://x.com/acme/status/1");
        let b = MentionId::derive(Platform::X, "https://x.com/acme/status/1");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("x-"));
    }

    #[test]
    fn mention_id_differs_across_platforms_and_urls() {
        let url = "https://example.com/post/1";
        assert_ne!(
            MentionId::derive(Platform::X, url),
            MentionId::derive(Platform::LinkedIn, url)
        );
        assert_ne!(
            MentionId::derive(Platform::X, url),
            MentionId::derive(Platform::X, "https://example.com/post/2")
        );
    }

    #[test]
    fn mention_id_ignores_surrounding_whitespace() {
        assert_eq!(
            MentionId::derive(Platform::YouTube, " https://youtu.be/a "),
            MentionId::derive(Platform::YouTube, "https://youtu.be/a")
        );
    }

    #[test]
    fn interactions_sums_present_counters() {
        let engagement = Engagement {
            views: Some(1_000),
            likes: Some(10),
            comments: None,
            shares: Some(2),
        };
        assert_eq!(engagement.interactions(), 12);
        assert_eq!(Engagement::default().interactions(), 0);
    }
}
