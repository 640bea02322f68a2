//! Normalization from raw provider items to [`brandpulse_core::Mention`].
//!
//! Field coercion is delegated to [`crate::parse_helpers`] through the serde
//! attributes on [`crate::types`]; this module decides whether an item is
//! usable and maps the per-platform shapes onto the common schema.

use std::collections::HashSet;

use brandpulse_core::{Engagement, Mention, MentionId, Platform};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::{InstagramPost, LinkedInPost, XPost, YouTubeVideo};

/// Author recorded when the provider omits it.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Mentions kept from one snapshot plus the number of malformed items skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizedItems {
    pub mentions: Vec<Mention>,
    pub skipped: usize,
}

/// Normalizes one raw snapshot item into a [`Mention`].
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the item is not a JSON object,
/// is a provider error record, has no URL, has no text, or its URL belongs to
/// a different platform.
pub fn normalize_item(platform: Platform, item: &Value) -> Result<Mention, ScraperError> {
    let malformed = |reason: String| ScraperError::Normalization { platform, reason };

    let Some(object) = item.as_object() else {
        return Err(malformed("item is not a JSON object".into()));
    };
    if let Some(code) = object
        .get("error_code")
        .or_else(|| object.get("error"))
        .filter(|v| !v.is_null())
    {
        return Err(malformed(format!("provider error record: {code}")));
    }

    let draft = match platform {
        Platform::LinkedIn => from_linkedin(parse_item::<LinkedInPost>(platform, item)?),
        Platform::Instagram => from_instagram(parse_item::<InstagramPost>(platform, item)?),
        Platform::X => from_x(parse_item::<XPost>(platform, item)?),
        Platform::YouTube => from_youtube(parse_item::<YouTubeVideo>(platform, item)?),
    };

    let url = draft
        .url
        .ok_or_else(|| malformed("item has no url".into()))?;
    if draft.text.is_empty() {
        return Err(malformed(format!("item {url} has no text")));
    }
    // Hosts we cannot classify (short links, CDN mirrors) are accepted as-is.
    if let Some(other) = Platform::from_url(&url).filter(|p| *p != platform) {
        return Err(malformed(format!("url {url} belongs to {other}")));
    }

    Ok(Mention {
        id: MentionId::derive(platform, &url),
        platform,
        author: draft.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        text: draft.text,
        published_at: draft.published_at,
        url: url.trim().to_string(),
        hashtags: draft.hashtags,
        engagement: draft.engagement,
    })
}

/// Normalizes a snapshot, preserving provider order, until `limit` mentions
/// are kept.
///
/// Malformed items are skipped and counted. Repeated URLs are dropped without
/// being counted; the provider occasionally returns the same post twice for
/// one keyword.
pub fn normalize_items(platform: Platform, items: &[Value], limit: usize) -> NormalizedItems {
    let mut out = NormalizedItems::default();
    let mut seen: HashSet<MentionId> = HashSet::new();

    for item in items {
        if out.mentions.len() >= limit {
            break;
        }
        match normalize_item(platform, item) {
            Ok(mention) => {
                if seen.insert(mention.id.clone()) {
                    out.mentions.push(mention);
                }
            }
            Err(e) => {
                tracing::debug!(%platform, error = %e, "skipping malformed item");
                out.skipped += 1;
            }
        }
    }

    if out.skipped > 0 {
        tracing::warn!(
            %platform,
            kept = out.mentions.len(),
            skipped = out.skipped,
            "skipped malformed provider items"
        );
    }
    out
}

/// Platform-independent intermediate shape.
struct Draft {
    url: Option<String>,
    text: String,
    author: Option<String>,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    hashtags: Vec<String>,
    engagement: Engagement,
}

fn parse_item<T: DeserializeOwned>(platform: Platform, item: &Value) -> Result<T, ScraperError> {
    T::deserialize(item).map_err(|e| ScraperError::Normalization {
        platform,
        reason: format!("unexpected item shape: {e}"),
    })
}

/// Joins the non-empty parts with a blank line, e.g. a video title and its description.
fn join_text(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn from_linkedin(post: LinkedInPost) -> Draft {
    Draft {
        text: join_text(&[post.headline.as_deref(), post.post_text.as_deref()]),
        url: post.url,
        author: post.user_id,
        published_at: post.date_posted,
        hashtags: post.hashtags,
        engagement: Engagement {
            views: None,
            likes: post.num_likes,
            comments: post.num_comments,
            shares: None,
        },
    }
}

fn from_instagram(post: InstagramPost) -> Draft {
    Draft {
        text: join_text(&[post.description.as_deref()]),
        url: post.url,
        author: post.user_posted,
        published_at: post.date_posted,
        hashtags: post.hashtags,
        engagement: Engagement {
            views: post.views.or(post.video_view_count),
            likes: post.likes,
            comments: post.num_comments,
            shares: None,
        },
    }
}

fn from_x(post: XPost) -> Draft {
    Draft {
        text: join_text(&[post.description.as_deref()]),
        url: post.url,
        author: post.user_posted,
        published_at: post.date_posted,
        hashtags: post.hashtags,
        engagement: Engagement {
            views: post.views,
            likes: post.likes,
            comments: post.replies,
            shares: post.reposts,
        },
    }
}

fn from_youtube(video: YouTubeVideo) -> Draft {
    Draft {
        text: join_text(&[video.title.as_deref(), video.description.as_deref()]),
        url: video.url,
        author: video.youtuber,
        published_at: video.date_posted,
        hashtags: video.hashtags,
        engagement: Engagement {
            views: video.views,
            likes: video.likes,
            comments: video.num_comments,
            shares: None,
        },
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
