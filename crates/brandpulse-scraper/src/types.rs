//! Scraping-provider response types.
//!
//! ## Dataset API envelope
//!
//! `POST /datasets/v3/trigger` answers `{"snapshot_id": "s_..."}`. Progress
//! polling answers `{"status": "running" | "ready" | "failed", ...}`; failed
//! snapshots may carry an `error` or `error_message` string. The snapshot
//! download is a bare JSON array of items.
//!
//! ## Items
//!
//! Item shapes differ per dataset and drift over time. Counts arrive as numbers
//! in one record and as `"1,204"` or `"3.4K"` in the next; hashtags arrive as
//! an array or as one space-separated string. Every field here is optional and
//! coerced leniently (see [`crate::parse_helpers`]); the decision whether an
//! item is usable is made in [`crate::normalize`].
//!
//! With `include_errors=true` the provider interleaves error records such as
//! `{"error": "...", "error_code": "dead_page", "input": {...}}` with real
//! items. Those are detected before deserializing into the structs below.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::parse_helpers::{lenient_count, lenient_string, lenient_tags, lenient_timestamp};

/// Response from the dataset trigger endpoint.
#[derive(Debug, Deserialize)]
pub struct TriggerResponse {
    pub snapshot_id: String,
}

/// Response from the snapshot progress endpoint.
#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    pub status: String,
    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
}

/// Lifecycle of a snapshot as reported by the progress endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    Running,
    Ready,
    Failed,
}

impl ProgressResponse {
    /// Unknown status strings (`"starting"`, `"building"`, ...) count as still running.
    #[must_use]
    pub fn state(&self) -> SnapshotState {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "ready" => SnapshotState::Ready,
            "failed" | "error" => SnapshotState::Failed,
            _ => SnapshotState::Running,
        }
    }
}

/// A LinkedIn post from the posts dataset.
#[derive(Debug, Default, Deserialize)]
pub struct LinkedInPost {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub post_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_posted: Option<DateTime<Utc>>,
}

/// An Instagram post or reel.
#[derive(Debug, Default, Deserialize)]
pub struct InstagramPost {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_posted: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: Option<u64>,
    /// Older reel records report views under this name.
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_posted: Option<DateTime<Utc>>,
}

/// A YouTube video.
#[derive(Debug, Default, Deserialize)]
pub struct YouTubeVideo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub youtuber: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_posted: Option<DateTime<Utc>>,
}

/// A post on X.
#[derive(Debug, Default, Deserialize)]
pub struct XPost {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_posted: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub replies: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub reposts: Option<u64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_posted: Option<DateTime<Utc>>,
}
