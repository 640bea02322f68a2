//! Fixture builders shared by this crate's unit tests and, behind the
//! `test-support` feature, by downstream crates' tests.

use crate::{Engagement, Mention, MentionId, Platform};

/// Build a mention with deterministic content for `platform` and `n`.
#[must_use]
pub fn mention(platform: Platform, n: usize) -> Mention {
    let url = format!("https://{}.example/post/{n}", platform.slug());
    Mention {
        id: MentionId::derive(platform, &url),
        platform,
        author: format!("user{n}"),
        text: format!("Post {n} about Acme on {}", platform.label()),
        published_at: None,
        url,
        hashtags: Vec::new(),
        engagement: Engagement::default(),
    }
}

/// Build `count` mentions numbered from zero.
#[must_use]
pub fn mentions(platform: Platform, count: usize) -> Vec<Mention> {
    (0..count).map(|n| mention(platform, n)).collect()
}
