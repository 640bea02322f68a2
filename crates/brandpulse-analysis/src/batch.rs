//! Token estimation and greedy batch planning.

use std::ops::Range;

use brandpulse_core::Mention;

use crate::prompt::render_mention;

/// Rough characters-per-token ratio for English social text.
const CHARS_PER_TOKEN: usize = 4;

/// Separator and framing cost added per mention on top of its rendered text.
pub const MENTION_OVERHEAD_TOKENS: usize = 8;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimated prompt cost of one mention, computed on its rendered (and
/// truncated) form.
#[must_use]
pub fn mention_tokens(mention: &Mention) -> usize {
    estimate_tokens(&render_mention(mention)) + MENTION_OVERHEAD_TOKENS
}

/// Splits `mentions` into contiguous ranges whose estimated cost stays within
/// `max_tokens`.
///
/// Greedy: a batch grows until the next mention would overflow it. A mention
/// that alone exceeds the cap gets a batch of its own. Ranges cover the input
/// exactly once, in order.
#[must_use]
pub fn plan_batches(mentions: &[&Mention], max_tokens: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut used = 0usize;

    for (idx, mention) in mentions.iter().enumerate() {
        let cost = mention_tokens(mention);
        if idx > start && used + cost > max_tokens {
            batches.push(start..idx);
            start = idx;
            used = 0;
        }
        used += cost;
    }
    if start < mentions.len() {
        batches.push(start..mentions.len());
    }
    batches
}
