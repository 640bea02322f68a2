//! Prompt construction for the map (per batch) and reduce (merge) calls.

use std::fmt::Write as _;

use brandpulse_core::{Mention, MentionId};

use crate::summary::BatchSummary;

/// Mention text beyond this many characters is cut before it reaches a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 2_000;

const BATCH_RESPONSE_SCHEMA: &str = r#"{
  "sentiment": "positive" | "negative" | "neutral" | "mixed",
  "themes": ["short theme", "..."],
  "notable_mention_ids": ["id copied exactly from the input", "..."],
  "summary": "2-4 sentence narrative",
  "mention_notes": [
    {
      "id": "id copied exactly from the input",
      "title": "how the brand is used in this post",
      "points": ["brand-relevant line from the post", "..."]
    }
  ]
}"#;

const MERGE_RESPONSE_SCHEMA: &str = r#"{
  "sentiment": "positive" | "negative" | "neutral" | "mixed",
  "themes": ["short theme", "..."],
  "notable_mention_ids": ["id copied exactly from the input", "..."],
  "summary": "2-4 sentence narrative"
}"#;

pub(crate) fn batch_system_prompt() -> String {
    format!(
        "You are a brand-monitoring analyst. You read social media mentions of a brand \
and report how the brand is being discussed.\n\n\
## Your Task\n\
1. Judge the overall sentiment toward the brand across the mentions.\n\
2. List 3-6 recurring themes (products, complaints, campaigns, people, events).\n\
3. Pick up to 5 notable mentions: high engagement, strong opinions, or news value. \
Refer to them only by the id in square brackets.\n\
4. Write a short factual summary.\n\
5. For every mention that actually discusses the brand, add one entry to \
`mention_notes`: a title saying how the brand is used in that post, and 1-3 \
points quoting or closely paraphrasing only the brand-relevant lines. Skip \
mentions where the brand is incidental.\n\n\
## Output Format\n\
Respond with a single JSON object and nothing else:\n{BATCH_RESPONSE_SCHEMA}"
    )
}

pub(crate) fn merge_system_prompt() -> String {
    format!(
        "You are a brand-monitoring analyst combining partial reports. Each partial \
report covers a different slice of the same brand's social media mentions. \
Weigh each partial by its mention count, keep themes that matter across slices, \
and choose notable mentions only from the ids listed in the partials.\n\n\
## Output Format\n\
Respond with a single JSON object and nothing else:\n{MERGE_RESPONSE_SCHEMA}"
    )
}

/// Truncates to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One mention as it appears in a batch prompt.
pub(crate) fn render_mention(mention: &Mention) -> String {
    let mut line = format!(
        "[{}] {} | @{}",
        mention.id,
        mention.platform.label(),
        mention.author
    );
    if let Some(at) = mention.published_at {
        let _ = write!(line, " | {}", at.format("%Y-%m-%d"));
    }
    let e = &mention.engagement;
    for (name, value) in [
        ("views", e.views),
        ("likes", e.likes),
        ("comments", e.comments),
        ("shares", e.shares),
    ] {
        if let Some(v) = value {
            let _ = write!(line, " | {name}={v}");
        }
    }
    if !mention.hashtags.is_empty() {
        let _ = write!(line, " | #{}", mention.hashtags.join(" #"));
    }
    line.push('\n');
    line.push_str(truncate_chars(mention.text.trim(), MAX_PROMPT_TEXT_CHARS));
    line
}

pub(crate) fn batch_user_prompt(brand: &str, mentions: &[&Mention]) -> String {
    let mut prompt = format!(
        "Brand: {brand}\nMentions in this batch: {}\n\n",
        mentions.len()
    );
    for mention in mentions {
        prompt.push_str(&render_mention(mention));
        prompt.push_str("\n\n");
    }
    prompt
}

/// A successful batch as presented to the merge call.
pub(crate) struct PartialReport<'a> {
    pub mention_count: usize,
    pub summary: &'a BatchSummary,
}

pub(crate) fn merge_user_prompt(brand: &str, partials: &[PartialReport<'_>]) -> String {
    let mut prompt = format!("Brand: {brand}\nPartial reports: {}\n\n", partials.len());
    for (n, partial) in partials.iter().enumerate() {
        let s = partial.summary;
        let themes: Vec<&str> = s.themes.iter().map(String::as_str).collect();
        let notable: Vec<&str> = s.notable_ids.iter().map(MentionId::as_str).collect();
        let _ = write!(
            prompt,
            "## Partial {} ({} mentions)\nsentiment: {}\nthemes: {}\nnotable_mention_ids: {}\nsummary: {}\n\n",
            n + 1,
            partial.mention_count,
            s.sentiment,
            themes.join(", "),
            notable.join(", "),
            s.summary
        );
    }
    prompt
}
