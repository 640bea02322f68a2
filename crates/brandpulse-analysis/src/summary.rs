//! Model reply schema, validation, and the deterministic local merge.

use std::collections::{BTreeSet, HashMap, HashSet};

use brandpulse_core::{MentionId, Sentiment};
use serde::Deserialize;

use crate::error::AnalysisError;

/// Reply shape shared by the batch and merge calls.
#[derive(Debug, Deserialize)]
struct RawSummary {
    sentiment: String,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    notable_mention_ids: Vec<String>,
    summary: String,
    #[serde(default)]
    mention_notes: Vec<RawNote>,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    points: Vec<String>,
}

/// Points kept per note.
const MAX_NOTE_POINTS: usize = 5;

/// The model's reading of one post: how the brand is used and the lines
/// that matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchNote {
    pub id: MentionId,
    pub title: String,
    pub points: Vec<String>,
}

/// A validated model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub sentiment: Sentiment,
    pub themes: BTreeSet<String>,
    /// Only ids that were offered to the model, in the order the model gave them.
    pub notable_ids: Vec<MentionId>,
    pub summary: String,
    /// At most one note per offered mention.
    pub notes: Vec<BatchNote>,
}

/// Parses and validates a sanitized reply.
///
/// `known_ids` is the set of mention ids the model was shown. Ids outside it
/// are dropped with a warning rather than failing the reply. Notes without a
/// title are dropped; only the first note per mention is kept.
///
/// # Errors
///
/// Returns [`AnalysisError::Schema`] if the reply is not the expected JSON
/// object, names an unrecognized sentiment, or has an empty summary.
pub fn parse_summary(
    reply: &str,
    known_ids: &HashSet<&MentionId>,
) -> Result<BatchSummary, AnalysisError> {
    let raw: RawSummary =
        serde_json::from_str(reply).map_err(|e| AnalysisError::Schema(e.to_string()))?;

    let sentiment: Sentiment = raw.sentiment.parse().map_err(AnalysisError::Schema)?;

    let summary = raw.summary.trim().to_string();
    if summary.is_empty() {
        return Err(AnalysisError::Schema("summary is empty".into()));
    }

    let themes = raw
        .themes
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut notable_ids = Vec::new();
    for id in raw.notable_mention_ids {
        let id = MentionId::from(id.trim());
        if !known_ids.contains(&id) {
            tracing::warn!(mention_id = %id, "model referenced an unknown mention id; dropping");
            continue;
        }
        if seen.insert(id.clone()) {
            notable_ids.push(id);
        }
    }

    let notes = parse_notes(raw.mention_notes, known_ids);

    Ok(BatchSummary {
        sentiment,
        themes,
        notable_ids,
        summary,
        notes,
    })
}

fn parse_notes(raw: Vec<RawNote>, known_ids: &HashSet<&MentionId>) -> Vec<BatchNote> {
    let mut seen = HashSet::new();
    let mut notes = Vec::new();
    for note in raw {
        let id = MentionId::from(note.id.trim());
        if !known_ids.contains(&id) {
            tracing::warn!(mention_id = %id, "model wrote a note for an unknown mention id; dropping");
            continue;
        }
        let title = note.title.trim().to_string();
        if title.is_empty() || seen.contains(&id) {
            continue;
        }
        let points = note
            .points
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .take(MAX_NOTE_POINTS)
            .collect();
        seen.insert(id.clone());
        notes.push(BatchNote { id, title, points });
    }
    notes
}

/// Mention-weighted sentiment vote across batch summaries.
///
/// `Unknown` carries no weight. A tie between distinct sentiments, or an
/// explicit `Mixed` winner, yields `Mixed`; no votes yields `Unknown`.
pub(crate) fn vote_sentiment(weighted: impl IntoIterator<Item = (Sentiment, usize)>) -> Sentiment {
    let mut tally: HashMap<Sentiment, usize> = HashMap::new();
    for (sentiment, weight) in weighted {
        if sentiment != Sentiment::Unknown {
            *tally.entry(sentiment).or_default() += weight;
        }
    }

    let Some(top) = tally.values().copied().max() else {
        return Sentiment::Unknown;
    };
    let leaders: Vec<Sentiment> = tally
        .into_iter()
        .filter(|(_, w)| *w == top)
        .map(|(s, _)| s)
        .collect();

    match leaders.as_slice() {
        [single] => *single,
        _ => Sentiment::Mixed,
    }
}

/// Notes from every batch, in batch order. Batches cover disjoint mentions,
/// so no note is repeated.
pub(crate) fn collect_notes<'a>(parts: impl IntoIterator<Item = &'a BatchSummary>) -> Vec<BatchNote> {
    parts
        .into_iter()
        .flat_map(|s| s.notes.iter().cloned())
        .collect()
}

/// Combines batch summaries without a model call.
///
/// Each entry pairs a summary with the number of mentions its batch covered.
pub(crate) fn merge_locally(parts: &[(usize, &BatchSummary)]) -> BatchSummary {
    let sentiment = vote_sentiment(parts.iter().map(|(n, s)| (s.sentiment, *n)));

    let themes = parts
        .iter()
        .flat_map(|(_, s)| s.themes.iter().cloned())
        .collect();

    let mut seen = HashSet::new();
    let notable_ids = parts
        .iter()
        .flat_map(|(_, s)| s.notable_ids.iter())
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect();

    let summary = parts
        .iter()
        .map(|(_, s)| s.summary.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    BatchSummary {
        sentiment,
        themes,
        notable_ids,
        summary,
        notes: collect_notes(parts.iter().map(|(_, s)| *s)),
    }
}
