//! Final report assembly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregatedReport, AnalysisOutput, CoreError, Mention, MentionId};

/// The terminal artifact handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub brand: String,
    pub aggregated: AggregatedReport,
    pub analysis: AnalysisOutput,
    pub generated_at: DateTime<Utc>,
}

/// Combine aggregated collection results and analysis into a [`FinalReport`].
///
/// No external calls are made.
///
/// # Errors
///
/// Returns [`CoreError::InvalidAnalysisReference`] if a notable mention is not
/// one of the aggregated usable mentions, or differs from the aggregated copy,
/// or if a mention note points at a post that was not collected.
pub fn assemble(
    brand: &str,
    aggregated: AggregatedReport,
    analysis: AnalysisOutput,
) -> Result<FinalReport, CoreError> {
    let known: HashMap<&MentionId, &Mention> = aggregated
        .usable_mentions()
        .map(|m| (&m.id, m))
        .collect();

    for notable in &analysis.notable_mentions {
        match known.get(&notable.id) {
            Some(original) if *original == notable => {}
            _ => {
                return Err(CoreError::InvalidAnalysisReference {
                    mention_id: notable.id.to_string(),
                });
            }
        }
    }

    for note in &analysis.mention_notes {
        match known.get(&note.mention_id) {
            Some(original) if original.platform == note.platform && original.url == note.url => {}
            _ => {
                return Err(CoreError::InvalidAnalysisReference {
                    mention_id: note.mention_id.to_string(),
                });
            }
        }
    }

    Ok(FinalReport {
        brand: brand.to_string(),
        aggregated,
        analysis,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mention, mentions};
    use crate::{aggregate, CollectionResult, MentionNote, Platform};

    fn aggregated() -> AggregatedReport {
        aggregate(
            "Acme",
            vec![
                CollectionResult::collected(Platform::LinkedIn, mentions(Platform::LinkedIn, 3), 0),
                CollectionResult::failed(Platform::X, "timeout"),
            ],
        )
    }

    #[test]
    fn assembles_when_notable_mentions_are_known() {
        let agg = aggregated();
        let mut analysis = AnalysisOutput::empty();
        analysis.notable_mentions = vec![mention(Platform::LinkedIn, 1)];

        let report = assemble("Acme", agg, analysis).unwrap();

        assert_eq!(report.brand, "Acme");
        assert_eq!(report.aggregated.total_mentions, 3);
        assert_eq!(report.analysis.notable_mentions.len(), 1);
    }

    #[test]
    fn rejects_unknown_notable_mention() {
        let mut analysis = AnalysisOutput::empty();
        analysis.notable_mentions = vec![mention(Platform::YouTube, 9)];

        let err = assemble("Acme", aggregated(), analysis).unwrap_err();

        assert!(matches!(err, CoreError::InvalidAnalysisReference { .. }));
    }

    #[test]
    fn rejects_notable_mention_with_altered_content() {
        let mut altered = mention(Platform::LinkedIn, 0);
        altered.text = "rewritten by the model".to_string();
        let mut analysis = AnalysisOutput::empty();
        analysis.notable_mentions = vec![altered];

        let err = assemble("Acme", aggregated(), analysis).unwrap_err();

        assert!(
            matches!(err, CoreError::InvalidAnalysisReference { ref mention_id } if mention_id.starts_with("linkedin-"))
        );
    }

    fn note_for(m: &Mention) -> MentionNote {
        MentionNote {
            mention_id: m.id.clone(),
            platform: m.platform,
            url: m.url.clone(),
            title: "Brand named in a product comparison".to_string(),
            points: vec!["Acme beats the rest".to_string()],
        }
    }

    #[test]
    fn assembles_with_notes_for_collected_posts() {
        let mut analysis = AnalysisOutput::empty();
        analysis.mention_notes = vec![note_for(&mention(Platform::LinkedIn, 2))];

        let report = assemble("Acme", aggregated(), analysis).unwrap();

        assert_eq!(report.analysis.mention_notes.len(), 1);
    }

    #[test]
    fn rejects_note_for_uncollected_post() {
        let mut stray = note_for(&mention(Platform::LinkedIn, 0));
        stray.url = "https://linkedin.example/post/elsewhere".to_string();
        let mut analysis = AnalysisOutput::empty();
        analysis.mention_notes = vec![stray];

        let err = assemble("Acme", aggregated(), analysis).unwrap_err();

        assert!(matches!(err, CoreError::InvalidAnalysisReference { .. }));
    }

    #[test]
    fn empty_analysis_always_assembles() {
        let report = assemble("Acme", aggregated(), AnalysisOutput::empty()).unwrap();
        assert_eq!(report.analysis.summary, "no data");
    }

    #[test]
    fn final_report_serializes_to_json() {
        let report = assemble("Acme", aggregated(), AnalysisOutput::empty()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["brand"], "Acme");
        assert_eq!(json["aggregated"]["results"]["x"]["status"], "failed");
        assert_eq!(json["analysis"]["sentiment"], "unknown");
    }
}
