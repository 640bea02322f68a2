//! Map-reduce analysis of aggregated mentions.
//!
//! 1. Flatten usable mentions in platform order.
//! 2. Plan token-bounded batches (see [`crate::batch`]).
//! 3. Map: summarize each batch with bounded concurrency, keeping batch order.
//! 4. Reduce: one surviving batch is used as-is; several are merged by a model
//!    call, falling back to [`merge_locally`] if that call fails.
//! 5. Attach the batches' per-post notes to their mentions.
//!
//! Failed batches are excluded from the narrative and reported through
//! [`AnalysisDegraded`]. Only when every batch fails is the analysis
//! unavailable.

use std::collections::{HashMap, HashSet};

use brandpulse_core::{
    AggregatedReport, AnalysisDegraded, AnalysisOutput, AppConfig, BatchOutcome, BatchStatus,
    Mention, MentionId, MentionNote,
};
use futures::stream::{self, StreamExt};

use crate::batch::plan_batches;
use crate::error::AnalysisError;
use crate::llm::LlmClient;
use crate::prompt::{
    batch_system_prompt, batch_user_prompt, merge_system_prompt, merge_user_prompt, PartialReport,
};
use crate::summary::{collect_notes, merge_locally, parse_summary, BatchNote, BatchSummary};

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Estimated-token cap per batch prompt.
    pub max_batch_tokens: usize,
    /// Batches summarized at the same time.
    pub concurrency: usize,
}

impl AnalyzerSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_batch_tokens: config.analysis_max_batch_tokens,
            concurrency: config.analysis_concurrency,
        }
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_batch_tokens: 6_000,
            concurrency: 2,
        }
    }
}

pub struct Analyzer {
    llm: LlmClient,
    settings: AnalyzerSettings,
}

impl Analyzer {
    #[must_use]
    pub fn new(llm: LlmClient, settings: AnalyzerSettings) -> Self {
        Self { llm, settings }
    }

    /// Summarizes the usable mentions of `report`.
    ///
    /// An empty input yields [`AnalysisOutput::empty`] without any model call.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::AllBatchesFailed`] when no batch could be
    /// summarized. Partial failure is not an error; it sets
    /// [`AnalysisOutput::degraded`].
    pub async fn analyze(&self, report: &AggregatedReport) -> Result<AnalysisOutput, AnalysisError> {
        let mentions: Vec<&Mention> = report.usable_mentions().collect();
        if mentions.is_empty() {
            tracing::info!(brand = %report.brand, "no usable mentions; returning empty analysis");
            return Ok(AnalysisOutput::empty());
        }

        let brand = report.brand.as_str();
        let plan = plan_batches(&mentions, self.settings.max_batch_tokens);
        tracing::debug!(
            brand,
            mentions = mentions.len(),
            batches = plan.len(),
            "analysis batches planned"
        );

        let results: Vec<Result<BatchSummary, AnalysisError>> = stream::iter(
            plan.iter()
                .map(|range| self.summarize_batch(brand, &mentions[range.clone()])),
        )
        .buffered(self.settings.concurrency.max(1))
        .collect()
        .await;

        let mut batches = Vec::with_capacity(plan.len());
        let mut succeeded: Vec<(usize, BatchSummary)> = Vec::new();
        let mut last_error = String::new();

        for (index, (range, result)) in plan.iter().zip(results).enumerate() {
            let mention_ids: Vec<MentionId> =
                mentions[range.clone()].iter().map(|m| m.id.clone()).collect();
            let status = match result {
                Ok(summary) => {
                    succeeded.push((range.len(), summary));
                    BatchStatus::Summarized
                }
                Err(e) => {
                    tracing::warn!(brand, batch = index, error = %e, "batch analysis failed");
                    last_error = e.to_string();
                    BatchStatus::Failed { reason: last_error.clone() }
                }
            };
            batches.push(BatchOutcome {
                index,
                mention_ids,
                status,
            });
        }

        if succeeded.is_empty() {
            return Err(AnalysisError::AllBatchesFailed {
                batches: plan.len(),
                last_error,
            });
        }

        let failed_batches = batches.iter().filter(|b| !b.is_summarized()).count();
        let analyzed_mentions: usize = succeeded.iter().map(|(n, _)| n).sum();
        let mut degraded_reasons = Vec::new();
        if failed_batches > 0 {
            degraded_reasons.push(format!(
                "{failed_batches} of {} batches failed",
                plan.len()
            ));
        }

        let combined = if succeeded.len() == 1 {
            succeeded.swap_remove(0).1
        } else {
            match self.merge(brand, &succeeded).await {
                Ok(merged) => merged,
                Err(e) => {
                    tracing::warn!(brand, error = %e, "merge call failed; merging locally");
                    degraded_reasons.push(format!("merge call failed ({e}); merged locally"));
                    let parts: Vec<(usize, &BatchSummary)> =
                        succeeded.iter().map(|(n, s)| (*n, s)).collect();
                    merge_locally(&parts)
                }
            }
        };

        let notable: HashSet<&MentionId> = combined.notable_ids.iter().collect();
        let notable_mentions: Vec<Mention> = mentions
            .iter()
            .filter(|m| notable.contains(&m.id))
            .map(|m| (*m).clone())
            .collect();

        let mention_notes = attach_notes(&mentions, &combined.notes);

        let degraded = (!degraded_reasons.is_empty()).then(|| AnalysisDegraded {
            reason: degraded_reasons.join("; "),
            failed_batches,
            excluded_mentions: mentions.len() - analyzed_mentions,
        });
        if let Some(d) = &degraded {
            tracing::warn!(brand, reason = %d.reason, "analysis degraded");
        }

        tracing::info!(
            brand,
            sentiment = %combined.sentiment,
            analyzed_mentions,
            batches = batches.len(),
            "analysis complete"
        );

        Ok(AnalysisOutput {
            sentiment: combined.sentiment,
            themes: combined.themes,
            notable_mentions,
            summary: combined.summary,
            mention_notes,
            analyzed_mentions,
            batches,
            degraded,
        })
    }

    async fn summarize_batch(
        &self,
        brand: &str,
        batch: &[&Mention],
    ) -> Result<BatchSummary, AnalysisError> {
        let known: HashSet<&MentionId> = batch.iter().map(|m| &m.id).collect();
        let system = batch_system_prompt();
        let user = batch_user_prompt(brand, batch);
        self.llm
            .complete_json(&system, &user, |reply| parse_summary(reply, &known))
            .await
    }

    /// Reduce step. The merged reply may only reference ids the batches
    /// already picked; if it picks none, the batches' picks are kept.
    async fn merge(
        &self,
        brand: &str,
        parts: &[(usize, BatchSummary)],
    ) -> Result<BatchSummary, AnalysisError> {
        let candidates: Vec<&MentionId> = {
            let mut seen = HashSet::new();
            parts
                .iter()
                .flat_map(|(_, s)| s.notable_ids.iter())
                .filter(|id| seen.insert(*id))
                .collect()
        };
        let known: HashSet<&MentionId> = candidates.iter().copied().collect();

        let partials: Vec<PartialReport<'_>> = parts
            .iter()
            .map(|(n, s)| PartialReport {
                mention_count: *n,
                summary: s,
            })
            .collect();
        let system = merge_system_prompt();
        let user = merge_user_prompt(brand, &partials);

        let mut merged = self
            .llm
            .complete_json(&system, &user, |reply| parse_summary(reply, &known))
            .await?;
        if merged.notable_ids.is_empty() {
            merged.notable_ids = candidates.into_iter().cloned().collect();
        }
        merged.notes = collect_notes(parts.iter().map(|(_, s)| s));
        Ok(merged)
    }
}

/// Pairs each note with its post, in input order.
fn attach_notes(mentions: &[&Mention], notes: &[BatchNote]) -> Vec<MentionNote> {
    let by_id: HashMap<&MentionId, &BatchNote> = notes.iter().map(|n| (&n.id, n)).collect();
    mentions
        .iter()
        .filter_map(|m| {
            by_id.get(&m.id).map(|note| MentionNote {
                mention_id: m.id.clone(),
                platform: m.platform,
                url: m.url.clone(),
                title: note.title.clone(),
                points: note.points.clone(),
            })
        })
        .collect()
}
