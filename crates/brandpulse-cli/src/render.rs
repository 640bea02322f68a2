//! Report rendering for terminal output.

use brandpulse_core::{AggregatedReport, CollectionResult, FinalReport, Mention, MentionNote};
use chrono::{DateTime, Utc};
use clap::ValueEnum;

/// Notable-mention excerpts are cut to this many characters.
const EXCERPT_CHARS: usize = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Json,
}

/// Render a completed report in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn render_report(report: &FinalReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Markdown => Ok(report_markdown(report)),
    }
}

/// Render collection data alone, used when analysis could not be produced.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn render_aggregated(
    aggregated: &AggregatedReport,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(aggregated)?),
        OutputFormat::Markdown => Ok(aggregated_markdown(aggregated)),
    }
}

fn report_markdown(report: &FinalReport) -> String {
    let analysis = &report.analysis;
    let mut lines = header(
        &report.brand,
        report.generated_at,
        report.aggregated.total_mentions,
    );
    lines.push(format!("**Sentiment**: {}", analysis.sentiment));

    if let Some(degraded) = &analysis.degraded {
        lines.push(String::new());
        lines.push(format!(
            "> **Partial analysis**: {} ({} mentions excluded)",
            degraded.reason, degraded.excluded_mentions
        ));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push(analysis.summary.clone());

    if !analysis.themes.is_empty() {
        lines.push(String::new());
        lines.push("## Key Themes".to_string());
        lines.push(String::new());
        lines.extend(analysis.themes.iter().map(|theme| format!("- {theme}")));
    }

    lines.push(String::new());
    lines.extend(sources_table(report.aggregated.results.values()));

    if !analysis.notable_mentions.is_empty() {
        lines.push(String::new());
        lines.push("## Notable Mentions".to_string());
        lines.push(String::new());
        lines.extend(analysis.notable_mentions.iter().map(notable_line));
    }

    if !analysis.mention_notes.is_empty() {
        lines.push(String::new());
        lines.extend(notes_by_platform(&analysis.mention_notes));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// One subsection per platform, one entry per noted post. Notes arrive in
/// platform order, so grouping only needs to watch for a platform change.
fn notes_by_platform(notes: &[MentionNote]) -> Vec<String> {
    let mut lines = vec!["## By Platform".to_string()];
    let mut current = None;
    for note in notes {
        if current != Some(note.platform) {
            current = Some(note.platform);
            lines.push(String::new());
            lines.push(format!("### {}", note.platform.label()));
        }
        lines.push(String::new());
        lines.push(format!("**{}** ({})", note.title, note.url));
        lines.extend(note.points.iter().map(|point| format!("- {point}")));
    }
    lines
}

fn aggregated_markdown(aggregated: &AggregatedReport) -> String {
    let mut lines = header(
        &aggregated.brand,
        aggregated.collected_at,
        aggregated.total_mentions,
    );
    lines.push("**Sentiment**: unavailable".to_string());
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.extend(sources_table(aggregated.results.values()));
    lines.push(String::new());
    lines.join("\n")
}

fn header(brand: &str, at: DateTime<Utc>, total: usize) -> Vec<String> {
    vec![
        format!("# Brand Mention Report: {brand}"),
        String::new(),
        format!("**Generated**: {}", at.format("%Y-%m-%d %H:%M UTC")),
        format!("**Mentions**: {total}"),
    ]
}

fn sources_table<'a>(results: impl Iterator<Item = &'a CollectionResult>) -> Vec<String> {
    let mut lines = vec![
        "## Sources".to_string(),
        String::new(),
        "| Platform | Status | Mentions | Detail |".to_string(),
        "|----------|--------|----------|--------|".to_string(),
    ];
    for result in results {
        let detail = result.error().map(table_cell).unwrap_or_default();
        lines.push(format!(
            "| {} | {} | {} | {} |",
            result.platform().label(),
            result.status(),
            result.mention_count(),
            detail
        ));
    }
    lines
}

fn notable_line(mention: &Mention) -> String {
    let excerpt: String = mention.text.chars().take(EXCERPT_CHARS).collect();
    let ellipsis = if mention.text.chars().count() > EXCERPT_CHARS {
        "..."
    } else {
        ""
    };
    let interactions = match mention.engagement.interactions() {
        0 => String::new(),
        n => format!(" [{n} interactions]"),
    };
    format!(
        "- **{}** @{}{}: {}{} ({})",
        mention.platform.label(),
        mention.author,
        interactions,
        excerpt.split_whitespace().collect::<Vec<_>>().join(" "),
        ellipsis,
        mention.url
    )
}

fn table_cell(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
