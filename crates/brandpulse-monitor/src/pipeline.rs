//! Monitoring pipeline orchestration.

use std::sync::Arc;

use brandpulse_analysis::{Analyzer, AnalyzerSettings, LlmClient, LlmSettings};
use brandpulse_core::{aggregate, assemble, AppConfig, FinalReport, MonitorRequest};
use brandpulse_scraper::{collect, ScraperClient, ScraperSettings};
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::MonitorError;

/// Collectors plus analyzer, wired to one shared outbound-request limiter.
pub struct Monitor {
    scraper: ScraperClient,
    analyzer: Analyzer,
    default_limit: u32,
}

impl Monitor {
    #[must_use]
    pub fn new(scraper: ScraperClient, analyzer: Analyzer, default_limit: u32) -> Self {
        Self {
            scraper,
            analyzer,
            default_limit,
        }
    }

    /// Builds both provider clients from `config`. At most
    /// `max_concurrent_requests` provider calls are in flight at once across
    /// collectors and analysis.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ClientSetup`] if either base URL is invalid or
    /// an HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, MonitorError> {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        let scraper = ScraperClient::new(&ScraperSettings::from_config(config))
            .map_err(|e| MonitorError::ClientSetup {
                client: "scraper",
                reason: e.to_string(),
            })?
            .with_limiter(Arc::clone(&limiter));

        let llm = LlmClient::new(&LlmSettings::from_config(config))
            .map_err(|e| MonitorError::ClientSetup {
                client: "model",
                reason: e.to_string(),
            })?
            .with_limiter(limiter);

        Ok(Self::new(
            scraper,
            Analyzer::new(llm, AnalyzerSettings::from_config(config)),
            config.default_mention_limit,
        ))
    }

    /// Runs one monitoring job.
    ///
    /// 1. Validate the request (no network traffic on failure).
    /// 2. Collect every selected platform concurrently and wait for all.
    /// 3. Aggregate, analyze, assemble.
    ///
    /// A failing platform never aborts the run; it appears as a `Failed`
    /// entry in the report.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidInput`] for a blank brand, no platforms, or an
    ///   out-of-range limit.
    /// - [`MonitorError::AnalysisUnavailable`] when every analysis batch
    ///   failed; carries the aggregated collection data.
    /// - [`MonitorError::InvalidAnalysisReference`] if the analysis points at a
    ///   mention that was not collected.
    pub async fn run(&self, request: &MonitorRequest) -> Result<FinalReport, MonitorError> {
        let request = request.validate(self.default_limit)?;
        let brand = request.brand();
        let slug = request.brand_slug();

        tracing::info!(
            brand = %slug,
            platforms = request.platforms().len(),
            limit = request.limit(),
            "monitoring run started"
        );

        let results = join_all(
            request
                .platforms()
                .iter()
                .map(|platform| collect(&self.scraper, brand, *platform, request.limit())),
        )
        .await;

        let aggregated = aggregate(brand, results);
        let failed = aggregated.failed_platforms();
        if !failed.is_empty() {
            tracing::warn!(
                brand = %slug,
                failed = ?failed,
                "some platforms failed to collect"
            );
        }
        tracing::info!(
            brand = %slug,
            total_mentions = aggregated.total_mentions,
            "collection stage complete"
        );

        let analysis = match self.analyzer.analyze(&aggregated).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(brand = %slug, error = %e, "analysis unavailable");
                return Err(MonitorError::AnalysisUnavailable {
                    reason: e.to_string(),
                    aggregated: Box::new(aggregated),
                });
            }
        };

        let report = assemble(brand, aggregated, analysis)?;
        tracing::info!(brand = %slug, "monitoring run complete");
        Ok(report)
    }
}

/// Convenience entry point: build a [`Monitor`] from `config` and run `request`.
///
/// # Errors
///
/// See [`Monitor::from_config`] and [`Monitor::run`].
pub async fn run_monitoring(
    config: &AppConfig,
    request: &MonitorRequest,
) -> Result<FinalReport, MonitorError> {
    // Input errors take precedence over client setup errors.
    request.validate(config.default_mention_limit)?;
    Monitor::from_config(config)?.run(request).await
}
