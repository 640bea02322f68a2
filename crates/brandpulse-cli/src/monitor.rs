//! `monitor` command handler.

use brandpulse_core::{AppConfig, MonitorRequest};
use brandpulse_monitor::{run_monitoring, MonitorError};

use crate::render::{render_aggregated, render_report, OutputFormat};

/// Run one monitoring job and print the report to stdout.
///
/// When analysis is unavailable the collected data is still printed before
/// the command fails.
///
/// # Errors
///
/// Returns an error for invalid input, client setup failures, or when the
/// analysis stage produced nothing usable.
pub(crate) async fn run_monitor(
    config: &AppConfig,
    request: &MonitorRequest,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match run_monitoring(config, request).await {
        Ok(report) => {
            println!("{}", render_report(&report, format)?);
            Ok(())
        }
        Err(MonitorError::AnalysisUnavailable { reason, aggregated }) => {
            println!("{}", render_aggregated(&aggregated, format)?);
            anyhow::bail!("analysis unavailable: {reason}")
        }
        Err(e) => Err(e.into()),
    }
}
