mod monitor;
mod render;

use brandpulse_core::{Environment, Platform};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::render::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "brandpulse-cli")]
#[command(about = "Brand mention monitoring across social platforms")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect mentions of a brand and print an analyzed report
    Monitor {
        /// Brand name to search for
        #[arg(long)]
        brand: String,

        /// Platform to monitor; repeat or comma-separate for several
        /// (linkedin, instagram, x, youtube)
        #[arg(long = "platform", required = true, value_delimiter = ',')]
        platforms: Vec<Platform>,

        /// Maximum mentions per platform (1-500); defaults to BRANDPULSE_DEFAULT_MENTION_LIMIT
        #[arg(long)]
        limit: Option<u32>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
}

/// Colored, target-free log lines for development shells; plain lines with
/// targets everywhere else.
fn is_local(env: &Environment) -> bool {
    matches!(env, Environment::Development)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("brandpulse-cli ready; run `brandpulse-cli monitor --help` for usage");
        return Ok(());
    };

    let config = brandpulse_core::load_app_config()?;

    // Logs go to stderr so stdout carries only the report.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let local = is_local(&config.env);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(local)
        .with_target(!local)
        .init();

    match command {
        Commands::Monitor {
            brand,
            platforms,
            limit,
            format,
        } => {
            let request = brandpulse_core::MonitorRequest {
                brand,
                platforms,
                limit,
            };
            monitor::run_monitor(&config, &request, format).await
        }
    }
}
