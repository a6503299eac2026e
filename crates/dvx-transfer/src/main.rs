//! DVX - aggregate data-value transfer tool

use anyhow::Result;
use clap::{Parser, Subcommand};
use dvx_client::ApiClient;
use dvx_common::logging::{init_logging, LogConfig, LogLevel};
use dvx_transfer::config::TransferConfig;
use dvx_transfer::orchestrator::Orchestrator;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dvx")]
#[command(author, version, about = "Aggregate data-value transfer between warehouse instances")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a transfer between the configured instances
    Run {
        /// Override DVX_START_DATE (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Override DVX_END_DATE (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Override DVX_BATCH_SIZE
        #[arg(long)]
        batch_size: Option<usize>,

        /// Override DVX_CONCURRENCY
        #[arg(long)]
        concurrency: Option<usize>,

        /// Validate on the destination without persisting
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and probe both instances
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("dvx".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            start_date,
            end_date,
            batch_size,
            concurrency,
            dry_run,
        } => {
            let mut config = TransferConfig::from_env()?;
            if let Some(start) = start_date {
                config.start_date = start;
            }
            if let Some(end) = end_date {
                config.end_date = end;
            }
            if let Some(size) = batch_size {
                config.batch_size = size;
            }
            if let Some(factor) = concurrency {
                config.concurrency = factor;
            }
            config.dry_run = config.dry_run || dry_run;

            run_transfer(config).await?;
        },
        Command::Check => {
            check(TransferConfig::from_env()?).await?;
        },
    }

    Ok(())
}

async fn run_transfer(config: TransferConfig) -> Result<()> {
    let orchestrator = Orchestrator::new(config)?;

    // Operator abort: stop admitting new units, let in-flight ones finish
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing in-flight units");
            cancel.cancel();
        }
    });

    let summary = orchestrator.run().await?;
    info!("{summary}");

    // Partial per-unit failure is a normal terminal state; only
    // configuration errors change the exit code.
    Ok(())
}

async fn check(config: TransferConfig) -> Result<()> {
    let (start, end) = config.validate()?;
    info!(%start, %end, datasets = config.datasets.len(), "Configuration is valid");

    for (name, endpoint) in [("source", &config.source), ("destination", &config.destination)] {
        let client = ApiClient::new(
            endpoint.base_url.clone(),
            endpoint.username.clone(),
            endpoint.password.clone(),
        )?;
        let probe = dvx_transfer::progress::spinner(&format!("Probing {name}..."));
        let system = client.system_info().await?;
        probe.finish_and_clear();
        info!(
            instance = name,
            url = %endpoint.base_url,
            version = system.version.as_deref().unwrap_or("unknown"),
            "Instance reachable"
        );
    }

    Ok(())
}
