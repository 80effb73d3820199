use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use notifier_core::{AppConfig, WorkloadEvent};
use workload_notifier::Application;

#[derive(Parser)]
#[command(name = "notifier", about = "Trainer workload notification pipeline")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    CreateUpdate,
    Delete,
}

#[derive(Subcommand)]
enum Command {
    /// Send a single workload event through the delivery pipeline.
    Send {
        #[arg(long)]
        trainer: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
        /// Training date, e.g. 2025-01-15.
        #[arg(long)]
        date: NaiveDate,
        /// Training duration in minutes; ignored for delete.
        #[arg(long, default_value_t = 0)]
        duration: u32,
        #[arg(long, value_enum)]
        action: ActionArg,
        /// Reuse an existing correlation id instead of generating one.
        #[arg(long)]
        transaction_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    let app = Application::build(config)
        .await
        .context("building notification pipeline")?;

    match cli.command {
        Command::Send {
            trainer,
            first_name,
            last_name,
            active,
            date,
            duration,
            action,
            transaction_id,
        } => {
            let mut event = match action {
                ActionArg::CreateUpdate => WorkloadEvent::created_or_updated(
                    trainer, first_name, last_name, active, date, duration,
                ),
                ActionArg::Delete => {
                    WorkloadEvent::deleted(trainer, first_name, last_name, active, date)
                }
            };
            if let Some(transaction_id) = transaction_id {
                event = event.with_transaction_id(transaction_id);
            }

            let transaction_id = event.transaction_id.clone();
            let result = app.notify(event).await;

            // Close the broker connection before reporting the outcome.
            app.shutdown().await.context("closing broker connection")?;

            let outcome = result?;
            info!("delivery outcome for {transaction_id}: {outcome:?}");
        }
    }

    Ok(())
}
