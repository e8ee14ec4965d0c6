mod batch;
mod cli;
mod input;

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use rustls::crypto::ring::default_provider;
use tracing::{error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use leaderboard_core::Config;
use leaderboard_database::{
    Database,
    impls::leaderboard::{register_handle, try_list_ranked},
};
use leaderboard_utils::formatting::format_board;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "Error in main function");
            ExitCode::FAILURE
        }
    }
}

/// Progress goes to stdout, warnings and errors to stderr.
fn init_tracing(verbose: bool) {
    let max_progress_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(move |metadata| {
            let level = *metadata.level();
            if level <= tracing::Level::WARN || level > max_progress_level {
                return false;
            }

            level == tracing::Level::INFO || metadata.target().starts_with("leaderboard")
        }));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|metadata| {
            *metadata.level() <= tracing::Level::WARN
        }));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(stderr_layer)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!(backend = config.store.backend_name(), "Configuration loaded.");

    let db = Database::connect(&config).await?;

    match cli.command() {
        Command::Sync { input } => {
            let summary = batch::sync(&db, &input).await?;
            if summary.failed > 0 {
                warn!(
                    failed = summary.failed,
                    processed = summary.processed,
                    "Some records could not be written."
                );
            }
        }
        Command::Show { limit, board } => {
            let entries = try_list_ranked(&db, limit)
                .await
                .context("failed to fetch leaderboard")?;

            if board {
                println!("{}", format_board(&entries));
            } else {
                batch::print_listing(&entries);
            }
        }
        Command::Register { username, handle } => {
            let outcome = register_handle(&db, &username, &handle)
                .await
                .with_context(|| format!("failed to register handle for `{username}`"))?;
            info!(
                operation = %outcome.operation,
                rows = ?outcome.rows,
                "Registered {} with X handle {}.",
                username,
                handle
            );
        }
    }

    Ok(())
}
