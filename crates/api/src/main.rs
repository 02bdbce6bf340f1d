//! `tnt` - Track and Trace offline scan queue CLI

use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use tnt_app::commands;
use tnt_app::utils::logging::{error_label, init_tracing, log_command_execution};
use tnt_app::{AppContext, Cli, Commands};
use tnt_infra::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let (config, source) = config::load_with_source(cli.config.clone())?;
    init_tracing(&config.logging);
    tracing::info!(%source, "configuration loaded");

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env loaded"),
    }

    let ctx = AppContext::new(config)?;
    let started = Instant::now();
    let name = command_name(&cli.command);

    let result = dispatch(&ctx, cli.command).await;
    log_command_execution(name, started.elapsed(), result.is_ok());
    if let Err(err) = &result {
        tracing::error!(command = name, error_type = error_label(err), error = %err, "command failed");
    }
    result
}

async fn dispatch(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Capture(args) => print(&commands::capture_scan(ctx, args).await?),
        Commands::Enqueue { file } => print(&commands::enqueue_file(ctx, &file).await?),
        Commands::Drain => print(&commands::drain_queue(ctx).await?),
        Commands::Status { probe } => print(&commands::queue_status(ctx, probe).await?),
        Commands::RequeueFailed => print(&commands::requeue_failed(ctx).await?),
        Commands::Run => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for Ctrl-C");
                }
            };
            print(&commands::run_worker(ctx, shutdown).await?)
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Capture(_) => "queue::capture",
        Commands::Enqueue { .. } => "queue::enqueue",
        Commands::Drain => "queue::drain",
        Commands::Status { .. } => "queue::status",
        Commands::RequeueFailed => "queue::requeue_failed",
        Commands::Run => "sync::run",
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
