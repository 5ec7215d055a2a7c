// Formbridge - Approval Workflow to ERP Batch Integration
// Copyright (c) 2025 Formbridge Contributors
// Licensed under the MIT License

use clap::Parser;
use formbridge::cli::{Cli, Commands};
use formbridge::config::{load_config, LoggingConfig};
use formbridge::logging::{init_logging, LoggingGuard};
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = ?guard.log_dir(),
        "Formbridge - Approval Workflow to ERP Batch Integration"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        println!("\n⚠️  Shutdown signal received, finishing current file...");
        let _ = shutdown_tx.send(true);
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // process::exit skips destructors; flush the file writer first
    drop(guard);
    process::exit(exit_code);
}

/// Logging from the configuration file when it loads, console-only otherwise
///
/// A configuration error is reported by the command itself.
fn setup_logging(cli: &Cli) -> formbridge::domain::Result<LoggingGuard> {
    let config = cli
        .command
        .needs_config()
        .then(|| load_config(&cli.config).ok())
        .flatten();

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let logging = config.map(|c| c.logging).unwrap_or(LoggingConfig {
        local_enabled: false,
        local_path: String::new(),
        local_rotation: "daily".to_string(),
    });

    init_logging(&level, &logging)
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    }
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Sync(args) => args.execute(&cli.config).await,
        Commands::LoadReference(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ExportXml(args) => args.execute(&cli.config).await,
        Commands::RunJob(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::SweepStaging(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
