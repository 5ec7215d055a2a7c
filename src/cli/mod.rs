//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Formbridge using clap.

pub mod commands;
pub mod context;

use clap::{Parser, Subcommand};

/// Formbridge - approval workflow to ERP batch integration
#[derive(Parser, Debug)]
#[command(name = "formbridge")]
#[command(version, about, long_about = None)]
#[command(author = "Formbridge Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "formbridge.toml", env = "FORMBRIDGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FORMBRIDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enqueue approved requisitions and load their export lines
    Sync(commands::sync::SyncArgs),

    /// Load reference-data XML files into the master tables
    LoadReference(commands::reference::ReferenceArgs),

    /// Write pending export lines to XML files
    ExportXml(commands::export::ExportArgs),

    /// Run a job by key or legacy alias
    RunJob(commands::job::JobArgs),

    /// Drop orphaned staging tables
    SweepStaging(commands::sweep::SweepArgs),

    /// Show queue and export status
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Commands {
    /// Commands that run without a configuration file
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Init(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::ReferenceKind;

    #[test]
    fn test_cli_parse_sync() {
        let cli = Cli::parse_from(["formbridge", "sync"]);
        assert_eq!(cli.config, "formbridge.toml");
        assert!(matches!(cli.command, Commands::Sync(ref a) if !a.dry_run));
    }

    #[test]
    fn test_cli_parse_sync_dry_run() {
        let cli = Cli::parse_from(["formbridge", "sync", "--dry-run"]);
        assert!(matches!(cli.command, Commands::Sync(ref a) if a.dry_run));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["formbridge", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["formbridge", "--log-level", "debug", "export-xml"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ExportXml(_)));
    }

    #[test]
    fn test_cli_parse_load_reference_kind() {
        let cli = Cli::parse_from(["formbridge", "load-reference", "--kind", "material"]);
        match cli.command {
            Commands::LoadReference(args) => assert_eq!(args.kind, Some(ReferenceKind::Material)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_job() {
        let cli = Cli::parse_from(["formbridge", "run-job", "BpmDataUploadJob"]);
        match cli.command {
            Commands::RunJob(args) => assert_eq!(args.name, "BpmDataUploadJob"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_run_job_requires_name() {
        assert!(Cli::try_parse_from(["formbridge", "run-job"]).is_err());
    }

    #[test]
    fn test_cli_parse_maintenance_commands() {
        let cli = Cli::parse_from(["formbridge", "sweep-staging"]);
        assert!(matches!(cli.command, Commands::SweepStaging(_)));
        let cli = Cli::parse_from(["formbridge", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["formbridge", "init"]);
        assert!(!cli.command.needs_config());
    }
}
