//! Configuration management for Formbridge
//!
//! Configuration is read from a TOML file with `${VAR_NAME}` substitution,
//! section defaults, `FORMBRIDGE_<SECTION>_<KEY>` environment overrides and
//! validation on load.
//!
//! ```rust,no_run
//! use formbridge::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("formbridge.toml")?;
//! println!("Export table: {}", config.pipeline.export_table);
//! # Ok(())
//! # }
//! ```
//!
//! # Sections
//!
//! - [`ApplicationConfig`] - log level and dry-run switch
//! - [`DatabaseConfig`] - PostgreSQL connection and pool settings
//! - [`PipelineConfig`] - queue/export tables and merge behaviour
//! - [`IntakeConfig`] - requisition intake window
//! - [`ReferenceConfig`] - reference-data file directories
//! - [`XmlExportConfig`] - XML export directories per scenario
//! - [`JobsConfig`] - legacy job name aliases
//! - [`LoggingConfig`] - local log files
//!
//! ```toml
//! [database]
//! connection_string = "${FORMBRIDGE_DATABASE_URL}"
//!
//! [pipeline]
//! merge_strategy = "merge"
//!
//! [intake]
//! lookback_days = 30
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, DatabaseConfig, Environment, FormbridgeConfig, IntakeConfig, JobsConfig,
    KindPathsConfig, LoggingConfig, PipelineConfig, ReferenceConfig, XmlExportConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
