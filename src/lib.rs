// Formbridge - Approval Workflow to ERP Batch Integration
// Copyright (c) 2025 Formbridge Contributors
// Licensed under the MIT License

//! # Formbridge - Approval Workflow to ERP Batch Integration
//!
//! Formbridge moves approved requisitions out of a business-process workflow
//! store and into the line-item tables an ERP system imports from.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Intake**: enqueueing newly approved requisitions exactly once
//! - **Transforming** order, sample and return requisitions into canonical
//!   export lines (free goods, add-ons, tax-inclusive pricing, debit/credit)
//! - **Loading** rows through a staging table and a set-based merge, with
//!   per-row isolation when the bulk insert is rejected
//! - **Reference data**: loading customer, material, price and sales master
//!   XML files into their tables
//! - **XML export** of pending lines per receiving party
//!
//! ## Architecture
//!
//! Formbridge follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (intake, transform, load, sync, reference, export, jobs)
//! - [`adapters`] - Storage integrations (PostgreSQL, in-memory, XML files)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formbridge::cli::context::AppContext;
//! use formbridge::config::load_config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("formbridge.toml")?;
//!     let ctx = AppContext::connect(config)?;
//!
//!     let result = ctx.orchestrator(false)?.run().await;
//!     println!("{}", result.message);
//!
//!     let summary = ctx.exporter().execute_export().await;
//!     println!("Wrote {} files", summary.file_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`] with a
//! [`domain::FormbridgeError`]. Pipeline steps do not propagate their
//! errors; they record them on the run result and the next step runs.
//!
//! ## Logging
//!
//! Formbridge uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! tracing::info!(requisitions = 3, "Enqueued approved requisitions");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
