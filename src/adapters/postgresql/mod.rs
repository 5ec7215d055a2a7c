//! PostgreSQL integration
//!
//! [`PostgresClient`] owns the connection pool; [`PostgresStore`] implements
//! every storage trait the pipeline consumes on top of it.

pub mod adapter;
pub mod client;

pub use adapter::{PostgresStore, PostgresTables};
pub use client::PostgresClient;
