//! # pc-metrics
//!
//! Host metrics agent and collector server.
//!
//! The agent samples memory and CPU statistics on one timer and pushes them
//! on another. The server accumulates counters, overwrites gauges and keeps
//! the result in memory, in a JSON snapshot file or in a SQL database.
//!
//! ## Features
//!
//! - **Batch ingestion**: gzip bodies, optional HMAC-SHA256 signature or RSA encryption
//! - **Pluggable storage**: memory, atomic JSON file, Postgres/SQLite via sea-orm
//! - **Per-id counter locking**: concurrent writers never lose an increment
//! - **Retry on conflict**: unique violations are retried on a fixed schedule
//!
//! ## Embedding the server
//!
//! ```rust,no_run
//! use pc_metrics::config::ServerConfig;
//! use pc_metrics::server::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ServerBuilder::new()
//!         .with_config(ServerConfig::default())
//!         .build()
//!         .await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod agent;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod transport;
pub mod utils;

// Re-export main types
pub use config::{AgentConfig, ServerConfig};
pub use core::{Metric, MetricKind, MetricsEngine, MetricsSnapshot};
pub use storage::{MetricStorage, StorageKind};
pub use transport::Envelope;
pub use utils::error::{MetricsError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build information embedded by `build.rs`
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Unix timestamp of the build
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_time: env!("BUILD_TIME"),
            git_hash: env!("GIT_HASH"),
            rust_version: env!("RUST_VERSION"),
        }
    }
}
