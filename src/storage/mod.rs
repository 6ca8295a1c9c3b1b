//! Storage layer for the metrics server
//!
//! Every backend satisfies the same `MetricStorage` contract. Backends store
//! absolute values only: counter summation happens in the accumulation engine.

/// Relational backend
pub mod database;
/// JSON-file-backed backend
pub mod disk;
/// Volatile backend
pub mod memory;

use crate::config::models::storage::StorageConfig;
use crate::core::metric::{MetricUpdate, MetricsSnapshot};
use crate::utils::error::{MetricsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub use database::DatabaseStorage;
pub use disk::DiskStorage;
pub use memory::MemoryStorage;

/// Storage backend selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Process-lifetime maps
    #[default]
    Memory,
    /// Maps flushed to a JSON file
    Disk,
    /// Append-only SQL tables
    Database,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Memory => "memory",
            StorageKind::Disk => "disk",
            StorageKind::Database => "database",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "disk" | "file" => Ok(StorageKind::Disk),
            "database" | "db" => Ok(StorageKind::Database),
            other => Err(MetricsError::config(format!(
                "unknown storage backend: {other}"
            ))),
        }
    }
}

/// Read/write contract shared by all backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricStorage: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> StorageKind;

    /// Overwrite the current value of a gauge
    async fn save_gauge(&self, id: &str, value: f64) -> Result<()>;

    /// Current gauge value, `None` if never written
    async fn get_gauge(&self, id: &str) -> Result<Option<f64>>;

    /// Store the new absolute total of a counter
    async fn save_counter(&self, id: &str, total: i64) -> Result<()>;

    /// Current counter total, `None` if never written
    async fn get_counter(&self, id: &str) -> Result<Option<i64>>;

    /// Full snapshot of current values
    async fn get_all(&self) -> Result<MetricsSnapshot>;

    /// Bulk import of absolute values
    async fn save_all(&self, updates: &[MetricUpdate]) -> Result<()>;

    /// Liveness check
    async fn ping(&self) -> Result<()>;

    /// Persist the current state to the durable medium, if any
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the backend selected by the configuration
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn MetricStorage>> {
    let kind = config.resolved_kind();
    info!("Storage is {}", kind);

    let storage: Arc<dyn MetricStorage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::Disk => {
            Arc::new(DiskStorage::open(config.file_path(), config.restore).await?)
        }
        StorageKind::Database => {
            let dsn = config.database_dsn.as_deref().ok_or_else(|| {
                MetricsError::config("database storage requires a database DSN")
            })?;
            let storage = DatabaseStorage::connect(dsn, &config.database).await?;
            storage.migrate().await?;
            Arc::new(storage)
        }
    };

    Ok(storage)
}
