//! Storage configuration

use super::*;
use crate::storage::StorageKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit backend; inferred from the other fields when unset
    #[serde(default, rename = "storage")]
    pub kind: Option<StorageKind>,
    /// Snapshot file of the disk backend
    #[serde(default, alias = "store_path")]
    pub file_storage_path: Option<PathBuf>,
    /// Load the previous snapshot on start
    #[serde(default = "default_restore")]
    pub restore: bool,
    /// Connection URL of the database backend
    #[serde(default)]
    pub database_dsn: Option<String>,
    /// Connection pool settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: None,
            file_storage_path: None,
            restore: default_restore(),
            database_dsn: None,
            database: DatabaseConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Backend to build: explicit choice, else database when a DSN is set,
    /// else disk when a file was configured, else memory
    pub fn resolved_kind(&self) -> StorageKind {
        match self.kind {
            Some(kind) => kind,
            None if self.database_dsn.is_some() => StorageKind::Database,
            None if self.file_storage_path.is_some() => StorageKind::Disk,
            None => StorageKind::Memory,
        }
    }

    /// Snapshot file, falling back to the default location
    pub fn file_path(&self) -> PathBuf {
        self.file_storage_path
            .clone()
            .unwrap_or_else(default_file_storage_path)
    }

    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_storage_path = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Database pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}
