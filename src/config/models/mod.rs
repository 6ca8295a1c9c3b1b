//! Configuration data models
//!
//! This module defines the configuration structures of both binaries.

#![allow(missing_docs)]

pub mod agent;
pub mod server;
pub mod storage;

pub use agent::*;
pub use server::*;
pub use storage::*;

/// Default collector address
pub fn default_address() -> String {
    "localhost:8080".to_string()
}

/// Default log level
pub fn default_log_level() -> String {
    "info".to_string()
}

/// Default snapshot interval in seconds
pub fn default_store_interval() -> u64 {
    300
}

/// Default snapshot file
pub fn default_file_storage_path() -> std::path::PathBuf {
    std::path::PathBuf::from("./tmp/metrics-db.json")
}

/// Default restore-on-start flag
pub fn default_restore() -> bool {
    true
}

/// Default maximum request body size in bytes
pub fn default_max_body_size() -> usize {
    64 * 1024 * 1024 // 64MB
}

/// Default agent poll interval in seconds
pub fn default_poll_interval() -> u64 {
    2
}

/// Default agent report interval in seconds
pub fn default_report_interval() -> u64 {
    10
}

/// Default number of in-flight pushes
pub fn default_rate_limit() -> usize {
    1
}

/// Default maximum database connections
pub fn default_max_connections() -> u32 {
    10
}

/// Default database connection timeout in seconds
pub fn default_connection_timeout() -> u64 {
    5
}
