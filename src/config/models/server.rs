//! Server configuration

use super::*;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metrics server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    #[serde(default = "default_address")]
    pub address: String,
    /// Snapshot interval in seconds
    #[serde(default = "default_store_interval")]
    pub store_interval: u64,
    /// Storage backend settings
    #[serde(flatten)]
    pub storage: StorageConfig,
    /// HMAC shared secret
    #[serde(default)]
    pub key: Option<String>,
    /// RSA private key (PEM) used to decrypt request bodies
    #[serde(default)]
    pub crypto_key: Option<PathBuf>,
    /// Only accept requests from this subnet
    #[serde(default)]
    pub trusted_subnet: Option<IpNet>,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            store_interval: default_store_interval(),
            storage: StorageConfig::default(),
            key: None,
            crypto_key: None,
            trusted_subnet: None,
            max_body_size: default_max_body_size(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Snapshot period; zero means every second
    pub fn store_interval(&self) -> Duration {
        Duration::from_secs(self.store_interval.max(1))
    }
}
