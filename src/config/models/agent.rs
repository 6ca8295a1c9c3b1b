//! Agent configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metrics agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Collector address, `host:port`
    #[serde(default = "default_address")]
    pub address: String,
    /// Seconds between samples
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Seconds between pushes
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    /// HMAC shared secret
    #[serde(default)]
    pub key: Option<String>,
    /// RSA public key (PEM) used to encrypt request bodies
    #[serde(default)]
    pub crypto_key: Option<PathBuf>,
    /// Maximum in-flight pushes
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            poll_interval: default_poll_interval(),
            report_interval: default_report_interval(),
            key: None,
            crypto_key: None,
            rate_limit: default_rate_limit(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl AgentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    /// Batch ingestion endpoint
    pub fn updates_url(&self) -> String {
        if self.address.starts_with("http://") || self.address.starts_with("https://") {
            format!("{}/updates/", self.address.trim_end_matches('/'))
        } else {
            format!("http://{}/updates/", self.address)
        }
    }
}
