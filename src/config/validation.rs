//! Configuration validation

use crate::config::models::*;
use crate::storage::StorageKind;
use tracing::debug;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating server configuration");

        if self.address.trim().is_empty() {
            return Err("Server address cannot be empty".to_string());
        }

        if self.max_body_size == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        if self.key.is_some() && self.crypto_key.is_some() {
            return Err("key and crypto_key are mutually exclusive".to_string());
        }

        if matches!(self.key.as_deref(), Some("")) {
            return Err("key cannot be empty".to_string());
        }

        self.storage.validate()
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        match self.resolved_kind() {
            StorageKind::Database => match self.database_dsn.as_deref() {
                None | Some("") => {
                    Err("database storage requires database_dsn".to_string())
                }
                Some(dsn) if !dsn.contains("://") && !dsn.starts_with("sqlite:") => Err(format!(
                    "database_dsn must be a URL (postgres://... or sqlite://...), got '{}'",
                    dsn
                )),
                Some(_) => Ok(()),
            },
            StorageKind::Disk => {
                if self.file_path().as_os_str().is_empty() {
                    return Err("disk storage requires file_storage_path".to_string());
                }
                Ok(())
            }
            StorageKind::Memory => Ok(()),
        }?;

        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for AgentConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating agent configuration");

        if self.address.trim().is_empty() {
            return Err("Collector address cannot be empty".to_string());
        }

        if self.poll_interval == 0 {
            return Err("poll_interval must be greater than 0".to_string());
        }

        if self.report_interval == 0 {
            return Err("report_interval must be greater than 0".to_string());
        }

        if self.rate_limit == 0 {
            return Err("rate_limit must be at least 1".to_string());
        }

        if self.key.is_some() && self.crypto_key.is_some() {
            return Err("key and crypto_key are mutually exclusive".to_string());
        }

        if matches!(self.key.as_deref(), Some("")) {
            return Err("key cannot be empty".to_string());
        }

        Ok(())
    }
}
