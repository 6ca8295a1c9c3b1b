//! Configuration management for the server and the agent
//!
//! Layering, lowest precedence first: built-in defaults, the optional config
//! file, environment variables, command-line flags.

pub mod args;
pub mod models;
pub mod validation;

pub use args::{AgentArgs, ServerArgs};
pub use models::*;
pub use validation::Validate;

use crate::utils::error::{MetricsError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Read a YAML or JSON configuration file, chosen by extension
pub async fn from_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MetricsError::Config(format!("Failed to read config file: {}", e)))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content)
            .map_err(|e| MetricsError::Config(format!("Failed to parse config: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| MetricsError::Config(format!("Failed to parse config: {}", e)))?
    };

    debug!("Configuration file parsed successfully");
    Ok(config)
}

impl ServerConfig {
    /// Build the effective server configuration from parsed arguments
    pub async fn load(args: ServerArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => from_file(path).await?,
            None => Self::default(),
        };
        args.apply(&mut config);

        config
            .validate()
            .map_err(|e| MetricsError::Config(format!("Server config error: {}", e)))?;
        Ok(config)
    }
}

impl AgentConfig {
    /// Build the effective agent configuration from parsed arguments
    pub async fn load(args: AgentArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => from_file(path).await?,
            None => Self::default(),
        };
        args.apply(&mut config);

        config
            .validate()
            .map_err(|e| MetricsError::Config(format!("Agent config error: {}", e)))?;
        Ok(config)
    }
}
