//! Server builder and run_server function

use crate::config::{ServerArgs, ServerConfig};
use crate::server::server::HttpServer;
use crate::utils::error::{MetricsError, Result};
use crate::utils::logging::{LogFormat, init_logging};
use tracing::info;

/// Server builder for easier configuration
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<ServerConfig>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set configuration
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the HTTP server
    pub async fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| MetricsError::config("Configuration is required"))?;

        HttpServer::new(config).await
    }
}

/// Run the server from parsed command-line arguments
pub async fn run_server(args: ServerArgs) -> Result<()> {
    let config = ServerConfig::load(args).await?;

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(&config.log_level, format);

    let build = crate::BuildInfo::current();
    info!(
        "Starting metrics server {} ({}, built {})",
        build.version, build.git_hash, build.build_time
    );
    info!(
        "Storage: {}, snapshot every {:?}",
        config.storage.resolved_kind(),
        config.store_interval()
    );
    if let Some(subnet) = &config.trusted_subnet {
        info!("Trusted subnet: {}", subnet);
    }

    let server = ServerBuilder::new().with_config(config).build().await?;
    server.start().await
}
