//! Application state shared across HTTP handlers

use crate::config::ServerConfig;
use crate::core::MetricsEngine;
use crate::transport::Envelope;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Cloned into every worker; all fields are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (shared read-only)
    pub config: Arc<ServerConfig>,
    /// Accumulation engine over the configured storage backend
    pub engine: Arc<MetricsEngine>,
    /// Request body framing and integrity checks
    pub envelope: Arc<Envelope>,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: Arc<MetricsEngine>, envelope: Envelope) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            envelope: Arc::new(envelope),
        }
    }
}
