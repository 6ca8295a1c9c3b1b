//! HTTP server core implementation
//!
//! Owns the actix-web server, the snapshot scheduler and the shutdown
//! sequence: stop accepting requests, stop the scheduler, flush once more.

use crate::config::ServerConfig;
use crate::core::{MetricsEngine, SnapshotScheduler};
use crate::server::middleware::TrustedSubnet;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::create_storage;
use crate::transport::{Envelope, encryption};
use crate::utils::error::{MetricsError, Result};
use crate::utils::runtime::{shutdown_channel, shutdown_signal};
use actix_web::{
    App, HttpServer as ActixHttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// Seconds in-flight requests get to finish after a stop
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server: load keys, open storage, build the engine
    pub async fn new(config: ServerConfig) -> Result<Self> {
        info!("Creating HTTP server");

        let envelope = server_envelope(&config).await?;
        let storage = create_storage(&config.storage).await?;
        let engine = Arc::new(MetricsEngine::new(storage));

        Ok(Self::with_engine(config, engine, envelope))
    }

    /// Create a server over an existing engine
    pub fn with_engine(config: ServerConfig, engine: Arc<MetricsEngine>, envelope: Envelope) -> Self {
        let state = AppState::new(config.clone(), engine, envelope);
        Self { config, state }
    }

    /// Create the Actix-web application
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let subnet = state.config.trusted_subnet;

        App::new()
            .app_data(state)
            .wrap(TrustedSubnet::new(subnet))
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Server", "pc-metrics")))
            .wrap(TracingLogger::default())
            .configure(routes::configure_routes)
    }

    /// Start the HTTP server and run until SIGINT/SIGTERM
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Start the HTTP server and run until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let bind_addr = self.config.address.clone();
        info!("Starting HTTP server on {}", bind_addr);

        let engine = Arc::clone(&self.state.engine);
        let store_interval = self.config.store_interval();

        let state = web::Data::new(self.state);
        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .bind(&bind_addr)
            .map_err(|e| Self::format_bind_error(e, &bind_addr))?
            .disable_signals()
            .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
            .run();
        let handle = server.handle();

        let (stop_scheduler, scheduler_rx) = shutdown_channel();
        let scheduler =
            SnapshotScheduler::new(Arc::clone(engine.storage()), store_interval).spawn(scheduler_rx);

        info!("HTTP server listening on {}", bind_addr);

        tokio::pin!(server);
        tokio::pin!(shutdown);
        let served = tokio::select! {
            result = &mut server => Some(result),
            _ = &mut shutdown => None,
        };
        let served = match served {
            Some(result) => result,
            None => {
                info!("Stopping HTTP server");
                let (_, result) = tokio::join!(handle.stop(true), &mut server);
                result
            }
        };

        let _ = stop_scheduler.send(true);
        if let Err(e) = scheduler.await {
            warn!("Snapshot scheduler task failed: {}", e);
        }
        if let Err(e) = engine.flush().await {
            warn!("Final flush failed: {}", e);
        }

        served.map_err(|e| MetricsError::internal(format!("Server error: {}", e)))?;
        info!("HTTP server stopped");
        Ok(())
    }

    fn format_bind_error(e: std::io::Error, addr: &str) -> MetricsError {
        match e.kind() {
            std::io::ErrorKind::AddrInUse => {
                MetricsError::config(format!("Address {} is already in use", addr))
            }
            std::io::ErrorKind::PermissionDenied => {
                MetricsError::config(format!("Permission denied binding to {}", addr))
            }
            _ => MetricsError::config(format!("Failed to bind to {}: {}", addr, e)),
        }
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Receiver-side envelope: HMAC key, RSA private key, body limit
pub async fn server_envelope(config: &ServerConfig) -> Result<Envelope> {
    let mut envelope = Envelope::new().with_max_body(config.max_body_size);
    if let Some(key) = config.key.as_deref().filter(|k| !k.is_empty()) {
        envelope = envelope.with_key(key);
    }
    if let Some(path) = &config.crypto_key {
        envelope = envelope.with_private_key(encryption::load_private_key(path).await?);
        info!("Encrypted batches required (key {})", path.display());
    }
    Ok(envelope)
}
