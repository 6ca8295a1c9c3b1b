//! Live server helper
//!
//! Serves the full application on an ephemeral port from its own actix
//! system thread, so tests can drive it with a real HTTP client.

use actix_web::dev::ServerHandle;
use actix_web::web;
use pc_metrics::config::ServerConfig;
use pc_metrics::server::{AppState, HttpServer};
use pc_metrics::{Envelope, MetricsEngine};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::mpsc;

/// Running server plus the engine behind it
pub struct TestServer {
    pub address: String,
    pub engine: Arc<MetricsEngine>,
    handle: ServerHandle,
}

impl TestServer {
    pub fn start(config: ServerConfig, engine: Arc<MetricsEngine>, envelope: Envelope) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test listener");
        let address = listener
            .local_addr()
            .expect("Failed to read local address")
            .to_string();

        let state = web::Data::new(AppState::new(config, Arc::clone(&engine), envelope));
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            actix_web::rt::System::new().block_on(async move {
                let server =
                    actix_web::HttpServer::new(move || HttpServer::create_app(state.clone()))
                        .workers(1)
                        .disable_signals()
                        .listen(listener)
                        .expect("Failed to listen")
                        .run();
                tx.send(server.handle())
                    .expect("Failed to hand out server handle");
                let _ = server.await;
            });
        });

        let handle = rx.recv().expect("Test server did not start");
        Self {
            address,
            engine,
            handle,
        }
    }

    /// Agent-style address, `host:port`
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}
