//! HTTP server implementation
//!
//! This module provides the collector's HTTP server and routing.

pub mod builder;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;


pub use builder::{ServerBuilder, run_server};
pub use server::HttpServer;
pub use state::AppState;
