//! Common test utilities for pc-metrics

pub mod database;
pub mod fixtures;
pub mod server;

pub use database::TestDatabase;
pub use server::TestServer;
