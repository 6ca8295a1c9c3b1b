//! Integration tests
//!
//! Each file exercises several components together: storage backends behind
//! the engine, the agent reporter against a live server, key files on disk.

pub mod agent_server_tests;
pub mod config_tests;
pub mod database_tests;
pub mod engine_tests;
pub mod envelope_tests;
