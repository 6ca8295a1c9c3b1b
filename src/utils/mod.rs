//! Utility modules shared by the server and the agent
//!
//! - **error**: crate-wide error type and HTTP mapping
//! - **logging**: tracing subscriber setup
//! - **net**: address and subnet helpers
//! - **runtime**: signal handling and cancellation

pub mod error;
pub mod logging;
pub mod net;
pub mod runtime;

pub use error::{MetricsError, Result};
