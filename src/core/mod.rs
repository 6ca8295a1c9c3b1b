//! Core metrics logic
//!
//! - **metric**: wire records, validated updates and snapshots
//! - **engine**: counter accumulation and gauge overwrite over a storage backend
//! - **snapshot**: periodic flush of the backend

pub mod engine;
pub mod metric;
pub mod snapshot;

pub use engine::MetricsEngine;
pub use metric::{Metric, MetricKind, MetricUpdate, MetricValue, MetricsSnapshot};
pub use snapshot::SnapshotScheduler;
