//! Test database utilities
//!
//! Each call creates an isolated in-memory SQLite database with the schema
//! already migrated.

use pc_metrics::config::DatabaseConfig;
use pc_metrics::storage::DatabaseStorage;
use pc_metrics::storage::database::retry::RetrySchedule;
use std::sync::Arc;

/// In-memory SQLite database for tests
#[derive(Clone)]
pub struct TestDatabase {
    inner: Arc<DatabaseStorage>,
}

impl TestDatabase {
    /// Create and migrate a fresh database with an immediate retry schedule
    pub async fn new() -> Self {
        let storage = DatabaseStorage::connect("sqlite::memory:", &test_db_config())
            .await
            .expect("Failed to create in-memory test database")
            .with_retry(RetrySchedule::immediate(3));

        storage
            .migrate()
            .await
            .expect("Failed to run database migrations");

        Self {
            inner: Arc::new(storage),
        }
    }

    /// Get reference to the underlying storage
    pub fn storage(&self) -> &DatabaseStorage {
        &self.inner
    }

    /// Get Arc to the underlying storage
    pub fn storage_arc(&self) -> Arc<DatabaseStorage> {
        Arc::clone(&self.inner)
    }
}

/// A single connection keeps every query on the same in-memory database
pub fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        max_connections: 1,
        connection_timeout: 5,
    }
}
