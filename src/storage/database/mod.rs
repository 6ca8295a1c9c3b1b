//! Relational backend using SeaORM
//!
//! Every write is an INSERT of the new absolute value; the current value of a
//! metric is its newest row.

/// Table entities
pub mod entities;
/// Schema migrations
pub mod migration;
/// Conflict retry
pub mod retry;

use super::{MetricStorage, StorageKind};
use crate::config::models::storage::DatabaseConfig;
use crate::core::metric::{MetricUpdate, MetricValue, MetricsSnapshot};
use crate::utils::error::{MetricsError, Result};
use async_trait::async_trait;
use entities::{counter, gauge};
use migration::Migrator;
use retry::{RetrySchedule, is_unique_violation, retry_on_conflict};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound of a liveness round trip
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// SQL-backed metric store
#[derive(Debug)]
pub struct DatabaseStorage {
    db: DatabaseConnection,
    retry: RetrySchedule,
}

impl DatabaseStorage {
    /// Connect to the database at `dsn`
    pub async fn connect(dsn: &str, config: &DatabaseConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(dsn.to_string());
        opt.connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        if is_in_memory_sqlite(dsn) {
            // each pooled connection would get its own empty database
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(config.max_connections)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(3600));
        }

        let db = Database::connect(opt).await.map_err(MetricsError::Database)?;
        info!("Database connection established ({:?})", db.get_database_backend());

        Ok(Self::from_connection(db))
    }

    /// Wrap an existing connection
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self {
            db,
            retry: RetrySchedule::default(),
        }
    }

    /// Replace the conflict backoff schedule
    pub fn with_retry(mut self, retry: RetrySchedule) -> Self {
        self.retry = retry;
        self
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            MetricsError::Database(e)
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Insert all updates in one transaction.
    ///
    /// Each insert runs in its own savepoint so a unique violation can be
    /// retried without losing earlier rows. Any other failure rolls back
    /// everything.
    async fn write(&self, updates: &[MetricUpdate]) -> Result<()> {
        let txn = self.db.begin().await?;

        for update in updates {
            let txn_ref = &txn;
            let result = retry_on_conflict(&self.retry, is_unique_violation, move || async move {
                let savepoint = txn_ref.begin().await?;
                match insert_row(&savepoint, update).await {
                    Ok(()) => savepoint.commit().await,
                    Err(e) => {
                        savepoint.rollback().await?;
                        Err(e)
                    }
                }
            })
            .await;

            if let Err(e) = result {
                warn!("Rolling back write of {} metrics: {}", updates.len(), e);
                txn.rollback().await?;
                return Err(e);
            }
        }

        txn.commit().await?;
        debug!("Inserted {} metric rows", updates.len());
        Ok(())
    }
}

/// Insert one row stamped with the current time
async fn insert_row<C: ConnectionTrait>(
    conn: &C,
    update: &MetricUpdate,
) -> std::result::Result<(), DbErr> {
    let recorded_at: DateTimeWithTimeZone = chrono::Utc::now().into();

    match update.value {
        MetricValue::Gauge(value) => {
            let row = gauge::ActiveModel {
                name: Set(update.id.clone()),
                value: Set(value),
                recorded_at: Set(recorded_at),
                ..Default::default()
            };
            gauge::Entity::insert(row).exec(conn).await?;
        }
        MetricValue::Counter(total) => {
            let row = counter::ActiveModel {
                name: Set(update.id.clone()),
                delta: Set(total),
                recorded_at: Set(recorded_at),
                ..Default::default()
            };
            counter::Entity::insert(row).exec(conn).await?;
        }
    }
    Ok(())
}

fn is_in_memory_sqlite(dsn: &str) -> bool {
    dsn.starts_with("sqlite") && dsn.contains(":memory:")
}

#[async_trait]
impl MetricStorage for DatabaseStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Database
    }

    async fn save_gauge(&self, id: &str, value: f64) -> Result<()> {
        let update = MetricUpdate::new(id, MetricValue::Gauge(value))?;
        self.write(std::slice::from_ref(&update)).await
    }

    async fn get_gauge(&self, id: &str) -> Result<Option<f64>> {
        let row = gauge::Entity::find()
            .filter(gauge::Column::Name.eq(id))
            .order_by_desc(gauge::Column::RecordedAt)
            .order_by_desc(gauge::Column::Id)
            .one(&self.db)
            .await?;
        Ok(row.map(|row| row.value))
    }

    async fn save_counter(&self, id: &str, total: i64) -> Result<()> {
        let update = MetricUpdate::new(id, MetricValue::Counter(total))?;
        self.write(std::slice::from_ref(&update)).await
    }

    async fn get_counter(&self, id: &str) -> Result<Option<i64>> {
        let row = counter::Entity::find()
            .filter(counter::Column::Name.eq(id))
            .order_by_desc(counter::Column::RecordedAt)
            .order_by_desc(counter::Column::Id)
            .one(&self.db)
            .await?;
        Ok(row.map(|row| row.delta))
    }

    async fn get_all(&self) -> Result<MetricsSnapshot> {
        let mut snapshot = MetricsSnapshot::default();

        let latest_gauges: Vec<i32> = gauge::Entity::find()
            .select_only()
            .column_as(Expr::col(gauge::Column::Id).max(), "latest_id")
            .group_by(gauge::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await?;
        if !latest_gauges.is_empty() {
            for row in gauge::Entity::find()
                .filter(gauge::Column::Id.is_in(latest_gauges))
                .all(&self.db)
                .await?
            {
                snapshot.gauge.insert(row.name, row.value);
            }
        }

        let latest_counters: Vec<i32> = counter::Entity::find()
            .select_only()
            .column_as(Expr::col(counter::Column::Id).max(), "latest_id")
            .group_by(counter::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await?;
        if !latest_counters.is_empty() {
            for row in counter::Entity::find()
                .filter(counter::Column::Id.is_in(latest_counters))
                .all(&self.db)
                .await?
            {
                snapshot.counter.insert(row.name, row.delta);
            }
        }

        Ok(snapshot)
    }

    async fn save_all(&self, updates: &[MetricUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        self.write(updates).await
    }

    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(PING_TIMEOUT, self.db.ping())
            .await
            .map_err(|_| MetricsError::timeout("database ping timed out"))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sqlite_storage() -> DatabaseStorage {
        let storage = DatabaseStorage::connect("sqlite::memory:", &DatabaseConfig::default())
            .await
            .unwrap();
        storage.migrate().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_latest_row_wins() {
        let storage = sqlite_storage().await;
        storage.save_gauge("cpu", 12.5).await.unwrap();
        storage.save_gauge("cpu", 9.0).await.unwrap();
        assert_eq!(storage.get_gauge("cpu").await.unwrap(), Some(9.0));

        storage.save_counter("hits", 5).await.unwrap();
        storage.save_counter("hits", 8).await.unwrap();
        assert_eq!(storage.get_counter("hits").await.unwrap(), Some(8));

        // rows are appended, never updated
        let rows = gauge::Entity::find().all(storage.connection()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_metric_is_none() {
        let storage = sqlite_storage().await;
        assert_eq!(storage.get_gauge("nope").await.unwrap(), None);
        assert_eq!(storage.get_counter("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_all_returns_latest_per_name() {
        let storage = sqlite_storage().await;
        let updates = vec![
            MetricUpdate::new("a", MetricValue::Counter(2)).unwrap(),
            MetricUpdate::new("b", MetricValue::Counter(3)).unwrap(),
            MetricUpdate::new("g", MetricValue::Gauge(1.0)).unwrap(),
        ];
        storage.save_all(&updates).await.unwrap();
        storage.save_counter("a", 10).await.unwrap();
        storage.save_gauge("g", 2.0).await.unwrap();

        let all = storage.get_all().await.unwrap();
        assert_eq!(all.counter.get("a"), Some(&10));
        assert_eq!(all.counter.get("b"), Some(&3));
        assert_eq!(all.gauge.get("g"), Some(&2.0));
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_get_all_empty() {
        let storage = sqlite_storage().await;
        assert!(storage.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_row_is_unique_violation() {
        let storage = sqlite_storage().await;
        let recorded_at: DateTimeWithTimeZone = chrono::Utc::now().into();
        let row = || gauge::ActiveModel {
            name: Set("dup".to_string()),
            value: Set(1.0),
            recorded_at: Set(recorded_at),
            ..Default::default()
        };

        gauge::Entity::insert(row())
            .exec(storage.connection())
            .await
            .unwrap();
        let err = gauge::Entity::insert(row())
            .exec(storage.connection())
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    fn gauge_then_counter() -> Vec<MetricUpdate> {
        vec![
            MetricUpdate::new("g", MetricValue::Gauge(1.5)).unwrap(),
            MetricUpdate::new("c", MetricValue::Counter(4)).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_exhausted_conflicts_roll_back_whole_batch() {
        let storage = sqlite_storage().await.with_retry(RetrySchedule::immediate(2));
        storage.save_counter("c", 1).await.unwrap();
        storage
            .connection()
            .execute_unprepared("CREATE UNIQUE INDEX idx_counter_name_only ON counter (name)")
            .await
            .unwrap();

        let err = storage.save_all(&gauge_then_counter()).await.unwrap_err();
        assert!(matches!(err, MetricsError::MaxRetriesExceeded { attempts: 3 }));
        assert_eq!(storage.get_gauge("g").await.unwrap(), None);
        assert_eq!(storage.get_counter("c").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_other_errors_roll_back_without_retry() {
        let storage = sqlite_storage().await.with_retry(RetrySchedule::immediate(2));
        storage
            .connection()
            .execute_unprepared("DROP TABLE counter")
            .await
            .unwrap();

        let err = storage.save_all(&gauge_then_counter()).await.unwrap_err();
        assert!(matches!(err, MetricsError::Database(_)));
        assert_eq!(storage.get_gauge("g").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ping() {
        let storage = sqlite_storage().await;
        assert!(storage.ping().await.is_ok());
    }
}
