//! Relational backend against in-memory SQLite

#[cfg(test)]
mod tests {
    use crate::common::TestDatabase;
    use pc_metrics::core::{MetricUpdate, MetricValue};
    use pc_metrics::storage::{MetricStorage, StorageKind};

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = TestDatabase::new().await;
        db.storage().migrate().await.unwrap();
        db.storage().ping().await.unwrap();
        assert_eq!(db.storage().kind(), StorageKind::Database);
    }

    #[tokio::test]
    async fn test_latest_row_wins() {
        let db = TestDatabase::new().await;
        let storage = db.storage();

        storage.save_gauge("Alloc", 1.0).await.unwrap();
        storage.save_gauge("Alloc", 2.0).await.unwrap();
        storage.save_counter("PollCount", 7).await.unwrap();
        storage.save_counter("PollCount", 9).await.unwrap();

        assert_eq!(storage.get_gauge("Alloc").await.unwrap(), Some(2.0));
        assert_eq!(storage.get_counter("PollCount").await.unwrap(), Some(9));
        assert_eq!(storage.get_gauge("PollCount").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_same_id_in_both_kinds_is_kept_apart() {
        let db = TestDatabase::new().await;
        let storage = db.storage();

        storage.save_gauge("shared", 0.5).await.unwrap();
        storage.save_counter("shared", 3).await.unwrap();

        let snapshot = storage.get_all().await.unwrap();
        assert_eq!(snapshot.gauge["shared"], 0.5);
        assert_eq!(snapshot.counter["shared"], 3);
    }

    #[tokio::test]
    async fn test_save_all_writes_every_record() {
        let db = TestDatabase::new().await;
        let storage = db.storage();

        let updates = vec![
            MetricUpdate::new("a", MetricValue::Counter(2)).unwrap(),
            MetricUpdate::new("b", MetricValue::Counter(3)).unwrap(),
            MetricUpdate::new("c", MetricValue::Gauge(1.5)).unwrap(),
        ];
        storage.save_all(&updates).await.unwrap();
        storage.save_all(&[]).await.unwrap();

        let snapshot = storage.get_all().await.unwrap();
        assert_eq!(snapshot.counter.len(), 2);
        assert_eq!(snapshot.counter["b"], 3);
        assert_eq!(snapshot.gauge["c"], 1.5);
    }
}
