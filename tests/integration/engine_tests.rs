//! Accumulation engine over every storage backend

#[cfg(test)]
mod tests {
    use crate::common::TestDatabase;
    use crate::common::fixtures::mixed_batch;
    use pc_metrics::storage::{DiskStorage, MemoryStorage, MetricStorage};
    use pc_metrics::{MetricsEngine, MetricsError};
    use std::sync::Arc;

    async fn backends(dir: &std::path::Path) -> Vec<Arc<dyn MetricStorage>> {
        let disk = DiskStorage::open(dir.join("metrics.json"), false)
            .await
            .unwrap();
        vec![
            Arc::new(MemoryStorage::new()),
            Arc::new(disk),
            TestDatabase::new().await.storage_arc(),
        ]
    }

    #[tokio::test]
    async fn test_counter_and_gauge_semantics_match_across_backends() {
        let dir = tempfile::tempdir().unwrap();
        for storage in backends(dir.path()).await {
            let kind = storage.kind();
            let engine = MetricsEngine::new(storage);

            assert_eq!(engine.save_counter("hits", 5).await.unwrap(), 5, "{kind}");
            assert_eq!(engine.save_counter("hits", 3).await.unwrap(), 8, "{kind}");
            assert_eq!(engine.save_counter("hits", -10).await.unwrap(), -2, "{kind}");

            engine.save_gauge("temp", 21.5).await.unwrap();
            engine.save_gauge("temp", -4.25).await.unwrap();
            assert_eq!(engine.get_gauge("temp").await.unwrap(), -4.25, "{kind}");

            let err = engine.get_counter("missing").await.unwrap_err();
            assert!(matches!(err, MetricsError::NotFound(_)), "{kind}");
        }
    }

    #[tokio::test]
    async fn test_batch_is_applied_identically_across_backends() {
        let dir = tempfile::tempdir().unwrap();
        for storage in backends(dir.path()).await {
            let kind = storage.kind();
            let engine = MetricsEngine::new(storage);
            engine.save_counter("PollCount", 10).await.unwrap();

            engine.save_batch(&mixed_batch()).await.unwrap();

            let snapshot = engine.get_all().await.unwrap();
            assert_eq!(snapshot.counter["PollCount"], 15, "{kind}");
            assert_eq!(snapshot.gauge["Alloc"], 2048.0, "{kind}");
            assert_eq!(snapshot.len(), 2, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_counter_writers_lose_nothing() {
        let db = TestDatabase::new().await;
        let engine = Arc::new(MetricsEngine::new(db.storage_arc()));

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                engine.save_counter("requests", 1).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(engine.get_counter("requests").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_disk_backend_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/metrics.json");

        let engine = MetricsEngine::new(Arc::new(DiskStorage::open(&path, true).await.unwrap()));
        engine.save_counter("PollCount", 4).await.unwrap();
        engine.save_gauge("Alloc", 99.5).await.unwrap();
        engine.flush().await.unwrap();
        drop(engine);

        let restored = MetricsEngine::new(Arc::new(DiskStorage::open(&path, true).await.unwrap()));
        assert_eq!(restored.save_counter("PollCount", 1).await.unwrap(), 5);
        assert_eq!(restored.get_gauge("Alloc").await.unwrap(), 99.5);

        let fresh = MetricsEngine::new(Arc::new(DiskStorage::open(&path, false).await.unwrap()));
        assert!(fresh.get_all().await.unwrap().is_empty());
    }
}
