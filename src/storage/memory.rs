//! Volatile backend: process-lifetime maps

use super::{MetricStorage, StorageKind};
use crate::core::metric::{MetricUpdate, MetricValue, MetricsSnapshot};
use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

/// In-memory metric store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<MetricsSnapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot
    pub fn with_snapshot(snapshot: MetricsSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.read().clone()
    }

    pub(crate) fn apply(&self, updates: &[MetricUpdate]) {
        let mut state = self.state.write();
        for update in updates {
            match update.value {
                MetricValue::Gauge(value) => {
                    state.gauge.insert(update.id.clone(), value);
                }
                MetricValue::Counter(total) => {
                    state.counter.insert(update.id.clone(), total);
                }
            }
        }
    }
}

#[async_trait]
impl MetricStorage for MemoryStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    async fn save_gauge(&self, id: &str, value: f64) -> Result<()> {
        self.state.write().gauge.insert(id.to_string(), value);
        Ok(())
    }

    async fn get_gauge(&self, id: &str) -> Result<Option<f64>> {
        Ok(self.state.read().gauge.get(id).copied())
    }

    async fn save_counter(&self, id: &str, total: i64) -> Result<()> {
        self.state.write().counter.insert(id.to_string(), total);
        Ok(())
    }

    async fn get_counter(&self, id: &str) -> Result<Option<i64>> {
        Ok(self.state.read().counter.get(id).copied())
    }

    async fn get_all(&self) -> Result<MetricsSnapshot> {
        Ok(self.snapshot())
    }

    async fn save_all(&self, updates: &[MetricUpdate]) -> Result<()> {
        self.apply(updates);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gauge_overwrite() {
        let storage = MemoryStorage::new();
        storage.save_gauge("x", 1.0).await.unwrap();
        storage.save_gauge("x", 2.0).await.unwrap();
        assert_eq!(storage.get_gauge("x").await.unwrap(), Some(2.0));
    }

    #[tokio::test]
    async fn test_missing_metric_is_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_gauge("nope").await.unwrap(), None);
        assert_eq!(storage.get_counter("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_gauge_and_counter_namespaces_are_separate() {
        let storage = MemoryStorage::new();
        storage.save_gauge("same", 1.5).await.unwrap();
        storage.save_counter("same", 7).await.unwrap();
        assert_eq!(storage.get_gauge("same").await.unwrap(), Some(1.5));
        assert_eq!(storage.get_counter("same").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_save_all_and_get_all() {
        let storage = MemoryStorage::new();
        let updates = vec![
            MetricUpdate::new("a", MetricValue::Counter(2)).unwrap(),
            MetricUpdate::new("b", MetricValue::Gauge(0.25)).unwrap(),
        ];
        storage.save_all(&updates).await.unwrap();

        let all = storage.get_all().await.unwrap();
        assert_eq!(all.counter.get("a"), Some(&2));
        assert_eq!(all.gauge.get("b"), Some(&0.25));
    }
}
