//! Accumulation engine
//!
//! Sits on top of a storage backend and turns counter deltas into absolute
//! totals. Writers of the same counter id are serialized with a per-id lock;
//! gauges are written straight through.

use crate::core::metric::{Metric, MetricKind, MetricUpdate, MetricValue, MetricsSnapshot};
use crate::storage::MetricStorage;
use crate::utils::error::{MetricsError, Result};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Counter/gauge semantics over a storage backend
pub struct MetricsEngine {
    storage: Arc<dyn MetricStorage>,
    counter_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for MetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEngine")
            .field("storage", &self.storage.kind())
            .field("locked_ids", &self.counter_locks.len())
            .finish()
    }
}

impl MetricsEngine {
    pub fn new(storage: Arc<dyn MetricStorage>) -> Self {
        Self {
            storage,
            counter_locks: DashMap::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn MetricStorage> {
        &self.storage
    }

    async fn lock_counter(&self, id: &str) -> CounterGuard<'_> {
        let lock = self
            .counter_locks
            .entry(id.to_string())
            .or_default()
            .clone();
        CounterGuard {
            locks: &self.counter_locks,
            id: id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Overwrite a gauge
    pub async fn save_gauge(&self, id: &str, value: f64) -> Result<()> {
        let update = MetricUpdate::new(id, MetricValue::Gauge(value))?;
        self.storage.save_gauge(&update.id, value).await
    }

    pub async fn get_gauge(&self, id: &str) -> Result<f64> {
        self.storage
            .get_gauge(id)
            .await?
            .ok_or_else(|| MetricsError::not_found(format!("gauge {id}")))
    }

    /// Add `delta` to a counter and return the new total
    pub async fn save_counter(&self, id: &str, delta: i64) -> Result<i64> {
        MetricUpdate::new(id, MetricValue::Counter(delta))?;

        let _guard = self.lock_counter(id).await;
        let current = self.storage.get_counter(id).await?.unwrap_or(0);
        let total = add_delta(id, current, delta)?;
        self.storage.save_counter(id, total).await?;

        debug!("counter {} = {} ({:+})", id, total, delta);
        Ok(total)
    }

    pub async fn get_counter(&self, id: &str) -> Result<i64> {
        self.storage
            .get_counter(id)
            .await?
            .ok_or_else(|| MetricsError::not_found(format!("counter {id}")))
    }

    /// Current value of a metric of either kind
    pub async fn get(&self, kind: MetricKind, id: &str) -> Result<MetricValue> {
        match kind {
            MetricKind::Gauge => self.get_gauge(id).await.map(MetricValue::Gauge),
            MetricKind::Counter => self.get_counter(id).await.map(MetricValue::Counter),
        }
    }

    /// Apply one update and return the metric's stored value afterwards
    pub async fn apply(&self, update: &MetricUpdate) -> Result<MetricValue> {
        match update.value {
            MetricValue::Gauge(value) => {
                self.save_gauge(&update.id, value).await?;
                Ok(MetricValue::Gauge(value))
            }
            MetricValue::Counter(delta) => self
                .save_counter(&update.id, delta)
                .await
                .map(MetricValue::Counter),
        }
    }

    /// Ingest a batch of wire records.
    ///
    /// The whole batch is validated before anything is written. Counter deltas
    /// are summed per id and gauges keep the last value per id, then the
    /// resulting absolute values go to storage in one `save_all` call.
    pub async fn save_batch(&self, metrics: &[Metric]) -> Result<()> {
        let updates = metrics
            .iter()
            .map(Metric::validate)
            .collect::<Result<Vec<_>>>()?;
        if updates.is_empty() {
            return Ok(());
        }

        let mut gauges: BTreeMap<String, f64> = BTreeMap::new();
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        for update in updates {
            match update.value {
                MetricValue::Gauge(value) => {
                    gauges.insert(update.id, value);
                }
                MetricValue::Counter(delta) => {
                    let sum = deltas.entry(update.id).or_insert(0);
                    *sum = sum.checked_add(delta).ok_or_else(|| {
                        MetricsError::validation("counter delta overflow in batch")
                    })?;
                }
            }
        }

        // BTreeMap order gives every writer the same lock order
        let mut guards = Vec::with_capacity(deltas.len());
        for id in deltas.keys() {
            guards.push(self.lock_counter(id).await);
        }

        let mut absolute = Vec::with_capacity(gauges.len() + deltas.len());
        for (id, value) in gauges {
            absolute.push(MetricUpdate {
                id,
                value: MetricValue::Gauge(value),
            });
        }
        for (id, delta) in deltas {
            let current = self.storage.get_counter(&id).await?.unwrap_or(0);
            let total = add_delta(&id, current, delta)?;
            absolute.push(MetricUpdate {
                id,
                value: MetricValue::Counter(total),
            });
        }

        self.storage.save_all(&absolute).await?;
        debug!("Saved batch of {} metrics", absolute.len());
        drop(guards);
        Ok(())
    }

    pub async fn get_all(&self) -> Result<MetricsSnapshot> {
        self.storage.get_all().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.storage.ping().await
    }

    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await
    }
}

/// Holds one counter id; drops the id's lock entry once nobody else wants it
struct CounterGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CounterGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold a clone, so a count of one means only the map is left
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn add_delta(id: &str, current: i64, delta: i64) -> Result<i64> {
    current
        .checked_add(delta)
        .ok_or_else(|| MetricsError::validation(format!("counter {id} would overflow")))
}
