//! Host sampling and the producer-side snapshot
//!
//! The poll loop refreshes gauges and bumps `PollCount`; the report loop
//! takes what has accumulated since the last acknowledged push.

use crate::core::Metric;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use sysinfo::System;

/// Counter incremented once per poll
pub const POLL_COUNT: &str = "PollCount";

/// Source of gauge readings
#[cfg_attr(test, mockall::automock)]
pub trait RuntimeSampler: Send {
    /// Take one reading of every gauge
    fn sample(&mut self) -> BTreeMap<String, f64>;
}

/// Host memory and CPU statistics via `sysinfo`
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        // CPU usage is a delta between two refreshes
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeSampler for SystemSampler {
    fn sample(&mut self) -> BTreeMap<String, f64> {
        self.system.refresh_memory();
        self.system.refresh_cpu_usage();

        let mut gauges = BTreeMap::new();
        let memory = [
            ("TotalMemory", self.system.total_memory()),
            ("FreeMemory", self.system.free_memory()),
            ("UsedMemory", self.system.used_memory()),
            ("AvailableMemory", self.system.available_memory()),
            ("TotalSwap", self.system.total_swap()),
            ("FreeSwap", self.system.free_swap()),
            ("UsedSwap", self.system.used_swap()),
        ];
        for (name, bytes) in memory {
            gauges.insert(name.to_string(), bytes as f64);
        }

        gauges.insert(
            "CPUutilization".to_string(),
            f64::from(self.system.global_cpu_usage()),
        );
        for (i, cpu) in self.system.cpus().iter().enumerate() {
            gauges.insert(
                format!("CPUutilization{}", i + 1),
                f64::from(cpu.cpu_usage()),
            );
        }

        gauges.insert("RandomValue".to_string(), rand::random::<f64>());
        gauges
    }
}

/// One push worth of metrics of a single kind
#[derive(Debug, Clone, PartialEq)]
pub enum MetricBatch {
    Gauges(BTreeMap<String, f64>),
    /// Deltas since the last acknowledged push
    Counters(BTreeMap<String, i64>),
}

impl MetricBatch {
    pub fn len(&self) -> usize {
        match self {
            MetricBatch::Gauges(gauges) => gauges.len(),
            MetricBatch::Counters(counters) => counters.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wire records for the batch endpoint
    pub fn to_metrics(&self) -> Vec<Metric> {
        match self {
            MetricBatch::Gauges(gauges) => gauges
                .iter()
                .map(|(id, value)| Metric::gauge(id.clone(), *value))
                .collect(),
            MetricBatch::Counters(counters) => counters
                .iter()
                .map(|(id, delta)| Metric::counter(id.clone(), *delta))
                .collect(),
        }
    }
}

#[derive(Default)]
struct CollectorState {
    gauges: BTreeMap<String, f64>,
    pending: BTreeMap<String, i64>,
}

/// Latest gauges plus counter deltas not yet delivered
pub struct MetricsCollector {
    sampler: Mutex<Box<dyn RuntimeSampler>>,
    state: Mutex<CollectorState>,
}

impl MetricsCollector {
    pub fn new(sampler: impl RuntimeSampler + 'static) -> Self {
        Self {
            sampler: Mutex::new(Box::new(sampler)),
            state: Mutex::new(CollectorState::default()),
        }
    }

    /// Refresh gauges and count the poll
    pub fn poll(&self) {
        let gauges = self.sampler.lock().sample();

        let mut state = self.state.lock();
        state.gauges = gauges;
        let count = state.pending.entry(POLL_COUNT.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Latest gauge readings
    pub fn gauges(&self) -> MetricBatch {
        MetricBatch::Gauges(self.state.lock().gauges.clone())
    }

    /// Take the pending counter deltas.
    ///
    /// The caller owns them until it either delivers them or hands them back
    /// with [`MetricsCollector::requeue`], so concurrent pushes never send the
    /// same delta twice.
    pub fn take_counters(&self) -> MetricBatch {
        MetricBatch::Counters(std::mem::take(&mut self.state.lock().pending))
    }

    /// Return undelivered counter deltas
    pub fn requeue(&self, batch: MetricBatch) {
        let MetricBatch::Counters(counters) = batch else {
            return;
        };
        let mut state = self.state.lock();
        for (id, delta) in counters {
            let pending = state.pending.entry(id).or_insert(0);
            *pending = pending.saturating_add(delta);
        }
    }

    /// Pending delta of one counter
    pub fn pending(&self, id: &str) -> i64 {
        self.state.lock().pending.get(id).copied().unwrap_or(0)
    }
}
