//! Metric record types
//!
//! `Metric` is the wire shape exchanged between the agent and the server.
//! Everything past the HTTP boundary works on the validated `MetricUpdate`.

use crate::utils::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Last write wins
    Gauge,
    /// Sum of all deltas
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(MetricsError::validation(format!(
                "unknown metric type: {other}"
            ))),
        }
    }
}

/// Wire representation of one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Metric {
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge,
            delta: None,
            value: Some(value),
        }
    }

    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        }
    }

    /// Check the record's invariants and turn it into an update.
    ///
    /// Exactly one of `value`/`delta` must be set, matching `kind`.
    pub fn validate(&self) -> Result<MetricUpdate> {
        validate_id(&self.id)?;

        let value = match (self.kind, self.value, self.delta) {
            (MetricKind::Gauge, Some(value), None) => {
                if !value.is_finite() {
                    return Err(MetricsError::validation(format!(
                        "gauge {} has a non-finite value",
                        self.id
                    )));
                }
                MetricValue::Gauge(value)
            }
            (MetricKind::Counter, None, Some(delta)) => MetricValue::Counter(delta),
            (kind, value, delta) => {
                return Err(MetricsError::validation(format!(
                    "{kind} {} must carry exactly one of value/delta (value: {}, delta: {})",
                    self.id,
                    value.is_some(),
                    delta.is_some()
                )));
            }
        };

        Ok(MetricUpdate {
            id: self.id.clone(),
            value,
        })
    }
}

/// Typed payload of a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Gauge(f64),
    Counter(i64),
}

impl MetricValue {
    /// Parse a textual value as it appears in `/update/{type}/{name}/{value}`
    pub fn parse(kind: MetricKind, raw: &str) -> Result<Self> {
        match kind {
            MetricKind::Gauge => {
                let value: f64 = raw.parse().map_err(|_| {
                    MetricsError::validation(format!("invalid gauge value: {raw}"))
                })?;
                if !value.is_finite() {
                    return Err(MetricsError::validation(format!(
                        "invalid gauge value: {raw}"
                    )));
                }
                Ok(MetricValue::Gauge(value))
            }
            MetricKind::Counter => raw
                .parse::<i64>()
                .map(MetricValue::Counter)
                .map_err(|_| MetricsError::validation(format!("invalid counter value: {raw}"))),
        }
    }
}

impl fmt::Display for MetricValue {
    /// Shortest representation that round-trips: `9.0` prints as `9`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Gauge(value) => write!(f, "{value}"),
            MetricValue::Counter(total) => write!(f, "{total}"),
        }
    }
}

/// A validated metric write
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    pub id: String,
    pub value: MetricValue,
}

impl MetricUpdate {
    /// Rejects empty ids and non-finite gauges, which JSON cannot carry
    pub fn new(id: impl Into<String>, value: MetricValue) -> Result<Self> {
        let id = id.into();
        validate_id(&id)?;
        if let MetricValue::Gauge(value) = value {
            if !value.is_finite() {
                return Err(MetricsError::validation(format!(
                    "gauge {id} has a non-finite value"
                )));
            }
        }
        Ok(Self { id, value })
    }

    pub fn to_metric(&self) -> Metric {
        match self.value {
            MetricValue::Gauge(value) => Metric::gauge(self.id.clone(), value),
            MetricValue::Counter(delta) => Metric::counter(self.id.clone(), delta),
        }
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(MetricsError::validation("metric id must not be empty"));
    }
    Ok(())
}

/// Full view of the store: current gauges and counter totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(default, alias = "Gauge")]
    pub gauge: BTreeMap<String, f64>,
    #[serde(default, alias = "Counter")]
    pub counter: BTreeMap<String, i64>,
}

impl MetricsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.gauge.is_empty() && self.counter.is_empty()
    }

    pub fn len(&self) -> usize {
        self.gauge.len() + self.counter.len()
    }
}
