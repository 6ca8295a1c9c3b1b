//! Metrics agent
//!
//! Two decoupled loops share one [`MetricsCollector`]: the poll loop samples
//! the host every poll interval, the report loop pushes the latest gauges
//! and the accumulated counter deltas every report interval.

pub mod collector;
pub mod reporter;

pub use collector::{MetricBatch, MetricsCollector, RuntimeSampler, SystemSampler, POLL_COUNT};
pub use reporter::Reporter;

use crate::config::{AgentArgs, AgentConfig};
use crate::transport::{Envelope, encryption};
use crate::utils::error::Result;
use crate::utils::logging::{LogFormat, init_logging};
use crate::utils::net::outbound_ip;
use crate::utils::runtime::{cancelled, shutdown_channel, shutdown_signal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Sampler, collector and reporter wired to the configured intervals
pub struct Agent {
    config: AgentConfig,
    collector: Arc<MetricsCollector>,
    reporter: Arc<Reporter>,
}

impl Agent {
    /// Agent sampling this host
    pub async fn new(config: AgentConfig) -> Result<Self> {
        let envelope = agent_envelope(&config).await?;
        let real_ip = outbound_ip();
        match real_ip {
            Some(ip) => info!("Reporting as {}", ip),
            None => warn!("No outbound address found, X-Real-IP will not be sent"),
        }

        let reporter = Reporter::new(&config, envelope)?.with_real_ip(real_ip);
        let collector = MetricsCollector::new(SystemSampler::new());
        Ok(Self::with_parts(config, collector, reporter))
    }

    pub fn with_parts(config: AgentConfig, collector: MetricsCollector, reporter: Reporter) -> Self {
        Self {
            config,
            collector: Arc::new(collector),
            reporter: Arc::new(reporter),
        }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    /// Run both loops until `shutdown` flips to `true`.
    ///
    /// Pushes already in flight are allowed to finish.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!(
            "Agent started: poll every {:?}, report every {:?} to {}",
            self.config.poll_interval(),
            self.config.report_interval(),
            self.reporter.url()
        );

        let poll = tokio::spawn(poll_loop(
            Arc::clone(&self.collector),
            self.config.poll_interval(),
            shutdown.clone(),
        ));
        let report = tokio::spawn(report_loop(
            Arc::clone(&self.collector),
            Arc::clone(&self.reporter),
            self.config.report_interval(),
            self.config.rate_limit.max(1),
            shutdown,
        ));

        for (name, task) in [("poll", poll), ("report", report)] {
            if let Err(e) = task.await {
                warn!("Agent {} loop failed: {}", name, e);
            }
        }
        info!("Agent stopped");
    }
}

/// Push the latest gauges and the pending counter deltas once.
///
/// Counter deltas that could not be delivered go back to the collector and
/// are sent with the next report.
pub async fn report_once(collector: &MetricsCollector, reporter: &Reporter) -> Result<()> {
    let gauges = collector.gauges();
    let counters = collector.take_counters();

    let (gauges_sent, counters_sent) =
        futures::future::join(reporter.send(&gauges), reporter.send(&counters)).await;

    if counters_sent.is_err() {
        collector.requeue(counters);
    }
    gauges_sent.and(counters_sent)
}

async fn poll_loop(
    collector: Arc<MetricsCollector>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                collector.poll();
                debug!("Polled host metrics");
            }
            _ = cancelled(&mut shutdown) => break,
        }
    }
}

/// Spawn one report per tick, at most `max_in_flight` at a time.
///
/// A tick that finds every slot busy is skipped; its counter deltas stay
/// pending and the next report carries the gauges polled by then.
async fn report_loop(
    collector: Arc<MetricsCollector>,
    reporter: Arc<Reporter>,
    period: Duration,
    max_in_flight: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if in_flight.len() >= max_in_flight {
                    debug!("{} reports still in flight, skipping tick", in_flight.len());
                    continue;
                }
                let collector = Arc::clone(&collector);
                let reporter = Arc::clone(&reporter);
                in_flight.spawn(async move {
                    if let Err(e) = report_once(&collector, &reporter).await {
                        warn!("Report failed: {}", e);
                    }
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            _ = cancelled(&mut shutdown) => break,
        }
    }

    while in_flight.join_next().await.is_some() {}
}

/// Sender-side envelope: HMAC key or RSA public key
pub async fn agent_envelope(config: &AgentConfig) -> Result<Envelope> {
    let mut envelope = Envelope::new();
    if let Some(key) = config.key.as_deref().filter(|k| !k.is_empty()) {
        envelope = envelope.with_key(key);
    }
    if let Some(path) = &config.crypto_key {
        envelope = envelope.with_public_key(encryption::load_public_key(path).await?);
        info!("Encrypting batches with {}", path.display());
    }
    Ok(envelope)
}

/// Run the agent from parsed command-line arguments until SIGINT/SIGTERM
pub async fn run_agent(args: AgentArgs) -> Result<()> {
    let config = AgentConfig::load(args).await?;

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(&config.log_level, format);

    let build = crate::BuildInfo::current();
    info!(
        "Starting metrics agent {} ({}, built {})",
        build.version, build.git_hash, build.build_time
    );

    let agent = Agent::new(config).await?;
    let (stop, shutdown) = shutdown_channel();
    let running = tokio::spawn(agent.run(shutdown));

    shutdown_signal().await;
    let _ = stop.send(true);
    if let Err(e) = running.await {
        warn!("Agent task failed: {}", e);
    }
    Ok(())
}
