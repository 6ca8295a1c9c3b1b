//! HTTP push of metric batches to the collector

use crate::agent::collector::MetricBatch;
use crate::config::AgentConfig;
use crate::transport::{Envelope, SIGNATURE_HEADER};
use crate::utils::error::{MetricsError, Result};
use crate::utils::net::REAL_IP_HEADER;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

/// Per-request timeout of a push
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Seals batches and POSTs them to `/updates/`
pub struct Reporter {
    client: reqwest::Client,
    url: String,
    envelope: Envelope,
    limiter: Arc<Semaphore>,
    real_ip: Option<IpAddr>,
}

impl Reporter {
    pub fn new(config: &AgentConfig, envelope: Envelope) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: config.updates_url(),
            envelope,
            limiter: Arc::new(Semaphore::new(config.rate_limit.max(1))),
            real_ip: None,
        })
    }

    /// Address to advertise in `X-Real-IP`
    pub fn with_real_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.real_ip = ip;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pushes that may start right now
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Send one batch; waits for a rate-limit permit first.
    ///
    /// Non-2xx answers are errors.
    pub async fn send(&self, batch: &MetricBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| MetricsError::internal("rate limiter closed"))?;

        let sealed = self.envelope.seal(&batch.to_metrics())?;
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT_ENCODING, "gzip")
            .body(sealed.body);
        if let Some(encoding) = sealed.content_encoding {
            request = request.header(CONTENT_ENCODING, encoding);
        }
        if let Some(signature) = sealed.signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        if let Some(ip) = self.real_ip {
            request = request.header(REAL_IP_HEADER, ip.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::network(format!(
                "collector answered {}: {}",
                status,
                body.trim()
            )));
        }

        debug!("Pushed {} metrics ({})", batch.len(), status);
        Ok(())
    }
}
