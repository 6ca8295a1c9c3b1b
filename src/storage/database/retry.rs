//! Bounded retry for conflicting writes

use crate::utils::error::{MetricsError, Result};
use sea_orm::{DbErr, SqlErr};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff delays applied between attempts.
///
/// `n` delays allow `n + 1` attempts in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_secs(5),
        ])
    }
}

impl RetrySchedule {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Schedule with `retries` zero-length delays
    pub fn immediate(retries: usize) -> Self {
        Self::new(vec![Duration::ZERO; retries])
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Whether the error is a unique-constraint violation
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Run `op` until it succeeds, retrying only errors `is_conflict` accepts.
///
/// Other errors are returned at once. When every attempt conflicted the
/// result is `MaxRetriesExceeded`.
pub async fn retry_on_conflict<T, F, Fut, C>(
    schedule: &RetrySchedule,
    is_conflict: C,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, DbErr>>,
    C: Fn(&DbErr) -> bool,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_conflict(&e) => match schedule.delays.get(attempt) {
                Some(delay) => {
                    attempt += 1;
                    warn!(
                        "Write conflict, retry {}/{} in {:?}: {}",
                        attempt,
                        schedule.max_retries(),
                        delay,
                        e
                    );
                    tokio::time::sleep(*delay).await;
                }
                None => {
                    return Err(MetricsError::MaxRetriesExceeded {
                        attempts: attempt + 1,
                    });
                }
            },
            Err(e) => return Err(MetricsError::Database(e)),
        }
    }
}
