use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::session::SessionResult;

use super::reporter::StatsReporter;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingSettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub attempt_timeout_ms: u64,
    pub queue_capacity: usize,
    /// URL results are POSTed to when no reporter is picked on the command line.
    pub endpoint: Option<String>,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            attempt_timeout_ms: 5000,
            queue_capacity: 16,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub attempt_timeout: Duration,
}

impl From<&ReportingSettings> for RetryPolicy {
    fn from(settings: &ReportingSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            attempt_timeout: Duration::from_millis(settings.attempt_timeout_ms),
        }
    }
}

/// Hands finished-run records to a background worker that delivers them
/// with a bounded retry policy. The frame loop only ever calls
/// [`StatsDispatcher::dispatch`], which never waits.
pub struct StatsDispatcher {
    tx: Option<mpsc::Sender<SessionResult>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl StatsDispatcher {
    /// Spawn the delivery worker. Must be called inside a tokio runtime.
    pub fn spawn<R>(reporter: R, settings: &ReportingSettings) -> Self
    where
        R: StatsReporter + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(delivery_loop(
            reporter,
            rx,
            RetryPolicy::from(settings),
            cancel_token.clone(),
        ));

        Self {
            tx: Some(tx),
            handle: Some(handle),
            cancel_token,
        }
    }

    /// Queue a result for delivery. Returns false if it had to be dropped.
    pub fn dispatch(&self, result: SessionResult) -> bool {
        let Some(tx) = &self.tx else {
            log_error!("stats dispatcher closed, dropping result for run {}", result.run_id);
            return false;
        };

        match tx.try_send(result) {
            Ok(()) => true,
            Err(TrySendError::Full(result)) => {
                log_error!("stats queue full, dropping result for run {}", result.run_id);
                false
            }
            Err(TrySendError::Closed(result)) => {
                log_error!("stats worker gone, dropping result for run {}", result.run_id);
                false
            }
        }
    }

    /// Stop immediately; queued and in-flight results are abandoned.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Close the queue and wait for the worker to deliver what is left.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("stats worker task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Drop for StatsDispatcher {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel_token.cancel();
        }
    }
}

async fn delivery_loop<R>(
    reporter: R,
    mut rx: mpsc::Receiver<SessionResult>,
    policy: RetryPolicy,
    cancel_token: CancellationToken,
) where
    R: StatsReporter + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("stats worker cancelled");
                break;
            }
            next = rx.recv() => match next {
                Some(result) => {
                    deliver(&reporter, &result, &policy, &cancel_token).await;
                }
                None => {
                    log_info!("stats queue drained, worker exiting");
                    break;
                }
            }
        }
    }
}

/// Try one record up to `max_attempts` times. Returns whether it landed.
async fn deliver<R: StatsReporter>(
    reporter: &R,
    result: &SessionResult,
    policy: &RetryPolicy,
    cancel_token: &CancellationToken,
) -> bool {
    for attempt in 1..=policy.max_attempts {
        match tokio::time::timeout(policy.attempt_timeout, reporter.submit(result)).await {
            Ok(Ok(())) => {
                log_info!(
                    "delivered result for run {} ({} {}) on attempt {}",
                    result.run_id,
                    result.game_id,
                    result.result,
                    attempt
                );
                return true;
            }
            Ok(Err(err)) => log_warn!(
                "stats delivery attempt {}/{} failed for run {}: {err:#}",
                attempt,
                policy.max_attempts,
                result.run_id
            ),
            Err(_) => log_warn!(
                "stats delivery attempt {}/{} timed out (> {}ms) for run {}",
                attempt,
                policy.max_attempts,
                policy.attempt_timeout.as_millis(),
                result.run_id
            ),
        }

        if attempt < policy.max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(policy.retry_delay) => {}
                _ = cancel_token.cancelled() => return false,
            }
        }
    }

    log_error!(
        "dropping result for run {} after {} attempts",
        result.run_id,
        policy.max_attempts
    );
    false
}
