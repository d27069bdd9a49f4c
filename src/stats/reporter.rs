use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::session::SessionResult;

use super::dispatcher::ReportingSettings;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Destination for finished-run records.
///
/// One call per attempt. Failures are returned, never retried here; the
/// dispatcher owns the retry policy.
pub trait StatsReporter {
    fn submit(&self, result: &SessionResult) -> impl Future<Output = Result<()>> + Send;
}

/// Writes each result to the log.
#[derive(Debug, Clone, Default)]
pub struct LogReporter;

impl StatsReporter for LogReporter {
    async fn submit(&self, result: &SessionResult) -> Result<()> {
        let payload = serde_json::to_string(result).context("failed to encode result")?;
        log_info!("session result: {payload}");
        Ok(())
    }
}

/// Appends one JSON object per line, using the web app's stat field names.
#[derive(Debug, Clone)]
pub struct JsonlReporter {
    path: PathBuf,
}

impl JsonlReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsReporter for JsonlReporter {
    async fn submit(&self, result: &SessionResult) -> Result<()> {
        let mut line = serde_json::to_string(result).context("failed to encode result")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open stats file {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        file.flush().await.context("Failed to flush stats file")?;
        Ok(())
    }
}

/// POSTs each result as a JSON body to the web app's stat endpoint.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl StatsReporter for HttpReporter {
    async fn submit(&self, result: &SessionResult) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(result)
            .send()
            .await
            .with_context(|| format!("Failed to POST result to {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} answered {status}", self.endpoint);
        }
        log_debug!("posted result for run {} to {}", result.run_id, self.endpoint);
        Ok(())
    }
}

/// Reporter chosen at startup.
#[derive(Debug, Clone)]
pub enum Reporter {
    Log(LogReporter),
    Jsonl(JsonlReporter),
    Http(HttpReporter),
}

impl Reporter {
    /// Command-line URL, then command-line file, then the configured
    /// endpoint. Falls back to the log.
    pub fn select(
        stats_url: Option<String>,
        stats_file: Option<PathBuf>,
        settings: &ReportingSettings,
    ) -> Result<Self> {
        let timeout = Duration::from_millis(settings.attempt_timeout_ms);
        if let Some(url) = stats_url {
            return Ok(Self::Http(HttpReporter::new(url, timeout)?));
        }
        if let Some(path) = stats_file {
            return Ok(Self::Jsonl(JsonlReporter::new(path)));
        }
        match &settings.endpoint {
            Some(url) => Ok(Self::Http(HttpReporter::new(url.clone(), timeout)?)),
            None => Ok(Self::Log(LogReporter)),
        }
    }
}

impl StatsReporter for Reporter {
    async fn submit(&self, result: &SessionResult) -> Result<()> {
        match self {
            Self::Log(r) => r.submit(result).await,
            Self::Jsonl(r) => r.submit(result).await,
            Self::Http(r) => r.submit(result).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::bail;

    use super::*;
    use crate::session::ResultCode;

    pub fn sample_result(score: u32) -> SessionResult {
        SessionResult {
            identity: "test".into(),
            age: 50,
            game_id: "exercise_3".into(),
            score,
            time_seconds: 42,
            result: ResultCode::Completed,
            run_id: format!("run-{score}"),
        }
    }

    /// Fails the first `fail_first` attempts, optionally stalls each call.
    #[derive(Clone, Default)]
    pub struct FlakyReporter {
        pub fail_first: u32,
        pub stall: Option<Duration>,
        pub attempts: Arc<AtomicU32>,
        pub delivered: Arc<Mutex<Vec<SessionResult>>>,
    }

    impl FlakyReporter {
        pub fn failing(fail_first: u32) -> Self {
            Self {
                fail_first,
                ..Self::default()
            }
        }

        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }

        pub fn delivered(&self) -> Vec<SessionResult> {
            self.delivered.lock().unwrap().clone()
        }
    }

    impl StatsReporter for FlakyReporter {
        async fn submit(&self, result: &SessionResult) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            if attempt <= self.fail_first {
                bail!("endpoint unavailable (attempt {attempt})");
            }
            self.delivered.lock().unwrap().push(result.clone());
            Ok(())
        }
    }
}
