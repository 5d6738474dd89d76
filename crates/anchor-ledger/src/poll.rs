use std::future::Future;
use std::time::Duration;

use crate::error::{LedgerError, LedgerResult};

/// How long-running service operations are awaited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between status checks.
    pub interval: Duration,
    /// Upper bound on the whole wait. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl PollOptions {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            timeout: None,
        }
    }
}

/// Outcome of a single status check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollStatus<T> {
    Pending,
    Complete(T),
}

/// Run `step` until it reports completion.
///
/// An error from `step` ends the wait immediately; nothing is retried.
pub async fn poll_until<T, F, Fut>(options: &PollOptions, what: &str, mut step: F) -> LedgerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LedgerResult<PollStatus<T>>>,
{
    let wait = async {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match step().await {
                Ok(PollStatus::Complete(value)) => {
                    tracing::debug!(what, attempts, "operation complete");
                    return Ok(value);
                }
                Ok(PollStatus::Pending) => {
                    tracing::trace!(what, attempts, "still pending");
                    tokio::time::sleep(options.interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    };

    match options.timeout {
        None => wait.await,
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| LedgerError::Timeout {
                what: what.to_string(),
                after: limit,
            })?,
    }
}
