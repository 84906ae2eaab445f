use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{AssistantApi, RunRef};
use crate::error::{AppError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Waits for a run to leave its transient states, checking at a fixed
/// interval.
#[derive(Debug, Clone)]
pub struct RunPoller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for RunPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl RunPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    /// `None` polls until a terminal state or cancellation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the run in its first terminal state. Status fetches are
    /// read-only; a cancelled or timed-out wait leaves the remote run alone.
    pub async fn wait(
        &self,
        api: &dyn AssistantApi,
        thread_id: &str,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RunRef> {
        let started = Instant::now();
        // A deadline past the clock's range is no deadline at all.
        let deadline = self
            .timeout
            .and_then(|timeout| started.checked_add(timeout));
        let cancelled = || AppError::Cancelled {
            run_id: run_id.to_string(),
        };

        loop {
            let run = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled()),
                run = api.get_run(thread_id, run_id) => run?,
            };
            debug!("Run {} status: {}", run.id, run.status);

            if run.status.is_terminal() {
                return Ok(run);
            }

            // Never fetch at or past the deadline.
            if let Some(deadline) = deadline {
                let next_fetch = Instant::now().checked_add(self.interval);
                if next_fetch.map_or(true, |next| next >= deadline) {
                    return Err(AppError::PollingTimeout {
                        run_id: run_id.to_string(),
                        elapsed: started.elapsed(),
                    });
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled()),
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
