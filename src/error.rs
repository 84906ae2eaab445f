use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheError;
use crate::client::{RemoteError, RunStatus};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Run {run_id} did not reach a terminal state within {elapsed:?}")]
    PollingTimeout { run_id: String, elapsed: Duration },

    #[error("Stopped waiting for run {run_id}")]
    Cancelled { run_id: String },

    #[error("Run {run_id} ended with status {status}")]
    RunNotCompleted { run_id: String, status: RunStatus },

    #[error("Thread {thread_id} has no messages")]
    EmptyAnswer { thread_id: String },
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
