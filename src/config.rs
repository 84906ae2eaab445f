use std::path::PathBuf;
use std::time::Duration;

use crate::assistant::AssistantProfile;
use crate::error::{AppError, Result};
use crate::poller::RunPoller;
use crate::provision::CacheKeys;

/// Crate-wide tracing target; every module logs under it.
pub const LOG_TARGET: &str = "catalog_assistant";

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("{LOG_TARGET}={level}")
}

/// Everything the binary needs, after CLI and environment are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub redis_url: String,
    pub api_key: String,
    pub api_base_url: String,
    pub catalog_path: PathBuf,
    pub key_prefix: String,
    pub session: Option<String>,
    pub model: String,
    pub support_email: String,
    pub product_link_base: String,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
}

impl Settings {
    /// Checks the values every command needs.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::configuration("OpenAI API key is missing"));
        }
        if self.redis_url.trim().is_empty() {
            return Err(AppError::configuration("Redis connection URL is missing"));
        }
        if self.poll_interval.is_zero() {
            return Err(AppError::configuration(
                "poll interval must be greater than zero",
            ));
        }
        if self.session.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(AppError::configuration("session id must not be blank"));
        }
        Ok(())
    }

    /// Only needed when the file id is not cached yet.
    pub fn validate_catalog(&self) -> Result<()> {
        if self.catalog_path.as_os_str().is_empty() {
            return Err(AppError::configuration("catalog file path is missing"));
        }
        if !self.catalog_path.is_file() {
            return Err(AppError::configuration(format!(
                "catalog file {} does not exist",
                self.catalog_path.display()
            )));
        }
        Ok(())
    }

    pub fn cache_keys(&self) -> CacheKeys {
        CacheKeys::new(self.key_prefix.clone())
    }

    pub fn profile(&self) -> AssistantProfile {
        AssistantProfile::ecommerce(&self.model, &self.support_email, &self.product_link_base)
    }

    pub fn poller(&self) -> RunPoller {
        RunPoller::new(self.poll_interval).with_timeout(self.poll_timeout)
    }
}
