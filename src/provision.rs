//! Cache-backed provisioning of the catalog file, the assistant and the
//! conversation thread.
//!
//! Each resource is created at most once per cache key. A cached identifier
//! is trusted without asking the service whether it still exists. When a
//! later step fails, earlier identifiers stay cached so a rerun resumes
//! where the previous one stopped.

use std::future::Future;
use std::path::Path;

use tracing::info;

use crate::assistant::AssistantProfile;
use crate::context::AppContext;
use crate::error::{AppError, Result};

pub const DEFAULT_KEY_PREFIX: &str = "assistantDemo:";

/// Logical cache keys, `<prefix><suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn data_file_id(&self) -> String {
        format!("{}dataFileId", self.prefix)
    }

    pub fn assistant_id(&self) -> String {
        format!("{}assistantId", self.prefix)
    }

    /// One shared thread unless a session id scopes it.
    pub fn thread_id(&self, session: Option<&str>) -> String {
        match session {
            Some(session) => format!("{}userSessionThreadId:{}", self.prefix, session),
            None => format!("{}userSessionThreadId", self.prefix),
        }
    }

    pub fn all(&self, session: Option<&str>) -> [String; 3] {
        [
            self.data_file_id(),
            self.assistant_id(),
            self.thread_id(session),
        ]
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub file_id: String,
    pub assistant_id: String,
    pub thread_id: String,
}

pub struct Provisioner<'a> {
    ctx: &'a AppContext,
    keys: &'a CacheKeys,
}

impl<'a> Provisioner<'a> {
    pub fn new(ctx: &'a AppContext, keys: &'a CacheKeys) -> Self {
        Self { ctx, keys }
    }

    /// File, then assistant (bound to the file), then thread.
    pub async fn provision(
        &self,
        catalog_path: &Path,
        profile: &AssistantProfile,
        session: Option<&str>,
    ) -> Result<Provisioned> {
        let api = &self.ctx.api;

        let file_id = self
            .cached_or_create("file", &self.keys.data_file_id(), || async move {
                Ok::<_, AppError>(api.upload_file(catalog_path).await?.id)
            })
            .await?;

        let file_ids = vec![file_id.clone()];
        let assistant_id = self
            .cached_or_create("assistant", &self.keys.assistant_id(), || async move {
                let assistant = api
                    .create_assistant(
                        &profile.instructions,
                        &profile.name,
                        &profile.model,
                        &profile.tools,
                        &file_ids,
                    )
                    .await?;
                Ok::<_, AppError>(assistant.id)
            })
            .await?;

        let thread_id = self
            .cached_or_create("thread", &self.keys.thread_id(session), || async move {
                Ok::<_, AppError>(api.create_thread().await?.id)
            })
            .await?;

        Ok(Provisioned {
            file_id,
            assistant_id,
            thread_id,
        })
    }

    async fn cached_or_create<F, Fut>(&self, kind: &str, key: &str, create: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(id) = self.ctx.cache.get(key).await? {
            info!("Reusing cached {} id: {}", kind, id);
            return Ok(id);
        }

        let id = create().await?;
        self.ctx.cache.set(key, &id).await?;
        info!("Cached new {} id under {}", kind, key);
        Ok(id)
    }
}
