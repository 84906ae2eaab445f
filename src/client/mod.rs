pub mod client;
pub mod error;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

pub use client::OpenAIClient;
pub use error::RemoteError;
pub use types::{
    AssistantRef, ContentBlock, FileRef, MessageList, MessageRef, Role, RunRef, RunStatus,
    ThreadRef, Tool,
};

/// Typed operations against the hosted assistant service.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn upload_file(&self, path: &Path) -> Result<FileRef, RemoteError>;

    async fn create_assistant(
        &self,
        instructions: &str,
        name: &str,
        model: &str,
        tools: &[Tool],
        file_ids: &[String],
    ) -> Result<AssistantRef, RemoteError>;

    async fn create_thread(&self) -> Result<ThreadRef, RemoteError>;

    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<MessageRef, RemoteError>;

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunRef, RemoteError>;

    /// Pure read of the run's current state.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunRef, RemoteError>;

    /// Messages newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, RemoteError>;
}
