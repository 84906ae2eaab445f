use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::error::RemoteError;
use super::types::{
    ApiErrorBody, AssistantRef, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest,
    FileRef, MessageList, MessageRef, Role, RunRef, ThreadRef, Tool, ToolResources,
};
use super::AssistantApi;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA.0, ASSISTANTS_BETA.1)
    }

    async fn post_request<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", path);
        let request = self.authorized(self.client.post(self.url(path))).json(body);
        Self::send(request).await
    }

    async fn get_request<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        debug!("GET {}", path);
        let request = self.authorized(self.client.get(self.url(path)));
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AssistantApi for OpenAIClient {
    async fn upload_file(&self, path: &Path) -> Result<FileRef, RemoteError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| RemoteError::InvalidPath {
                path: path.display().to_string(),
            })?
            .to_string_lossy()
            .to_string();

        let file_content = tokio::fs::read(path).await?;

        let form = multipart::Form::new().text("purpose", "assistants").part(
            "file",
            multipart::Part::bytes(file_content)
                .file_name(file_name)
                .mime_str("application/octet-stream")?,
        );

        let request = self
            .authorized(self.client.post(self.url("/files")))
            .multipart(form);
        let file: FileRef = Self::send(request).await?;
        info!("New file id: {}", file.id);
        Ok(file)
    }

    async fn create_assistant(
        &self,
        instructions: &str,
        name: &str,
        model: &str,
        tools: &[Tool],
        file_ids: &[String],
    ) -> Result<AssistantRef, RemoteError> {
        let body = CreateAssistantRequest {
            model,
            name,
            instructions,
            tools,
            tool_resources: ToolResources::for_files(tools, file_ids),
        };
        let assistant: AssistantRef = self.post_request("/assistants", &body).await?;
        info!("New assistant id: {}", assistant.id);
        Ok(assistant)
    }

    async fn create_thread(&self) -> Result<ThreadRef, RemoteError> {
        let thread: ThreadRef = self
            .post_request("/threads", &serde_json::json!({}))
            .await?;
        info!("New user thread id: {}", thread.id);
        Ok(thread)
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<MessageRef, RemoteError> {
        let body = CreateMessageRequest { role, content };
        let message: MessageRef = self
            .post_request(&format!("/threads/{thread_id}/messages"), &body)
            .await?;
        info!("New user message id: {}", message.id);
        Ok(message)
    }

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunRef, RemoteError> {
        let body = CreateRunRequest { assistant_id };
        let run: RunRef = self
            .post_request(&format!("/threads/{thread_id}/runs"), &body)
            .await?;
        info!("New run id: {} ({})", run.id, run.status);
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunRef, RemoteError> {
        self.get_request(&format!("/threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, RemoteError> {
        self.get_request(&format!("/threads/{thread_id}/messages?order=desc"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{default_log_filter, LOG_TARGET};

    #[test]
    fn request_logs_fall_under_the_debug_filter() {
        // events without an explicit target use the module path
        assert!(module_path!().starts_with(LOG_TARGET));
        assert_eq!(default_log_filter(true), format!("{LOG_TARGET}=debug"));
        assert_eq!(default_log_filter(false), format!("{LOG_TARGET}=info"));
    }
}
