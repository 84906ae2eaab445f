use std::fmt;

use serde::{Deserialize, Serialize};

/// An uploaded catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadRef {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One block of a message body. Only text is read; the remaining kinds are
/// kept as opaque markers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: TextContent },
    ImageFile,
    ImageUrl,
    Refusal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextContent {
    pub value: String,
}

impl ContentBlock {
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(&text.value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::ImageFile => "image_file",
            ContentBlock::ImageUrl => "image_url",
            ContentBlock::Refusal => "refusal",
            ContentBlock::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<MessageRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Cancelling,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Transient states keep the poller waiting; everything else is final.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_transient()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Cancelling => "cancelling",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunRef {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    FileSearch,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAssistantRequest<'a> {
    pub model: &'a str,
    pub name: &'a str,
    pub instructions: &'a str,
    pub tools: &'a [Tool],
    #[serde(skip_serializing_if = "ToolResources::is_empty")]
    pub tool_resources: ToolResources,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct ToolResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

impl ToolResources {
    /// Binds the files to every tool that can read them.
    pub fn for_files(tools: &[Tool], file_ids: &[String]) -> Self {
        let mut resources = ToolResources::default();
        if file_ids.is_empty() {
            return resources;
        }
        for tool in tools {
            match tool {
                Tool::FileSearch => {
                    resources.file_search = Some(FileSearchResources {
                        vector_stores: vec![VectorStoreSeed {
                            file_ids: file_ids.to_vec(),
                        }],
                    });
                }
            }
        }
        resources
    }

    fn is_empty(&self) -> bool {
        self.file_search.is_none()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FileSearchResources {
    pub vector_stores: Vec<VectorStoreSeed>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VectorStoreSeed {
    pub file_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: Role,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}
