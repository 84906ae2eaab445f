use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::types::TextContent;
use crate::client::{
    AssistantApi, AssistantRef, ContentBlock, FileRef, MessageList, MessageRef, RemoteError,
    Role, RunRef, RunStatus, ThreadRef, Tool,
};

/// Scripted stand-in for the assistant service.
#[derive(Default)]
pub struct FakeApi {
    pub uploads: AtomicUsize,
    pub assistants: AtomicUsize,
    pub threads: AtomicUsize,
    pub messages_posted: AtomicUsize,
    pub runs_started: AtomicUsize,
    pub status_fetches: AtomicUsize,
    pub fail_assistant: bool,
    statuses: Mutex<VecDeque<RunStatus>>,
    cancel_after: Option<(usize, CancellationToken)>,
    answer: Option<String>,
    bound_files: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last status repeats once the script runs out.
    pub fn with_statuses(mut self, statuses: &[RunStatus]) -> Self {
        self.statuses = Mutex::new(statuses.iter().copied().collect());
        self
    }

    pub fn failing_assistant_creation(mut self) -> Self {
        self.fail_assistant = true;
        self
    }

    pub fn cancel_after(mut self, fetches: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((fetches, token));
        self
    }

    pub fn answering(mut self, text: &str) -> Self {
        self.answer = Some(text.to_string());
        self
    }

    pub fn bound_files(&self) -> Vec<String> {
        self.bound_files.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> RunStatus {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().copied().unwrap_or(RunStatus::Completed)
        }
    }
}

fn run(status: RunStatus) -> RunRef {
    RunRef {
        id: "run_1".to_string(),
        status,
        last_error: None,
    }
}

#[async_trait]
impl AssistantApi for FakeApi {
    async fn upload_file(&self, _path: &Path) -> Result<FileRef, RemoteError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FileRef {
            id: format!("file-{n}"),
        })
    }

    async fn create_assistant(
        &self,
        _instructions: &str,
        _name: &str,
        _model: &str,
        _tools: &[Tool],
        file_ids: &[String],
    ) -> Result<AssistantRef, RemoteError> {
        if self.fail_assistant {
            return Err(RemoteError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            });
        }
        let n = self.assistants.fetch_add(1, Ordering::SeqCst) + 1;
        *self.bound_files.lock().unwrap() = file_ids.to_vec();
        Ok(AssistantRef {
            id: format!("asst_{n}"),
        })
    }

    async fn create_thread(&self) -> Result<ThreadRef, RemoteError> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ThreadRef {
            id: format!("thread_{n}"),
        })
    }

    async fn post_message(
        &self,
        _thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<MessageRef, RemoteError> {
        self.messages_posted.fetch_add(1, Ordering::SeqCst);
        Ok(MessageRef {
            id: "msg_user".to_string(),
            role,
            content: vec![ContentBlock::Text {
                text: TextContent {
                    value: content.to_string(),
                },
            }],
        })
    }

    async fn start_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<RunRef, RemoteError> {
        self.runs_started.fetch_add(1, Ordering::SeqCst);
        Ok(run(RunStatus::Queued))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<RunRef, RemoteError> {
        let fetched = self.status_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, token)) = &self.cancel_after {
            if fetched >= *limit {
                token.cancel();
            }
        }
        Ok(run(self.next_status()))
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<MessageList, RemoteError> {
        let data = match &self.answer {
            Some(text) => vec![MessageRef {
                id: "msg_answer".to_string(),
                role: Role::Assistant,
                content: vec![ContentBlock::Text {
                    text: TextContent {
                        value: text.clone(),
                    },
                }],
            }],
            None => Vec::new(),
        };
        Ok(MessageList { data })
    }
}
