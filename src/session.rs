use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::{ContentBlock, Role, RunStatus};
use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::poller::RunPoller;
use crate::provision::Provisioned;

pub const SAMPLE_QUESTION: &str = "What brands do you have in store?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub run_id: String,
    pub message_id: String,
    pub block: ContentBlock,
}

impl Answer {
    /// Printable form; non-text blocks are named by kind.
    pub fn render(&self) -> String {
        match self.block.text() {
            Some(text) => text.to_string(),
            None => format!("[{} content]", self.block.kind()),
        }
    }
}

/// Posts the question, runs the assistant on the thread and returns the first
/// content block of the newest message once the run completes.
pub async fn ask(
    ctx: &AppContext,
    provisioned: &Provisioned,
    question: &str,
    poller: &RunPoller,
    cancel: &CancellationToken,
) -> Result<Answer> {
    let thread_id = provisioned.thread_id.as_str();

    ctx.api.post_message(thread_id, Role::User, question).await?;

    let run = ctx
        .api
        .start_run(thread_id, &provisioned.assistant_id)
        .await?;

    let run = poller
        .wait(ctx.api.as_ref(), thread_id, &run.id, cancel)
        .await?;

    if run.status != RunStatus::Completed {
        if let Some(last_error) = &run.last_error {
            warn!(
                "Run {} ended as {}: {} ({})",
                run.id, run.status, last_error.message, last_error.code
            );
        }
        return Err(AppError::RunNotCompleted {
            run_id: run.id,
            status: run.status,
        });
    }
    info!("Run {} completed", run.id);

    let messages = ctx.api.list_messages(thread_id).await?;
    let newest = messages
        .data
        .into_iter()
        .next()
        .ok_or_else(|| AppError::EmptyAnswer {
            thread_id: thread_id.to_string(),
        })?;
    let block = newest
        .content
        .into_iter()
        .next()
        .ok_or_else(|| AppError::EmptyAnswer {
            thread_id: thread_id.to_string(),
        })?;

    Ok(Answer {
        run_id: run.id,
        message_id: newest.id,
        block,
    })
}
