//! Polling for long-running host tasks.

use std::time::{Duration, Instant};

use ptsl_catalog::CommandId;

use crate::bridge::protocol::TaskStatus;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::value::Value;

/// Shortest per-poll request timeout worth issuing. With less budget left
/// than this the wait ends without another query.
const MIN_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Host token for a command that keeps running after its first response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    id: String,
    command: CommandId,
}

impl TaskHandle {
    pub fn new(id: impl Into<String>, command: CommandId) -> Self {
        Self {
            id: id.into(),
            command,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The command that started the task.
    pub fn command(&self) -> CommandId {
        self.command
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskOutcome {
    fn from_status(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::Completed => Some(Self::Succeeded),
            TaskStatus::Failed => Some(Self::Failed),
            TaskStatus::Cancelled => Some(Self::Cancelled),
            TaskStatus::Queued | TaskStatus::Pending | TaskStatus::InProgress => None,
        }
    }
}

/// Final report for a task that reached a terminal status.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub handle: TaskHandle,
    pub outcome: TaskOutcome,
    /// Number of status queries issued, including the final one.
    pub polls: u32,
    pub progress: f64,
    /// Host-supplied failure text, if any.
    pub error: Option<String>,
    /// The last status payload.
    pub payload: Value,
}

impl TaskResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == TaskOutcome::Succeeded
    }
}

/// Query task status until a terminal status is seen or `max_wait` would be
/// exceeded.
///
/// The first query goes out immediately; later ones are spaced by
/// `poll_interval`. A timeout does not cancel the task on the host.
pub async fn await_task(
    dispatcher: &Dispatcher,
    handle: &TaskHandle,
    poll_interval: Duration,
    max_wait: Duration,
    request_timeout: Duration,
) -> Result<TaskResult> {
    let started = Instant::now();
    let args = Value::map([("task_id", handle.id())]);
    let mut polls = 0u32;

    loop {
        let remaining = max_wait.saturating_sub(started.elapsed());
        if remaining < MIN_POLL_TIMEOUT {
            tracing::warn!(task_id = handle.id(), polls, "No wait budget left for another poll");
            return Err(Error::TaskTimeout {
                task_id: handle.id().to_string(),
                waited: started.elapsed(),
            });
        }
        let budget_limited = remaining < request_timeout;
        let poll_timeout = request_timeout.min(remaining);

        let payload = match dispatcher
            .run_command(CommandId::GetTaskStatus, &args, poll_timeout)
            .await
        {
            Ok(payload) => payload,
            Err(Error::RequestTimeout { .. }) if budget_limited => {
                return Err(Error::TaskTimeout {
                    task_id: handle.id().to_string(),
                    waited: started.elapsed(),
                });
            }
            Err(e) => return Err(e),
        };
        polls += 1;

        let status_name = payload.get("status").and_then(Value::as_str).unwrap_or("");
        let status = TaskStatus::from_name(status_name).ok_or_else(|| Error::MalformedResponse {
            command: CommandId::GetTaskStatus,
            reason: format!("unknown task status '{status_name}'"),
        })?;
        let progress = payload.get("progress").and_then(Value::as_f64).unwrap_or(0.0);
        tracing::debug!(
            task_id = handle.id(),
            status = status.as_str(),
            progress,
            polls,
            "Task status"
        );

        if let Some(outcome) = TaskOutcome::from_status(status) {
            let error = payload
                .get("task_error")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
                .map(str::to_string);
            tracing::info!(task_id = handle.id(), ?outcome, polls, "Task finished");
            return Ok(TaskResult {
                handle: handle.clone(),
                outcome,
                polls,
                progress,
                error,
                payload,
            });
        }

        if started.elapsed() + poll_interval > max_wait {
            tracing::warn!(task_id = handle.id(), polls, "Gave up waiting for task");
            return Err(Error::TaskTimeout {
                task_id: handle.id().to_string(),
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}
