//! Task submission and the wait-then-query poll loop.
//!
//! The service forbids high-frequency polling, so the loop always sleeps
//! before a status check — including the first one — and re-queries an
//! active task on a fixed interval. A transport or service error from any
//! status check aborts the whole wait immediately; the caller decides
//! whether to start the operation over.
//!
//! Polling is bounded: `max_checks` caps the number of status queries and
//! exhaustion is a typed error rather than an indefinite wait. Callers that
//! need a wall-clock bound instead can race [`await_completion`] against
//! `tokio::time::timeout` — the loop only suspends inside the sleep and the
//! transport future, so dropping it cancels cleanly at either point.

use crate::error::OcrError;
use crate::settings::ProcessingSettings;
use crate::task::{ErrorInfo, TaskId, TaskStatus, TaskStatusRecord};
use crate::transport::TaskTransport;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Default wait between status checks. Provider guidance asks for several
/// seconds between queries; anything below [`MIN_POLL_INTERVAL`] is clamped.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Lower bound on the poll interval accepted from configuration.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default cap on status queries per wait (10 minutes at the default
/// interval).
pub const DEFAULT_MAX_CHECKS: u32 = 120;

/// How one wait-for-completion run is paced and bounded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollPolicy {
    pub interval: Duration,
    pub max_checks: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_checks: DEFAULT_MAX_CHECKS,
        }
    }
}

/// Upload `content` and verify the created task is in an active state.
///
/// A reply in any other state means the server rejected or short-circuited
/// the job even though it created a task record; that is a submission
/// failure, not something to poll.
pub(crate) async fn submit(
    transport: &dyn TaskTransport,
    content: Vec<u8>,
    settings: &ProcessingSettings,
) -> Result<TaskStatusRecord, OcrError> {
    let record = transport.submit(content, settings).await?;
    if !record.status.is_active() {
        return Err(OcrError::Submission {
            status: record.status,
        });
    }
    info!(task_id = %record.id, status = %record.status, "task submitted");
    Ok(record)
}

/// Poll `task_id` until it reaches a terminal state.
///
/// Placeholder ids (all zero/dash filler) are rejected before any network
/// request. Returns the final record on `Completed`; any other terminal
/// state becomes [`OcrError::Processing`] carrying the task's error info.
pub(crate) async fn await_completion(
    transport: &dyn TaskTransport,
    task_id: &TaskId,
    policy: PollPolicy,
) -> Result<TaskStatusRecord, OcrError> {
    if task_id.is_placeholder() {
        return Err(OcrError::InvalidTaskId {
            id: task_id.as_str().to_string(),
        });
    }

    for check in 1..=policy.max_checks {
        sleep(policy.interval).await;
        let record = transport.task_status(task_id).await?;

        if record.status.is_active() {
            debug!(task_id = %task_id, status = %record.status, check, "task still active");
            continue;
        }

        if record.status == TaskStatus::Completed {
            info!(task_id = %task_id, checks = check, results = record.result_urls.len(),
                "task completed");
            return Ok(record);
        }

        let info = record
            .error
            .unwrap_or_else(|| ErrorInfo::from_status(&record.status));
        return Err(OcrError::Processing {
            task_id: task_id.clone(),
            info,
        });
    }

    Err(OcrError::PollBudgetExhausted {
        task_id: task_id.clone(),
        checks: policy.max_checks,
    })
}
