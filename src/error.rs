//! Error types for the ocrcloud library.
//!
//! One [`OcrError`] enum covers every failure the library can surface, but
//! the variants map to distinct layers of the task lifecycle:
//!
//! * `Configuration` — the client could not even be constructed.
//! * `Transport` / `Service` — the HTTP layer failed, or the remote service
//!   answered with a structured error envelope (the envelope wins when both
//!   apply).
//! * `Submission` / `Processing` / `PollBudgetExhausted` — the task state
//!   machine ended somewhere other than `Completed`.
//! * `EmptyResult` / `Download` — the download sequence hit a structural
//!   mismatch or a failed result fetch.
//!
//! The poll loop never retries on error: a single failed status check aborts
//! the whole wait so the caller decides whether to start over.

use crate::task::{ErrorInfo, TaskId, TaskStatus};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ocrcloud library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Construction errors ───────────────────────────────────────────────
    /// Required client setting was empty or invalid.
    #[error("Invalid client configuration: {reason}")]
    Configuration { reason: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// Network or HTTP-layer failure. `status` is 0 when no HTTP response
    /// was received at all (DNS failure, refused connection, timeout).
    #[error("HTTP {status} {status_text} from '{url}'")]
    Transport {
        status: u16,
        status_text: String,
        url: String,
    },

    /// The service answered with a structured error envelope.
    #[error("Service error {code}: {message}")]
    Service {
        code: String,
        message: String,
        target: Option<String>,
    },

    /// A response body could not be decoded as the expected wire dialect.
    #[error("Could not decode {dialect} response: {detail}")]
    Decode {
        dialect: &'static str,
        detail: String,
    },

    // ── Task lifecycle errors ─────────────────────────────────────────────
    /// The task was created but came back in a state that is not active.
    #[error("Task was created in state '{status}' instead of an active state")]
    Submission { status: TaskStatus },

    /// The task reached a terminal state other than `Completed`.
    #[error("Task {task_id} failed during processing: {info}")]
    Processing { task_id: TaskId, info: ErrorInfo },

    /// The task id is a filler/placeholder identifier (e.g. all zeroes) and
    /// will never resolve; polling it would waste the whole poll budget.
    #[error("Task id '{id}' is a placeholder identifier and will never resolve")]
    InvalidTaskId { id: String },

    /// The task was still active after `checks` status queries.
    /// Raise `max_checks` or the poll interval to wait longer.
    #[error("Task {task_id} still active after {checks} status checks")]
    PollBudgetExhausted { task_id: TaskId, checks: u32 },

    // ── Download errors ───────────────────────────────────────────────────
    /// A result URL is pending but every requested export format has already
    /// been consumed — requested formats and returned results disagree.
    #[error("{pending_urls} result URL(s) remain but no requested export format is left to name them")]
    EmptyResult { pending_urls: usize },

    /// Non-2xx response (or a mid-stream read failure) while fetching a
    /// result file.
    #[error("HTTP {status} {status_text} while downloading '{url}'")]
    Download {
        status: u16,
        status_text: String,
        url: String,
    },

    /// `download_result` was called before a successful `process` run.
    #[error("No completed task to download from — run process() first")]
    NoResult,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Local filesystem failure while reading the input or writing a result.
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_carries_url() {
        let e = OcrError::Transport {
            status: 502,
            status_text: "Bad Gateway".into(),
            url: "https://cloud.example.com/v2/getTaskStatus".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("502"), "got: {msg}");
        assert!(msg.contains("getTaskStatus"), "got: {msg}");
    }

    #[test]
    fn service_display_prefers_code_and_message() {
        let e = OcrError::Service {
            code: "InvalidArgument".into(),
            message: "language is not supported".into(),
            target: Some("language".into()),
        };
        assert!(e.to_string().contains("InvalidArgument"));
        assert!(e.to_string().contains("not supported"));
    }

    #[test]
    fn processing_display_includes_error_info() {
        let e = OcrError::Processing {
            task_id: TaskId::new("f3a2"),
            info: ErrorInfo::new("X", "boom"),
        };
        let msg = e.to_string();
        assert!(msg.contains("f3a2"), "got: {msg}");
        assert!(msg.contains("boom"), "got: {msg}");
    }

    #[test]
    fn empty_result_display() {
        let e = OcrError::EmptyResult { pending_urls: 2 };
        assert!(e.to_string().contains("2 result URL(s)"));
    }
}
