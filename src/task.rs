//! Task identity, status state machine, and the normalized status record.
//!
//! Both wire dialects (legacy XML, current JSON) decode into the one
//! [`TaskStatusRecord`] defined here; nothing above the transport layer ever
//! sees the dialect distinction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, server-assigned task identifier.
///
/// Stable for the task's lifetime. Construction never fails — the service
/// occasionally hands back filler identifiers (all zeroes) on bad requests,
/// and those must survive decoding so the poller can reject them with a
/// meaningful error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or consists entirely of `0`/`-` filler
    /// characters (e.g. `00000000-0000-0000-0000-000000000000`). Such an id
    /// will never resolve and must not be polled.
    pub fn is_placeholder(&self) -> bool {
        self.0.is_empty() || self.0.chars().all(|c| c == '0' || c == '-')
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The task state machine: `Submitted → {Queued, InProgress} → {Completed,
/// ProcessingFailed}`, plus the terminal states the service can enter
/// directly (`Deleted`, `NotEnoughCredits`).
///
/// `Unknown` preserves any status string a newer service revision may add;
/// it is treated as terminal-non-success so the poller fails loudly instead
/// of spinning on a state it cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Submitted,
    Queued,
    InProgress,
    Completed,
    ProcessingFailed,
    Deleted,
    NotEnoughCredits,
    Unknown(String),
}

impl TaskStatus {
    /// Parse the wire status string. Unrecognized strings are preserved in
    /// `Unknown` rather than rejected.
    pub fn parse(s: &str) -> Self {
        match s {
            "Submitted" => TaskStatus::Submitted,
            "Queued" => TaskStatus::Queued,
            "InProgress" => TaskStatus::InProgress,
            "Completed" => TaskStatus::Completed,
            "ProcessingFailed" => TaskStatus::ProcessingFailed,
            "Deleted" => TaskStatus::Deleted,
            "NotEnoughCredits" => TaskStatus::NotEnoughCredits,
            other => TaskStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Submitted => "Submitted",
            TaskStatus::Queued => "Queued",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Completed => "Completed",
            TaskStatus::ProcessingFailed => "ProcessingFailed",
            TaskStatus::Deleted => "Deleted",
            TaskStatus::NotEnoughCredits => "NotEnoughCredits",
            TaskStatus::Unknown(s) => s,
        }
    }

    /// Active = the task has not finished yet and is worth polling again.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Submitted | TaskStatus::Queued | TaskStatus::InProgress
        )
    }

    /// Terminal = the task will not change state again.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload attached to a terminal-failure task, or carried
/// by a service error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Nested sub-errors, when the service reports more than one cause.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorInfo>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
        }
    }

    /// Synthesized info for a terminal-failure record that carried no error
    /// payload of its own.
    pub(crate) fn from_status(status: &TaskStatus) -> Self {
        Self::new(
            status.as_str(),
            format!("task ended in state '{status}' without error details"),
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref target) = self.target {
            write!(f, " (target: {target})")?;
        }
        Ok(())
    }
}

/// Normalized view of one remote job, identical for both wire dialects.
///
/// `result_urls` is populated only once the task is terminal-success;
/// `error` only on terminal failure. The remaining fields are passthrough
/// metadata the current JSON dialect documents — the legacy dialect fills
/// what it has and defaults the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    pub registration_time: Option<String>,
    pub status_change_time: Option<String>,
    pub files_count: u32,
    /// Server hint for how long to wait before the next status query, in
    /// milliseconds. Advisory only; the poll interval is client-configured.
    pub request_status_delay_ms: Option<u64>,
    pub result_urls: Vec<String>,
    pub error: Option<ErrorInfo>,
    pub description: Option<String>,
}

/// Account-level metadata returned by `getApplicationInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub id: String,
    pub display_name: String,
    pub pages: i64,
    pub fields: i64,
    pub expires: Option<String>,
    pub account_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_detected() {
        assert!(TaskId::new("").is_placeholder());
        assert!(TaskId::new("0000").is_placeholder());
        assert!(TaskId::new("00000000-0000-0000-0000-000000000000").is_placeholder());
        assert!(!TaskId::new("00000000-0000-4000-0000-000000000001").is_placeholder());
        assert!(!TaskId::new("f3a2c70e-29f1-4e56-9a37-52ab1a1a2e04").is_placeholder());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            "Submitted",
            "Queued",
            "InProgress",
            "Completed",
            "ProcessingFailed",
            "Deleted",
            "NotEnoughCredits",
        ] {
            assert_eq!(TaskStatus::parse(s).as_str(), s);
        }
        assert_eq!(
            TaskStatus::parse("ArchiveBroken"),
            TaskStatus::Unknown("ArchiveBroken".into())
        );
    }

    #[test]
    fn active_and_terminal_partition_the_states() {
        assert!(TaskStatus::Submitted.is_active());
        assert!(TaskStatus::Queued.is_active());
        assert!(TaskStatus::InProgress.is_active());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::ProcessingFailed.is_terminal());
        assert!(TaskStatus::Deleted.is_terminal());
        assert!(TaskStatus::NotEnoughCredits.is_terminal());
        // A status we cannot interpret must not be polled forever.
        assert!(TaskStatus::Unknown("Paused".into()).is_terminal());
    }

    #[test]
    fn error_info_display_includes_target() {
        let mut info = ErrorInfo::new("InvalidArgument", "bad language");
        info.target = Some("language".into());
        let s = info.to_string();
        assert!(s.contains("InvalidArgument: bad language"));
        assert!(s.contains("target: language"));
    }
}
