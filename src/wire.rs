//! Wire-dialect decoding: legacy XML and current JSON task documents.
//!
//! Two service generations are in the field. The legacy protocol answers
//! with an XML document whose `<task>` element carries everything as
//! attributes (including the positional `resultUrl`/`resultUrl2`/
//! `resultUrl3` variants); the current protocol answers with a JSON object
//! per the documented schema. Both are normalized here, immediately, into
//! [`TaskStatusRecord`] — the dialect never escapes this module.
//!
//! The dialect of a body is resolved by shape (first non-whitespace byte),
//! not by configuration, so a proxy that rewrites one generation into the
//! other still decodes correctly.

use crate::error::OcrError;
use crate::task::{ApplicationInfo, ErrorInfo, TaskId, TaskStatus, TaskStatusRecord};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Xml,
    Json,
}

impl Dialect {
    pub(crate) fn detect(body: &str) -> Dialect {
        match body.trim_start().as_bytes().first() {
            Some(b'<') => Dialect::Xml,
            _ => Dialect::Json,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Dialect::Xml => "XML",
            Dialect::Json => "JSON",
        }
    }
}

// ── Legacy XML shapes ─────────────────────────────────────────────────────

/// `<response><task id=… status=… resultUrl=…/></response>`
#[derive(Debug, Deserialize)]
struct XmlResponse {
    #[serde(rename = "task", default)]
    tasks: Vec<XmlTask>,
}

#[derive(Debug, Deserialize)]
struct XmlTask {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@status")]
    status: String,
    #[serde(rename = "@registrationTime")]
    registration_time: Option<String>,
    #[serde(rename = "@statusChangeTime")]
    status_change_time: Option<String>,
    #[serde(rename = "@filesCount")]
    files_count: Option<u32>,
    #[serde(rename = "@resultUrl")]
    result_url: Option<String>,
    #[serde(rename = "@resultUrl2")]
    result_url2: Option<String>,
    #[serde(rename = "@resultUrl3")]
    result_url3: Option<String>,
    #[serde(rename = "@error")]
    error: Option<String>,
    #[serde(rename = "@description")]
    description: Option<String>,
}

impl XmlTask {
    fn normalize(self) -> TaskStatusRecord {
        let status = TaskStatus::parse(&self.status);
        let error = self
            .error
            .filter(|m| !m.is_empty())
            .map(|m| ErrorInfo::new(status.as_str(), m));
        let result_urls = [self.result_url, self.result_url2, self.result_url3]
            .into_iter()
            .flatten()
            .filter(|u| !u.is_empty())
            .collect();
        TaskStatusRecord {
            id: TaskId::new(self.id),
            status,
            registration_time: self.registration_time,
            status_change_time: self.status_change_time,
            files_count: self.files_count.unwrap_or(1),
            request_status_delay_ms: None,
            result_urls,
            error,
            description: self.description,
        }
    }
}

/// `<error><message>…</message></error>`
#[derive(Debug, Deserialize)]
struct XmlErrorEnvelope {
    message: String,
}

/// `<response><application id=… pages=…/></response>`
#[derive(Debug, Deserialize)]
struct XmlApplicationResponse {
    application: XmlApplication,
}

#[derive(Debug, Deserialize)]
struct XmlApplication {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@displayName")]
    display_name: Option<String>,
    #[serde(rename = "@pages")]
    pages: Option<i64>,
    #[serde(rename = "@fields")]
    fields: Option<i64>,
    #[serde(rename = "@expires")]
    expires: Option<String>,
    #[serde(rename = "@type")]
    account_type: Option<String>,
}

// ── Current JSON shapes ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTask {
    task_id: String,
    status: String,
    registration_time: Option<String>,
    status_change_time: Option<String>,
    files_count: Option<u32>,
    request_status_delay: Option<u64>,
    #[serde(default)]
    result_urls: Vec<String>,
    error: Option<ErrorInfo>,
    description: Option<String>,
}

impl JsonTask {
    fn normalize(self) -> TaskStatusRecord {
        TaskStatusRecord {
            id: TaskId::new(self.task_id),
            status: TaskStatus::parse(&self.status),
            registration_time: self.registration_time,
            status_change_time: self.status_change_time,
            files_count: self.files_count.unwrap_or(1),
            request_status_delay_ms: self.request_status_delay,
            result_urls: self.result_urls.into_iter().filter(|u| !u.is_empty()).collect(),
            error: self.error,
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonTaskList {
    #[serde(default)]
    tasks: Vec<JsonTask>,
}

#[derive(Debug, Deserialize)]
struct JsonErrorEnvelope {
    error: ErrorInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonApplication {
    id: String,
    display_name: Option<String>,
    pages: Option<i64>,
    fields: Option<i64>,
    expires: Option<String>,
    #[serde(rename = "type")]
    account_type: Option<String>,
}

// ── Decoding entry points ─────────────────────────────────────────────────

fn decode_err(dialect: Dialect, e: impl std::fmt::Display) -> OcrError {
    OcrError::Decode {
        dialect: dialect.name(),
        detail: e.to_string(),
    }
}

/// Decode a single-task response body of either dialect.
pub(crate) fn decode_task(body: &str) -> Result<TaskStatusRecord, OcrError> {
    match Dialect::detect(body) {
        Dialect::Xml => {
            let response: XmlResponse =
                quick_xml::de::from_str(body).map_err(|e| decode_err(Dialect::Xml, e))?;
            response
                .tasks
                .into_iter()
                .next()
                .map(XmlTask::normalize)
                .ok_or_else(|| decode_err(Dialect::Xml, "response contains no <task> element"))
        }
        Dialect::Json => {
            let task: JsonTask =
                serde_json::from_str(body).map_err(|e| decode_err(Dialect::Json, e))?;
            Ok(task.normalize())
        }
    }
}

/// Decode a task-list response body of either dialect, preserving server order.
pub(crate) fn decode_task_list(body: &str) -> Result<Vec<TaskStatusRecord>, OcrError> {
    match Dialect::detect(body) {
        Dialect::Xml => {
            let response: XmlResponse =
                quick_xml::de::from_str(body).map_err(|e| decode_err(Dialect::Xml, e))?;
            Ok(response.tasks.into_iter().map(XmlTask::normalize).collect())
        }
        Dialect::Json => {
            let list: JsonTaskList =
                serde_json::from_str(body).map_err(|e| decode_err(Dialect::Json, e))?;
            Ok(list.tasks.into_iter().map(JsonTask::normalize).collect())
        }
    }
}

/// Decode a `getApplicationInfo` response body of either dialect.
pub(crate) fn decode_application_info(body: &str) -> Result<ApplicationInfo, OcrError> {
    match Dialect::detect(body) {
        Dialect::Xml => {
            let response: XmlApplicationResponse =
                quick_xml::de::from_str(body).map_err(|e| decode_err(Dialect::Xml, e))?;
            let app = response.application;
            Ok(ApplicationInfo {
                id: app.id,
                display_name: app.display_name.unwrap_or_default(),
                pages: app.pages.unwrap_or(0),
                fields: app.fields.unwrap_or(0),
                expires: app.expires,
                account_type: app.account_type,
            })
        }
        Dialect::Json => {
            let app: JsonApplication =
                serde_json::from_str(body).map_err(|e| decode_err(Dialect::Json, e))?;
            Ok(ApplicationInfo {
                id: app.id,
                display_name: app.display_name.unwrap_or_default(),
                pages: app.pages.unwrap_or(0),
                fields: app.fields.unwrap_or(0),
                expires: app.expires,
                account_type: app.account_type,
            })
        }
    }
}

/// Try to decode a service error envelope from a non-2xx body.
///
/// Lenient by design: a body that is not an envelope (HTML error page,
/// truncated response) yields `None` and the caller falls back to the
/// generic transport error.
pub(crate) fn maybe_error_envelope(body: &str) -> Option<ErrorInfo> {
    match Dialect::detect(body) {
        Dialect::Xml => quick_xml::de::from_str::<XmlErrorEnvelope>(body)
            .ok()
            .map(|e| ErrorInfo::new("Error", e.message)),
        Dialect::Json => serde_json::from_str::<JsonErrorEnvelope>(body)
            .ok()
            .map(|e| e.error),
    }
}
