//! Authenticated HTTP transport for the OCR service.
//!
//! [`TaskTransport`] is the seam between the task lifecycle machinery and
//! the network: the poller, client facade, and download sequence depend only
//! on the trait, so tests drive them with scripted implementations and never
//! open a socket. [`HttpTransport`] is the production implementation.
//!
//! No retry lives at this layer. The only repeated request in the library is
//! the poller's scheduled re-query of an active task, which is normal
//! progress, not error recovery.

use crate::error::OcrError;
use crate::settings::ProcessingSettings;
use crate::task::{ApplicationInfo, TaskId, TaskStatusRecord};
use crate::wire;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Which protocol generation the service deployment speaks.
///
/// The generation selects endpoint paths only; response bodies are decoded
/// by shape (see [`crate::wire`]), and authentication is the same
/// `Authorization: Basic` header for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiGeneration {
    /// Legacy protocol: operations at the service root, XML responses.
    V1,
    /// Current protocol: operations under `/v2/`, JSON responses. (default)
    #[default]
    V2,
}

/// Timeout applied to each status/metadata request. Result downloads are
/// exempt — they stream arbitrarily large files and are bounded by the
/// caller instead.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Network operations the task lifecycle needs.
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Upload raw file content with the settings encoded as query
    /// parameters; returns the freshly created task's status record.
    async fn submit(
        &self,
        content: Vec<u8>,
        settings: &ProcessingSettings,
    ) -> Result<TaskStatusRecord, OcrError>;

    /// Query the current status of one task.
    async fn task_status(&self, id: &TaskId) -> Result<TaskStatusRecord, OcrError>;

    /// All tasks known to the application, in server order.
    async fn list_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError>;

    /// Tasks in a terminal state, in server order.
    async fn list_finished_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError>;

    /// Account metadata for the authenticated application.
    async fn application_info(&self) -> Result<ApplicationInfo, OcrError>;

    /// Stream one result location to `dest`. The file handle is closed and
    /// flushed on every exit path; a mid-stream failure propagates and the
    /// partial file is left for the caller to clean up.
    async fn fetch_result(&self, url: &str, dest: &Path) -> Result<(), OcrError>;
}

/// Production transport: reqwest + Basic auth against a service base URL.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
    generation: ApiGeneration,
}

impl HttpTransport {
    pub fn new(
        application_id: &str,
        password: &str,
        base_url: &str,
        generation: ApiGeneration,
    ) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| OcrError::Configuration {
                reason: format!("could not build HTTP client: {e}"),
            })?;
        let credential = STANDARD.encode(format!("{application_id}:{password}"));
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {credential}"),
            generation,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        match self.generation {
            ApiGeneration::V1 => format!("{}/{operation}", self.base_url),
            ApiGeneration::V2 => format!("{}/v2/{operation}", self.base_url),
        }
    }

    /// Issue one authenticated request and return the response body.
    ///
    /// Non-2xx responses are decoded as a service error envelope when the
    /// body carries one (`OcrError::Service` takes precedence); otherwise
    /// the generic `OcrError::Transport` is returned.
    async fn call(
        &self,
        operation: &str,
        params: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<String, OcrError> {
        let url = self.endpoint(operation);
        let request = match body {
            Some(bytes) => self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
            None => self.http.get(&url),
        };
        let response = request
            .header(AUTHORIZATION, &self.auth_header)
            .query(params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| OcrError::Transport {
                status: 0,
                status_text: e.to_string(),
                url: url.clone(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| OcrError::Transport {
            status: status.as_u16(),
            status_text: format!("body read failed: {e}"),
            url: url.clone(),
        })?;

        if !status.is_success() {
            if let Some(info) = wire::maybe_error_envelope(&text) {
                return Err(OcrError::Service {
                    code: info.code,
                    message: info.message,
                    target: info.target,
                });
            }
            return Err(OcrError::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                url,
            });
        }

        debug!(operation, status = status.as_u16(), "service call ok");
        Ok(text)
    }
}

#[async_trait]
impl TaskTransport for HttpTransport {
    #[instrument(skip(self, content, settings), fields(bytes = content.len()))]
    async fn submit(
        &self,
        content: Vec<u8>,
        settings: &ProcessingSettings,
    ) -> Result<TaskStatusRecord, OcrError> {
        let body = self
            .call("processImage", &settings.query_params(), Some(content))
            .await?;
        wire::decode_task(&body)
    }

    async fn task_status(&self, id: &TaskId) -> Result<TaskStatusRecord, OcrError> {
        let params = [("taskId".to_string(), id.as_str().to_string())];
        let body = self.call("getTaskStatus", &params, None).await?;
        wire::decode_task(&body)
    }

    async fn list_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
        let body = self.call("listTasks", &[], None).await?;
        wire::decode_task_list(&body)
    }

    async fn list_finished_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
        let body = self.call("listFinishedTasks", &[], None).await?;
        wire::decode_task_list(&body)
    }

    async fn application_info(&self) -> Result<ApplicationInfo, OcrError> {
        let body = self.call("getApplicationInfo", &[], None).await?;
        wire::decode_application_info(&body)
    }

    async fn fetch_result(&self, url: &str, dest: &Path) -> Result<(), OcrError> {
        // Result locations are pre-signed storage URLs; credentials are not
        // re-sent and no request timeout is applied to the streamed body.
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OcrError::Download {
                status: 0,
                status_text: e.to_string(),
                url: url.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Download {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| OcrError::Io {
                action: "create",
                path: dest.to_path_buf(),
                source: e,
            })?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| OcrError::Download {
                status: status.as_u16(),
                status_text: format!("body read failed: {e}"),
                url: url.to_string(),
            })?;
            file.write_all(&chunk).await.map_err(|e| OcrError::Io {
                action: "write",
                path: dest.to_path_buf(),
                source: e,
            })?;
        }

        file.flush().await.map_err(|e| OcrError::Io {
            action: "flush",
            path: dest.to_path_buf(),
            source: e,
        })?;
        debug!(url, dest = %dest.display(), "result downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(generation: ApiGeneration) -> HttpTransport {
        HttpTransport::new("app", "secret", "https://cloud.example.com/", generation).unwrap()
    }

    #[test]
    fn endpoints_differ_by_generation() {
        assert_eq!(
            transport(ApiGeneration::V1).endpoint("getTaskStatus"),
            "https://cloud.example.com/getTaskStatus"
        );
        assert_eq!(
            transport(ApiGeneration::V2).endpoint("getTaskStatus"),
            "https://cloud.example.com/v2/getTaskStatus"
        );
    }

    #[test]
    fn auth_header_is_basic_base64() {
        let t = transport(ApiGeneration::V2);
        // base64("app:secret")
        assert_eq!(t.auth_header, "Basic YXBwOnNlY3JldA==");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let t = HttpTransport::new("a", "b", "https://x.example//", ApiGeneration::V2).unwrap();
        assert_eq!(t.endpoint("listTasks"), "https://x.example/v2/listTasks");
    }
}
