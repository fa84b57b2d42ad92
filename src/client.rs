//! The client facade: construction, the process operation, and passthrough
//! reads.
//!
//! One [`OcrClient`] drives at most one task at a time: `process` takes
//! `&mut self`, and the download cursor it produces is owned by the client
//! until [`OcrClient::download_result`] hands it to a sequence. Run several
//! clients on separate tokio tasks for parallel throughput; nothing is
//! shared between instances.

use crate::download::DownloadSequence;
use crate::error::OcrError;
use crate::manifest::DownloadCursor;
use crate::poller::{self, PollPolicy, MIN_POLL_INTERVAL};
use crate::progress::{ObserverSet, ProgressObserver, Signal};
use crate::settings::ProcessingSettings;
use crate::task::{ApplicationInfo, TaskId, TaskStatus, TaskStatusRecord};
use crate::transport::{ApiGeneration, HttpTransport, TaskTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// State carried from a successful `process` run to `download_result`.
struct RunState {
    source_stem: String,
    cursor: DownloadCursor,
}

/// Client for the cloud OCR service.
///
/// # Example
/// ```rust,no_run
/// use ocrcloud::{OcrClient, ProcessingSettings};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = OcrClient::new("my-app", "secret", "https://cloud.example.com")?;
/// let settings = ProcessingSettings::builder()
///     .export_format("txt")
///     .export_format("pdfSearchable")
///     .build()?;
///
/// client.process("scan.png", &settings).await?;
/// let mut results = client.download_result(None)?;
/// while let Some(path) = results.next().await {
///     println!("downloaded: {}", path?.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct OcrClient {
    transport: Arc<dyn TaskTransport>,
    policy: PollPolicy,
    observers: ObserverSet,
    run: Option<RunState>,
}

impl OcrClient {
    /// Create a client with default polling and the current API generation.
    ///
    /// Fails with [`OcrError::Configuration`] if any argument is empty.
    pub fn new(
        application_id: impl Into<String>,
        password: impl Into<String>,
        service_url: impl Into<String>,
    ) -> Result<Self, OcrError> {
        Self::builder()
            .application_id(application_id)
            .password(password)
            .service_url(service_url)
            .build()
    }

    pub fn builder() -> OcrClientBuilder {
        OcrClientBuilder::default()
    }

    /// Register a progress observer. Observers registered after a run has
    /// started only see the remaining signals of that run.
    pub fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.subscribe(observer);
    }

    /// Upload the file at `input` and wait for the task to complete.
    ///
    /// On success the result manifest is resolved and held by the client;
    /// call [`OcrClient::download_result`] to drain it. Starting a new run
    /// discards any undrained manifest from the previous one.
    pub async fn process(
        &mut self,
        input: impl AsRef<Path>,
        settings: &ProcessingSettings,
    ) -> Result<TaskStatusRecord, OcrError> {
        let path = input.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| OcrError::Io {
            action: "read",
            path: path.to_path_buf(),
            source: e,
        })?;
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        self.process_bytes(content, &source_name, settings).await
    }

    /// In-memory variant of [`OcrClient::process`] for content that never
    /// touches the local filesystem. `source_name` names the upload for
    /// progress events and for deriving result filenames.
    pub async fn process_bytes(
        &mut self,
        content: Vec<u8>,
        source_name: &str,
        settings: &ProcessingSettings,
    ) -> Result<TaskStatusRecord, OcrError> {
        self.run = None;

        self.observers.emit(Signal::Uploading, source_name);
        let submitted = poller::submit(self.transport.as_ref(), content, settings).await?;

        self.observers.emit(Signal::Processing, source_name);
        let completed =
            poller::await_completion(self.transport.as_ref(), &submitted.id, self.policy).await?;

        let cursor = DownloadCursor::resolve(&completed, settings.export_formats());
        let source_stem = Path::new(source_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "result".to_string());
        self.run = Some(RunState {
            source_stem,
            cursor,
        });
        Ok(completed)
    }

    /// Begin draining the last completed run's results into `target_dir`
    /// (the process-wide temp directory when `None`).
    ///
    /// Consumes the manifest: a second call without a new `process` run
    /// fails with [`OcrError::NoResult`].
    pub fn download_result(
        &mut self,
        target_dir: Option<PathBuf>,
    ) -> Result<DownloadSequence, OcrError> {
        let run = self.run.take().ok_or(OcrError::NoResult)?;
        Ok(DownloadSequence::new(
            Arc::clone(&self.transport),
            run.cursor,
            run.source_stem,
            target_dir.unwrap_or_else(std::env::temp_dir),
            self.observers.clone(),
        ))
    }

    /// Poll an existing task (e.g. one submitted by an earlier process run
    /// of this application) until it reaches a terminal state.
    pub async fn wait_for_task(&self, task_id: &TaskId) -> Result<TaskStatusRecord, OcrError> {
        poller::await_completion(self.transport.as_ref(), task_id, self.policy).await
    }

    /// Resolve the manifest of an already-completed record into the
    /// client's download state, the way `process` does for its own task.
    ///
    /// Result filenames derive from the record's description (the original
    /// upload name, when the service kept one) or the task id. Fails with
    /// [`OcrError::NoResult`] unless the record's status is `Completed`.
    pub fn adopt_result(
        &mut self,
        record: &TaskStatusRecord,
        settings: &ProcessingSettings,
    ) -> Result<(), OcrError> {
        if record.status != TaskStatus::Completed {
            return Err(OcrError::NoResult);
        }
        let source_stem = record
            .description
            .as_deref()
            .and_then(|d| Path::new(d).file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| record.id.as_str().to_string());
        self.run = Some(RunState {
            source_stem,
            cursor: DownloadCursor::resolve(record, settings.export_formats()),
        });
        Ok(())
    }

    // ── Passthrough reads ─────────────────────────────────────────────────

    pub async fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatusRecord, OcrError> {
        self.transport.task_status(task_id).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
        self.transport.list_tasks().await
    }

    pub async fn list_finished_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
        self.transport.list_finished_tasks().await
    }

    pub async fn get_application_info(&self) -> Result<ApplicationInfo, OcrError> {
        self.transport.application_info().await
    }
}

/// Builder for [`OcrClient`].
#[derive(Default)]
pub struct OcrClientBuilder {
    application_id: String,
    password: String,
    service_url: String,
    generation: ApiGeneration,
    policy: PollPolicy,
    transport: Option<Arc<dyn TaskTransport>>,
}

impl OcrClientBuilder {
    pub fn application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = id.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    pub fn api_generation(mut self, generation: ApiGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Wait between status checks. Clamped to at least
    /// [`MIN_POLL_INTERVAL`] — the service rejects high-frequency polling.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.policy.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Cap on status queries per wait (default
    /// [`crate::poller::DEFAULT_MAX_CHECKS`]). Clamped to at least 1.
    pub fn max_checks(mut self, checks: u32) -> Self {
        self.policy.max_checks = checks.max(1);
        self
    }

    /// Inject a transport, bypassing credential validation and the HTTP
    /// layer entirely. This is the seam the integration tests use.
    pub fn transport(mut self, transport: Arc<dyn TaskTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<OcrClient, OcrError> {
        let transport: Arc<dyn TaskTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                for (value, name) in [
                    (&self.application_id, "application id"),
                    (&self.password, "password"),
                    (&self.service_url, "service URL"),
                ] {
                    if value.trim().is_empty() {
                        return Err(OcrError::Configuration {
                            reason: format!("{name} must not be empty"),
                        });
                    }
                }
                Arc::new(HttpTransport::new(
                    &self.application_id,
                    &self.password,
                    &self.service_url,
                    self.generation,
                )?)
            }
        };

        Ok(OcrClient {
            transport,
            policy: self.policy,
            observers: ObserverSet::default(),
            run: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_succeeds_with_full_credentials() {
        assert!(OcrClient::new("app", "secret", "https://cloud.example.com").is_ok());
    }

    #[test]
    fn each_missing_credential_is_a_configuration_error() {
        for (id, pw, url) in [
            ("", "secret", "https://cloud.example.com"),
            ("app", "", "https://cloud.example.com"),
            ("app", "secret", ""),
            ("  ", "secret", "https://cloud.example.com"),
        ] {
            let result = OcrClient::new(id, pw, url);
            assert!(
                matches!(result, Err(OcrError::Configuration { .. })),
                "expected Configuration error for ({id:?}, {pw:?}, {url:?})"
            );
        }
    }

    #[test]
    fn poll_interval_is_clamped_to_minimum() {
        let client = OcrClient::builder()
            .application_id("app")
            .password("secret")
            .service_url("https://cloud.example.com")
            .poll_interval(Duration::from_millis(100))
            .max_checks(0)
            .build()
            .unwrap();
        assert_eq!(client.policy.interval, MIN_POLL_INTERVAL);
        assert_eq!(client.policy.max_checks, 1);
    }

    #[test]
    fn download_result_before_process_is_no_result() {
        let mut client = OcrClient::new("app", "secret", "https://cloud.example.com").unwrap();
        assert!(matches!(
            client.download_result(None),
            Err(OcrError::NoResult)
        ));
    }
}
