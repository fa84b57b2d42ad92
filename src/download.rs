//! The download sequence: lazy, ordered, forward-only result fetching.
//!
//! One completed task yields up to three converted files. Rather than
//! buffering them all, [`DownloadSequence`] performs one fetch-and-persist
//! per [`DownloadSequence::next`] call, so a caller can consume results
//! incrementally — print the text output while the PDF is still pending,
//! say. The sequence ends when the result-URL queue is empty and cannot be
//! restarted; a new `process` run builds a new sequence.

use crate::error::OcrError;
use crate::manifest::DownloadCursor;
use crate::progress::{ObserverSet, Signal};
use crate::transport::TaskTransport;
use futures::stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::debug;

/// A boxed stream of downloaded result paths.
pub type ResultPathStream = Pin<Box<dyn Stream<Item = Result<PathBuf, OcrError>> + Send>>;

/// Lazy iterator over a completed task's result files.
///
/// Obtained from [`crate::client::OcrClient::download_result`]. Each step
/// fetches one result location and yields the absolute path it was written
/// to. Steps are independent: an error from one step is yielded in place
/// and the caller may keep going or stop.
pub struct DownloadSequence {
    transport: Arc<dyn TaskTransport>,
    cursor: DownloadCursor,
    source_stem: String,
    target_dir: PathBuf,
    observers: ObserverSet,
}

impl DownloadSequence {
    pub(crate) fn new(
        transport: Arc<dyn TaskTransport>,
        cursor: DownloadCursor,
        source_stem: String,
        target_dir: PathBuf,
        observers: ObserverSet,
    ) -> Self {
        Self {
            transport,
            cursor,
            source_stem,
            target_dir,
            observers,
        }
    }

    /// Fetch the next pending result, or `None` once the sequence is
    /// exhausted.
    pub async fn next(&mut self) -> Option<Result<PathBuf, OcrError>> {
        let pair = match self.cursor.next_pair() {
            Ok(Some(pair)) => pair,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        Some(self.fetch_one(pair).await)
    }

    /// Result files not yet downloaded.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Adapt the sequence into a `Stream` for `StreamExt` combinators.
    pub fn into_stream(self) -> ResultPathStream {
        Box::pin(stream::unfold(self, |mut seq| async move {
            seq.next().await.map(|item| (item, seq))
        }))
    }

    async fn fetch_one(&self, (url, extension): (String, String)) -> Result<PathBuf, OcrError> {
        let filename = format!("{}.{extension}", self.source_stem);
        let dest = self.target_dir.join(&filename);

        self.observers.emit(Signal::Downloading, &filename);
        debug!(url, dest = %dest.display(), "fetching result");
        self.transport.fetch_result(&url, &dest).await?;

        // Yield an absolute path even when the target directory was given
        // relative to the working directory.
        if dest.is_absolute() {
            Ok(dest)
        } else {
            match std::env::current_dir() {
                Ok(cwd) => Ok(cwd.join(dest)),
                Err(_) => Ok(dest),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ProcessingSettings;
    use crate::task::{ApplicationInfo, TaskId, TaskStatus, TaskStatusRecord};
    use async_trait::async_trait;
    use std::path::Path;

    /// Writes fixed bytes to whatever destination it is asked for.
    struct FileWritingTransport;

    #[async_trait]
    impl TaskTransport for FileWritingTransport {
        async fn submit(
            &self,
            _content: Vec<u8>,
            _settings: &ProcessingSettings,
        ) -> Result<TaskStatusRecord, OcrError> {
            unimplemented!("not used by download tests")
        }

        async fn task_status(&self, _id: &TaskId) -> Result<TaskStatusRecord, OcrError> {
            unimplemented!("not used by download tests")
        }

        async fn list_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
            unimplemented!("not used by download tests")
        }

        async fn list_finished_tasks(&self) -> Result<Vec<TaskStatusRecord>, OcrError> {
            unimplemented!("not used by download tests")
        }

        async fn application_info(&self) -> Result<ApplicationInfo, OcrError> {
            unimplemented!("not used by download tests")
        }

        async fn fetch_result(&self, _url: &str, dest: &Path) -> Result<(), OcrError> {
            tokio::fs::write(dest, b"converted output")
                .await
                .map_err(|e| OcrError::Io {
                    action: "write",
                    path: dest.to_path_buf(),
                    source: e,
                })
        }
    }

    fn record_with_urls(urls: &[&str]) -> TaskStatusRecord {
        TaskStatusRecord {
            id: TaskId::new("t1"),
            status: TaskStatus::Completed,
            registration_time: None,
            status_change_time: None,
            files_count: urls.len() as u32,
            request_status_delay_ms: None,
            result_urls: urls.iter().map(|u| u.to_string()).collect(),
            error: None,
            description: None,
        }
    }

    fn sequence(urls: &[&str], formats: &[&str], dir: &Path) -> DownloadSequence {
        let record = record_with_urls(urls);
        let formats: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
        DownloadSequence::new(
            Arc::new(FileWritingTransport),
            DownloadCursor::resolve(&record, &formats),
            "invoice".to_string(),
            dir.to_path_buf(),
            ObserverSet::default(),
        )
    }

    #[tokio::test]
    async fn yields_paths_with_mapped_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = sequence(
            &["https://x/1", "https://x/2"],
            &["txt", "pdfSearchable"],
            dir.path(),
        );

        let first = seq.next().await.unwrap().unwrap();
        assert_eq!(first.file_name().unwrap(), "invoice.txt");
        assert!(first.is_absolute());

        let second = seq.next().await.unwrap().unwrap();
        assert_eq!(second.file_name().unwrap(), "invoice.pdf");
        assert_eq!(
            tokio::fs::read(&second).await.unwrap(),
            b"converted output"
        );

        assert!(seq.next().await.is_none());
        // Exhausted for good — not restartable.
        assert!(seq.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_manifest_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = sequence(&[], &["txt"], dir.path());
        assert!(seq.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_adapter_collects_all_results() {
        use futures::StreamExt;

        let dir = tempfile::tempdir().unwrap();
        let seq = sequence(&["https://x/1", "https://x/2"], &["txt", "pdf"], dir.path());
        let paths: Vec<_> = seq.into_stream().collect().await;
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_ok()));
    }
}
