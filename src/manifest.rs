//! Result manifest resolution: from a completed task to a download cursor.
//!
//! A completed task exposes up to [`crate::settings::MAX_EXPORT_FORMATS`]
//! result locations, one per requested export format, in server order. This
//! module pairs those locations with the file extension each format should
//! produce and hands the pair queues to the download sequence.
//!
//! Extension convention: a format name that begins with a recognized short
//! code maps to the short code alone (`pdfSearchable` → `pdf`,
//! `txtUnstructured` → `txt`); anything else is used verbatim. Service
//! revisions have disagreed on this mapping, so it lives in one function
//! with explicit tests for both halves.

use crate::error::OcrError;
use crate::task::TaskStatusRecord;
use std::collections::VecDeque;

/// Short codes recognized as extension prefixes, tried in order.
const SHORT_CODES: [&str; 7] = ["txt", "rtf", "docx", "xlsx", "pptx", "pdf", "xml"];

/// Map one requested export format to the target file extension.
pub fn extension_for_format(format: &str) -> String {
    let format = format.trim();
    let lowered = format.to_ascii_lowercase();
    for code in SHORT_CODES {
        if lowered.starts_with(code) {
            return code.to_string();
        }
    }
    format.to_string()
}

/// Paired queues of pending result URLs and target extensions, drained in
/// lock-step by the download sequence.
///
/// The queue lengths may legitimately differ: fewer URLs than formats means
/// the service produced a partial result, and the sequence simply ends
/// early. A URL with no extension left to name it is the structural
/// mismatch reported as [`OcrError::EmptyResult`].
#[derive(Debug, Default)]
pub(crate) struct DownloadCursor {
    urls: VecDeque<String>,
    extensions: VecDeque<String>,
}

impl DownloadCursor {
    /// Build the cursor for a terminal-success record and the formats the
    /// submission requested.
    pub(crate) fn resolve(record: &TaskStatusRecord, requested_formats: &[String]) -> Self {
        Self {
            urls: record.result_urls.iter().cloned().collect(),
            extensions: requested_formats
                .iter()
                .map(|f| extension_for_format(f))
                .collect(),
        }
    }

    /// Dequeue the next (url, extension) pair.
    ///
    /// `Ok(None)` means the sequence is exhausted — the URL queue is the
    /// terminal condition, covering both the empty manifest and the
    /// partial-result case.
    pub(crate) fn next_pair(&mut self) -> Result<Option<(String, String)>, OcrError> {
        let Some(url) = self.urls.pop_front() else {
            return Ok(None);
        };
        match self.extensions.pop_front() {
            Some(extension) => Ok(Some((url, extension))),
            None => Err(OcrError::EmptyResult {
                pending_urls: self.urls.len() + 1,
            }),
        }
    }

    /// Result URLs not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.urls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskId, TaskStatus};

    fn completed_record(urls: &[&str]) -> TaskStatusRecord {
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

    #[test]
    fn recognized_prefixes_map_to_short_codes() {
        assert_eq!(extension_for_format("txt"), "txt");
        assert_eq!(extension_for_format("txtUnstructured"), "txt");
        assert_eq!(extension_for_format("pdfSearchable"), "pdf");
        assert_eq!(extension_for_format("pdfTextAndImages"), "pdf");
        assert_eq!(extension_for_format("pdfa"), "pdf");
        assert_eq!(extension_for_format("xmlForCorrectedImage"), "xml");
        assert_eq!(extension_for_format("docx"), "docx");
    }

    #[test]
    fn unrecognized_formats_are_used_verbatim() {
        assert_eq!(extension_for_format("vCard"), "vCard");
        assert_eq!(extension_for_format("csv"), "csv");
    }

    #[test]
    fn cursor_pairs_urls_with_extensions_in_order() {
        let record = completed_record(&["https://x/1", "https://x/2"]);
        let mut cursor =
            DownloadCursor::resolve(&record, &["txt".to_string(), "pdfSearchable".to_string()]);

        assert_eq!(
            cursor.next_pair().unwrap(),
            Some(("https://x/1".into(), "txt".into()))
        );
        assert_eq!(
            cursor.next_pair().unwrap(),
            Some(("https://x/2".into(), "pdf".into()))
        );
        assert_eq!(cursor.next_pair().unwrap(), None);
    }

    #[test]
    fn empty_manifest_is_exhausted_not_an_error() {
        let record = completed_record(&[]);
        let mut cursor = DownloadCursor::resolve(&record, &["txt".to_string()]);
        assert_eq!(cursor.next_pair().unwrap(), None);
    }

    #[test]
    fn fewer_urls_than_formats_ends_early() {
        let record = completed_record(&["https://x/1"]);
        let mut cursor =
            DownloadCursor::resolve(&record, &["txt".to_string(), "pdf".to_string()]);
        assert!(cursor.next_pair().unwrap().is_some());
        assert_eq!(cursor.next_pair().unwrap(), None);
    }

    #[test]
    fn url_without_extension_is_a_structural_mismatch() {
        let record = completed_record(&["https://x/1", "https://x/2", "https://x/3"]);
        let mut cursor = DownloadCursor::resolve(&record, &["txt".to_string()]);
        assert!(cursor.next_pair().unwrap().is_some());
        let err = cursor.next_pair().unwrap_err();
        match err {
            OcrError::EmptyResult { pending_urls } => assert_eq!(pending_urls, 2),
            other => panic!("expected EmptyResult, got {other:?}"),
        }
    }
}
