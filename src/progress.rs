//! Progress-observer trait for task lifecycle milestones.
//!
//! Register an [`Arc<dyn ProgressObserver>`] via
//! [`crate::client::OcrClient::subscribe`] before a run to receive the three
//! lifecycle signals: upload started, processing started, download started.
//! Delivery is synchronous and in registration order; a panicking observer
//! is isolated and logged, never aborting the task or download it was
//! watching.
//!
//! Observers can forward the signals anywhere — a progress bar, a log, a
//! channel — without the library knowing how the host application
//! communicates. The trait is `Send + Sync` so a client can be driven from
//! any tokio task.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Called by the client as a task run crosses each lifecycle milestone.
///
/// All methods have default no-op implementations so observers only override
/// what they care about.
pub trait ProgressObserver: Send + Sync {
    /// The input file is about to be uploaded.
    fn on_upload_started(&self, filename: &str) {
        let _ = filename;
    }

    /// The task was accepted and the poll loop is about to begin.
    fn on_processing_started(&self, filename: &str) {
        let _ = filename;
    }

    /// One result file is about to be fetched. Fired once per result, with
    /// the target filename.
    fn on_download_started(&self, filename: &str) {
        let _ = filename;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressObserver;

impl ProgressObserver for NoopProgressObserver {}

/// The three lifecycle milestones, in the order they occur for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Uploading,
    Processing,
    Downloading,
}

/// Ordered set of registered observers.
///
/// Cloning shares the same observer list (each entry is an `Arc`), which is
/// how the download sequence keeps publishing after it detaches from the
/// client.
#[derive(Clone, Default)]
pub(crate) struct ObserverSet {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ObserverSet {
    pub(crate) fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Deliver one signal to every observer, in registration order. A panic
    /// in one observer is caught and logged; later observers still run.
    pub(crate) fn emit(&self, signal: Signal, filename: &str) {
        for observer in &self.observers {
            let delivery = catch_unwind(AssertUnwindSafe(|| match signal {
                Signal::Uploading => observer.on_upload_started(filename),
                Signal::Processing => observer.on_processing_started(filename),
                Signal::Downloading => observer.on_download_started(filename),
            }));
            if delivery.is_err() {
                warn!(?signal, filename, "progress observer panicked; continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingObserver {
        events: Arc<Mutex<Vec<String>>>,
        tag: &'static str,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_upload_started(&self, filename: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:upload:{filename}", self.tag));
        }

        fn on_download_started(&self, filename: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:download:{filename}", self.tag));
        }
    }

    struct PanickingObserver;

    impl ProgressObserver for PanickingObserver {
        fn on_upload_started(&self, _filename: &str) {
            panic!("observer bug");
        }
    }

    #[test]
    fn delivery_follows_registration_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut set = ObserverSet::default();
        set.subscribe(Arc::new(RecordingObserver {
            events: Arc::clone(&events),
            tag: "first",
        }));
        set.subscribe(Arc::new(RecordingObserver {
            events: Arc::clone(&events),
            tag: "second",
        }));

        set.emit(Signal::Uploading, "scan.png");

        let seen = events.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["first:upload:scan.png", "second:upload:scan.png"]
        );
    }

    #[test]
    fn panicking_observer_does_not_stop_delivery() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut set = ObserverSet::default();
        set.subscribe(Arc::new(PanickingObserver));
        set.subscribe(Arc::new(RecordingObserver {
            events: Arc::clone(&events),
            tag: "after",
        }));

        set.emit(Signal::Uploading, "scan.png");

        assert_eq!(*events.lock().unwrap(), vec!["after:upload:scan.png"]);
    }

    #[test]
    fn default_methods_are_noops() {
        let set = {
            let mut s = ObserverSet::default();
            s.subscribe(Arc::new(NoopProgressObserver));
            s
        };
        set.emit(Signal::Uploading, "a");
        set.emit(Signal::Processing, "a");
        set.emit(Signal::Downloading, "a");
    }
}
