//! # ocrcloud
//!
//! Client library and CLI for a cloud OCR web service: upload a document,
//! poll the remote task until it completes, download the converted results.
//!
//! ## Why this crate?
//!
//! The service runs recognition asynchronously: a submission creates a
//! long-running remote task, and results appear only once the task reaches
//! a terminal state. Getting that lifecycle right — paced polling the
//! service will accept, terminal vs. non-terminal state interpretation,
//! lazy multi-file downloads keyed off the result manifest — is where the
//! real work is, and this crate owns all of it behind one small client.
//!
//! ## Lifecycle Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Submit    upload bytes, settings as query params (Basic auth)
//!  ├─ 2. Poll      wait-then-query loop, bounded by max_checks
//!  ├─ 3. Resolve   result manifest → (URL, extension) download cursor
//!  └─ 4. Download  lazy sequence, one streamed fetch per result file
//! ```
//!
//! Both service generations are supported — the legacy XML protocol and the
//! current JSON one — and normalize to the same [`TaskStatusRecord`] at the
//! transport boundary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocrcloud::{OcrClient, ProcessingSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = OcrClient::new("my-app", "secret", "https://cloud.example.com")?;
//!     let settings = ProcessingSettings::builder()
//!         .language("English")
//!         .export_format("txt")
//!         .build()?;
//!
//!     client.process("scan.png", &settings).await?;
//!
//!     let mut results = client.download_result(None)?;
//!     while let Some(path) = results.next().await {
//!         println!("{}", path?.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocrcloud` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocrcloud = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod download;
pub mod error;
pub mod manifest;
pub mod poller;
pub mod progress;
pub mod settings;
pub mod task;
pub mod transport;

mod wire;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{OcrClient, OcrClientBuilder};
pub use download::{DownloadSequence, ResultPathStream};
pub use error::OcrError;
pub use manifest::extension_for_format;
pub use poller::{DEFAULT_MAX_CHECKS, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use progress::{NoopProgressObserver, ProgressObserver};
pub use settings::{ProcessingSettings, ProcessingSettingsBuilder, MAX_EXPORT_FORMATS};
pub use task::{ApplicationInfo, ErrorInfo, TaskId, TaskStatus, TaskStatusRecord};
pub use transport::{ApiGeneration, HttpTransport, TaskTransport};
