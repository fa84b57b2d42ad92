//! CLI binary for ocrcloud.
//!
//! A thin shim over the library crate that maps CLI flags to client
//! settings, renders lifecycle progress, and prints result paths.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocrcloud::{
    ApiGeneration, OcrClient, ProcessingSettings, ProgressObserver, TaskId, TaskStatusRecord,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal progress observer: one spinner whose message tracks the current
/// lifecycle milestone, plus a log line per downloaded file.
struct CliProgressObserver {
    bar: ProgressBar,
}

impl CliProgressObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for CliProgressObserver {
    fn on_upload_started(&self, filename: &str) {
        self.bar.set_prefix("Uploading");
        self.bar.set_message(filename.to_string());
    }

    fn on_processing_started(&self, filename: &str) {
        self.bar.set_prefix("Processing");
        self.bar.set_message(format!("{filename} (waiting for the service)"));
    }

    fn on_download_started(&self, filename: &str) {
        self.bar.set_prefix("Downloading");
        self.bar.set_message(filename.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recognize a scan to plain text (downloads next to the current directory)
  ocrcloud scan.png -o .

  # Two output formats, German recognition
  ocrcloud --language German --format txt --format pdfSearchable scan.png -o out/

  # Legacy deployment speaking the XML protocol
  ocrcloud --api v1 scan.png

  # Wait for a task submitted earlier, then download its results
  ocrcloud --task-id f3a2c70e-29f1-4e56-9a37-52ab1a1a2e04 --format txt -o out/

  # Account and task housekeeping (no upload)
  ocrcloud --app-info
  ocrcloud --list-finished-tasks

ENVIRONMENT VARIABLES:
  OCRCLOUD_APP_ID       Application id issued by the service
  OCRCLOUD_PASSWORD     Application password
  OCRCLOUD_SERVICE_URL  Service base URL, e.g. https://cloud.example.com

SETUP:
  1. Export credentials:  export OCRCLOUD_APP_ID=... OCRCLOUD_PASSWORD=...
  2. Point at a service:  export OCRCLOUD_SERVICE_URL=https://cloud.example.com
  3. Recognize:           ocrcloud scan.png -o out/
"#;

/// Upload documents to a cloud OCR service and download the converted results.
#[derive(Parser, Debug)]
#[command(
    name = "ocrcloud",
    version,
    about = "Upload documents to a cloud OCR service and download the converted results",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to upload (image or PDF). Omit when using --task-id,
    /// --list-tasks, --list-finished-tasks, or --app-info.
    input: Option<PathBuf>,

    /// Directory to download results into (default: system temp directory).
    #[arg(short, long, env = "OCRCLOUD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Recognition language; repeat (or comma-separate) for multilingual
    /// documents.
    #[arg(long, default_value = "English", value_delimiter = ',')]
    language: Vec<String>,

    /// Export format (txt, rtf, docx, xlsx, pptx, pdfSearchable, pdfTextAndImages,
    /// xml); repeat (or comma-separate) for up to three outputs.
    #[arg(long, default_value = "txt", value_delimiter = ',')]
    format: Vec<String>,

    /// Extra query options forwarded to the service verbatim,
    /// e.g. "profile=documentConversion&textType=normal".
    #[arg(long, default_value = "")]
    custom_options: String,

    /// Protocol generation of the service deployment.
    #[arg(long, value_enum, default_value = "v2")]
    api: ApiArg,

    /// Seconds between status checks (minimum 2).
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Maximum number of status checks before giving up.
    #[arg(long, default_value_t = 120)]
    max_checks: u32,

    /// Wait for an existing task instead of uploading; --format decides the
    /// downloaded extensions.
    #[arg(long, conflicts_with = "input")]
    task_id: Option<String>,

    /// List all tasks known to the application and exit.
    #[arg(long)]
    list_tasks: bool,

    /// List finished tasks and exit.
    #[arg(long)]
    list_finished_tasks: bool,

    /// Print application account info and exit.
    #[arg(long)]
    app_info: bool,

    /// Application id.
    #[arg(long, env = "OCRCLOUD_APP_ID", hide_env_values = true)]
    app_id: String,

    /// Application password.
    #[arg(long, env = "OCRCLOUD_PASSWORD", hide_env_values = true)]
    password: String,

    /// Service base URL.
    #[arg(long, env = "OCRCLOUD_SERVICE_URL")]
    service_url: String,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and result paths.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ApiArg {
    V1,
    V2,
}

impl From<ApiArg> for ApiGeneration {
    fn from(v: ApiArg) -> Self {
        match v {
            ApiArg::V1 => ApiGeneration::V1,
            ApiArg::V2 => ApiGeneration::V2,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the primary feedback channel; library logs stay at
    // error level unless --verbose asks for more.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let mut client = OcrClient::builder()
        .application_id(&cli.app_id)
        .password(&cli.password)
        .service_url(&cli.service_url)
        .api_generation(cli.api.into())
        .poll_interval(Duration::from_secs(cli.poll_interval))
        .max_checks(cli.max_checks)
        .build()
        .context("Invalid client configuration")?;

    // ── Read-only modes ──────────────────────────────────────────────────
    if cli.app_info {
        let info = client
            .get_application_info()
            .await
            .context("Failed to fetch application info")?;
        println!("Application:  {}", info.id);
        if !info.display_name.is_empty() {
            println!("Name:         {}", info.display_name);
        }
        println!("Pages left:   {}", info.pages);
        println!("Fields left:  {}", info.fields);
        if let Some(expires) = info.expires {
            println!("Expires:      {expires}");
        }
        if let Some(kind) = info.account_type {
            println!("Type:         {kind}");
        }
        return Ok(());
    }

    if cli.list_tasks || cli.list_finished_tasks {
        let tasks = if cli.list_finished_tasks {
            client.list_finished_tasks().await
        } else {
            client.list_tasks().await
        }
        .context("Failed to list tasks")?;
        print_task_table(&tasks);
        return Ok(());
    }

    // ── Processing modes ─────────────────────────────────────────────────
    let settings = build_settings(&cli)?;
    let show_progress = !cli.quiet && !cli.no_progress;
    let observer = if show_progress {
        let obs = CliProgressObserver::new();
        client.subscribe(Arc::clone(&obs) as Arc<dyn ProgressObserver>);
        Some(obs)
    } else {
        None
    };

    let record = if let Some(ref id) = cli.task_id {
        // Waiting on an existing task: emulate process() by waiting, then
        // resolving the manifest against the requested formats.
        let record = client
            .wait_for_task(&TaskId::new(id.clone()))
            .await
            .context("Task did not complete")?;
        client
            .adopt_result(&record, &settings)
            .context("Task has no downloadable result")?;
        record
    } else {
        let input = cli
            .input
            .as_ref()
            .context("Provide an input file, --task-id, or one of the listing flags")?;
        client
            .process(input, &settings)
            .await
            .context("Processing failed")?
    };

    let mut results = client
        .download_result(cli.output_dir.clone())
        .context("No results to download")?;

    let mut downloaded = 0usize;
    while let Some(step) = results.next().await {
        let path = step.context("Download failed")?;
        downloaded += 1;
        if let Some(ref obs) = observer {
            obs.bar
                .println(format!("  {} {}", green("✓"), path.display()));
        }
        if cli.quiet || cli.no_progress {
            println!("{}", path.display());
        }
    }

    if let Some(obs) = observer {
        obs.finish();
    }
    if !cli.quiet {
        eprintln!(
            "{} {} file(s) from task {}  {}",
            green("✔"),
            bold(&downloaded.to_string()),
            record.id,
            dim(&format!("status {}", record.status)),
        );
    }

    Ok(())
}

/// Map CLI args to `ProcessingSettings`.
fn build_settings(cli: &Cli) -> Result<ProcessingSettings> {
    let mut builder = ProcessingSettings::builder();
    for language in &cli.language {
        builder = builder.language(language);
    }
    for format in &cli.format {
        builder = builder.export_format(format);
    }
    if !cli.custom_options.is_empty() {
        builder = builder.custom_options(&cli.custom_options);
    }
    builder.build().context("Invalid processing settings")
}

fn print_task_table(tasks: &[TaskStatusRecord]) {
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }
    println!("{:<38} {:<17} {:<8} REGISTERED", "TASK", "STATUS", "FILES");
    for task in tasks {
        println!(
            "{:<38} {:<17} {:<8} {}",
            task.id,
            task.status.to_string(),
            task.files_count,
            task.registration_time.as_deref().unwrap_or("-"),
        );
    }
}
