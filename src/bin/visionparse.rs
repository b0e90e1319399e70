//! CLI binary for visionparse.
//!
//! A thin shim over the library crate: it stands in for the upload web
//! layer, reading files from disk, running one batch, and writing the report
//! into an output directory.

use anyhow::{Context, Result};
use clap::Parser;
use visionparse::batch::parse_field_list;
use visionparse::{
    run_batch, Batch, BatchOptions, BatchProgressCallback, Document, ExtractionClient,
    ExtractionConfig, ProgressCallback, ReportFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar plus one log line per document. Documents finish
/// out of order, so per-document start times are keyed by index.
struct CliProgressCallback {
    bar: ProgressBar,
    filenames: Mutex<HashMap<usize, (String, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            filenames: Mutex::new(HashMap::new()),
        })
    }

    fn finish_document(&self, index: usize) -> (String, f64) {
        let entry = self
            .filenames
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index));
        match entry {
            Some((name, started)) => (name, started.elapsed().as_secs_f64()),
            None => (format!("#{}", index + 1), 0.0),
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, index: usize, _total: usize, filename: &str) {
        if let Ok(mut m) = self.filenames.lock() {
            m.insert(index, (filename.to_string(), Instant::now()));
        }
        self.bar.set_message(filename.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, field_count: usize) {
        let (name, secs) = self.finish_document(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{field_count:>3} fields")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let (name, secs) = self.finish_document(index);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} documents extracted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} left empty)",
                if failed == total_documents { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract two fields from every invoice, CSV report in the current directory
  visionparse --fields invoice_number,total invoices/*.pdf

  # Strict mode, spreadsheet output
  visionparse --strict --fields invoice_number,date,total --format xlsx scans/*.png -o reports/

  # Everything the model finds, as JSON, with a fixed batch id
  visionparse --format json --batch-id march-2024 *.pdf

  # Machine-readable run summary on stdout
  visionparse --summary-json --fields total a.pdf b.jpg

SUPPORTED INPUTS:
  pdf, png, jpg/jpeg, gif, bmp, tif/tiff

REPORT FORMATS:
  csv    header row from the first document's fields
  json   full result list, 2-space indent
  xlsx   csv layout on a sheet named "Invoices"
  pdf    fixed-width print table, cells cut to 30 characters
  xml    legacy <batch>/<document>/<field> layout

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          API key for the vision model (required)
  VISIONPARSE_MODEL       Override model ID (default gemini-1.5-flash)
  VISIONPARSE_BASE_URL    Override API root
"#;

/// Extract invoice fields from PDFs and images and compile a report.
#[derive(Parser, Debug)]
#[command(
    name = "visionparse",
    version,
    about = "Extract invoice fields from PDFs and images with a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to process, in report order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the report is written to.
    #[arg(short, long, env = "VISIONPARSE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Comma-separated field names, e.g. "invoice_number,date,total".
    #[arg(long, env = "VISIONPARSE_FIELDS", default_value = "")]
    fields: String,

    /// Extract only the listed fields.
    #[arg(long, env = "VISIONPARSE_STRICT")]
    strict: bool,

    /// Report format.
    #[arg(short, long, env = "VISIONPARSE_FORMAT", value_enum, default_value = "csv")]
    format: FormatArg,

    /// Batch identifier used in the report filename. Random if omitted.
    #[arg(long)]
    batch_id: Option<String>,

    /// Vision API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(long, env = "VISIONPARSE_MODEL", default_value = visionparse::config::DEFAULT_MODEL)]
    model: String,

    /// API root URL.
    #[arg(long, env = "VISIONPARSE_BASE_URL", default_value = visionparse::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of concurrent extraction calls.
    #[arg(short, long, env = "VISIONPARSE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per document on transient API failure.
    #[arg(long, env = "VISIONPARSE_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call API timeout in seconds.
    #[arg(long, env = "VISIONPARSE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Print the per-document outcome as JSON on stdout.
    #[arg(long)]
    summary_json: bool,

    /// Disable progress bar.
    #[arg(long, env = "VISIONPARSE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VISIONPARSE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VISIONPARSE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Json,
    Xlsx,
    Pdf,
    Xml,
}

impl From<FormatArg> for ReportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Xlsx => ReportFormat::Xlsx,
            FormatArg::Pdf => ReportFormat::Pdf,
            FormatArg::Xml => ReportFormat::Xml,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(ref id) = cli.batch_id {
        anyhow::ensure!(
            !id.is_empty() && !id.contains(['/', '\\']) && !id.contains(".."),
            "--batch-id must not be empty or contain path separators or '..'"
        );
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.summary_json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Load documents ───────────────────────────────────────────────────
    let mut documents = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        let doc = Document::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if !doc.is_supported() && !cli.quiet {
            eprintln!(
                "{} {} has unsupported type {}; it will produce an empty row",
                cyan("⚠"),
                path.display(),
                doc.mime_type()
            );
        }
        documents.push(doc);
    }

    // ── Build client and batch ───────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;
    let client = ExtractionClient::new(config).context("Failed to create extraction client")?;

    let options = BatchOptions::new(parse_field_list(&cli.fields), cli.strict, cli.format.into());
    let mut batch = match cli.batch_id {
        Some(ref id) => Batch::with_id(id.clone(), documents, options),
        None => Batch::new(documents, options),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run_batch(&client, &mut batch)
        .await
        .with_context(|| format!("Batch {} failed", batch.id))?;

    let path = report
        .artifact
        .write_to_dir(&cli.output_dir)
        .await
        .context("Failed to write report")?;

    if cli.summary_json {
        let json = serde_json::to_string_pretty(&report.output)
            .context("Failed to serialise batch output")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &report.output.stats;
        eprintln!(
            "{}  {}/{} documents  {}ms  →  {}",
            if stats.failed == 0 { green("✔") } else { cyan("⚠") },
            stats.succeeded,
            stats.total_documents,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        if !show_progress {
            for (index, err) in report.output.errors() {
                eprintln!("  {} document {}: {}", red("✗"), index + 1, err);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let api_key = cli
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .context("No API key: set GEMINI_API_KEY or pass --api-key")?;

    let mut builder = ExtractionConfig::builder()
        .api_key(api_key)
        .model(cli.model.clone())
        .base_url(cli.base_url.clone())
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
