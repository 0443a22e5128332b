//! CLI binary for docswap.
//!
//! A thin shim over the library crate that maps CLI flags to `ClientConfig`,
//! drives one `Session` and prints the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use docswap::{
    ClientConfig, ProgressCallback, SelectedFile, Session, SessionStatus, UploadProgressCallback,
    DEFAULT_ENDPOINT,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Byte progress bar while uploading, spinner while the service converts.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Hidden until the upload actually starts, so validation failures
    /// never leave a bar behind.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  {percent:>3}%",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Uploading");
        Arc::new(Self { bar })
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, file_name: &str, total_bytes: Option<u64>) {
        self.bar.set_length(total_bytes.unwrap_or(0));
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!("{} {}", bold("◆"), bold(file_name)));
    }

    fn on_bytes_sent(&self, loaded: u64, _total: Option<u64>) {
        self.bar.set_position(loaded);
    }

    fn on_body_sent(&self) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        self.bar.set_prefix("Converting");
        self.bar.set_message("waiting for the service…");
    }

    fn on_conversion_complete(&self, file_name: &str, bytes: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(file_name),
            dim(&format!("{bytes} bytes"))
        );
    }

    fn on_conversion_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # DOCX → PDF into the current directory
  docswap report.docx

  # PDF → DOCX into a specific directory
  docswap scan.pdf -o converted/

  # Talk to another service instance
  docswap --endpoint https://convert.example.com/convert report.docx

  # Machine-readable result
  docswap --json report.docx

ENVIRONMENT VARIABLES:
  DOCSWAP_ENDPOINT    Conversion endpoint (default http://localhost:7000/convert)
  DOCSWAP_OUTPUT_DIR  Directory converted files are saved into
  DOCSWAP_TIMEOUT     Request timeout in seconds
  RUST_LOG            Log filter, e.g. docswap=debug
"#;

/// Convert DOCX ⇄ PDF through a conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "docswap",
    version,
    about = "Convert DOCX ⇄ PDF through a conversion service",
    long_about = "Upload a .docx or .pdf file to a conversion service and save the converted \
file. DOCX becomes PDF and PDF becomes DOCX; the service decides the output name when it \
sends one.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The .docx or .pdf file to convert.
    input: PathBuf,

    /// Conversion endpoint URL.
    #[arg(long, env = "DOCSWAP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Directory to save the converted file in.
    #[arg(short, long, env = "DOCSWAP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Replace an existing file instead of saving as "name (1).ext".
    #[arg(long, env = "DOCSWAP_OVERWRITE")]
    overwrite: bool,

    /// Request timeout in seconds (upload + conversion + download).
    #[arg(long, env = "DOCSWAP_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Print the final session state as JSON on stdout.
    #[arg(long, env = "DOCSWAP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCSWAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSWAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSWAP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn UploadProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let session = Session::new(&config).context("Failed to initialise session")?;
    let file = SelectedFile::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    if !cli.quiet && !show_progress {
        eprintln!("{} ({})", file.name(), file.size_label());
    }
    session.select_file(file);

    let outcome = session.submit().await;
    let state = session.state();

    if cli.json {
        let json = serde_json::to_string_pretty(&state.summary())
            .context("Failed to serialise session state")?;
        println!("{json}");
    } else if !show_progress && (!cli.quiet || state.status() != SessionStatus::Done) {
        // The callback already printed the outcome when the bar was shown.
        eprintln!("{}", state.message());
    }

    match outcome {
        Ok(path) => {
            if !cli.quiet && !cli.json {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!("Conversion failed: {e}");
            // Validation failures never reach the callback; report them here.
            if show_progress && state.status() != SessionStatus::Error {
                eprintln!("{} {}", red("✘"), state.message());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .endpoint(cli.endpoint.clone())
        .download_dir(cli.output_dir.clone())
        .overwrite(cli.overwrite)
        .timeout_secs(cli.timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
