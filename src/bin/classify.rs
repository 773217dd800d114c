//! CLI binary for edgequake-classify.
//!
//! A thin shim over the library crate that maps CLI flags and the
//! `LLM_*` / `PROMPT_FILE` environment to `ClassifierConfig`, prints the
//! greppable per-file lines and reports where the results went.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_classify::{
    classify_directory, load_instruction, Backend, ClassifierConfig, ProgressCallback,
    RunProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Console callback ─────────────────────────────────────────────────────────

/// Prints one line per skipped, dry-run, classified or failed file. When a
/// progress bar is active the lines are routed through it so they scroll
/// above the bar instead of tearing it. In quiet mode only `[error]` lines
/// are printed, on stderr.
struct ConsoleCallback {
    bar: Option<ProgressBar>,
    backend: Backend,
    quiet: bool,
}

impl ConsoleCallback {
    fn new(backend: Backend, show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {pos:>4}/{len} files  \
                     ⏱ {elapsed_precise}  {wide_msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Classifying");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self {
            bar,
            backend,
            quiet,
        })
    }

    fn echoes(&self, is_error: bool) -> bool {
        is_error || !self.quiet
    }

    fn line(&self, text: String) {
        if !self.echoes(false) {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(text),
            None => println!("{text}"),
        }
    }

    fn error_line(&self, text: String) {
        if !self.echoes(true) {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(text),
            None if self.quiet => eprintln!("{text}"),
            None => println!("{text}"),
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl RunProgressCallback for ConsoleCallback {
    fn on_run_start(&self, total_files: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total_files as u64);
        }
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        if let Some(bar) = &self.bar {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            bar.set_message(name.unwrap_or_default());
        }
    }

    fn on_file_skipped(&self, path: &Path, reason: Option<&str>) {
        match reason {
            Some(reason) => self.line(format!("[skip] {}  ({})", path.display(), reason)),
            None => self.line(format!("[skip] {}", path.display())),
        }
        self.advance();
    }

    fn on_file_rendered(&self, path: &Path, pages: usize) {
        self.line(format!("[dry] {} -> {} page(s)", path.display(), pages));
        self.advance();
    }

    fn on_file_classified(&self, path: &Path, label: &str) {
        self.line(format!(
            "{} | {} -> {}",
            self.backend,
            path.display(),
            green(label)
        ));
        self.advance();
    }

    fn on_file_error(&self, path: &Path, error: &str) {
        self.error_line(format!("[error] {}: {}", path.display(), red(error)));
        self.advance();
    }

    fn on_run_complete(&self, _classified: usize, _skipped: usize, _failed: usize) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Classify everything under ./inbox with OpenAI
  LLM_NAME=openai LLM_API_KEY=sk-... PROMPT_FILE=prompt.txt classify ./inbox

  # Render only: report page counts, call nothing, write a header-only CSV
  classify --dry-run ./inbox

  # Anthropic with an explicit model
  classify --llm anthropic --model claude-3-5-haiku-latest --prompt-file prompt.txt ./inbox

  # OpenAI-compatible proxy
  classify --llm openai --base-url http://localhost:8080/v1 ./inbox

SUPPORTED BACKENDS:
  Id           Default model
  ─────────    ────────────────────────
  openai       gpt-4o-mini
  anthropic    claude-3-5-sonnet-latest
  gemini       gemini-1.5-flash

FILE TYPES:
  PDF          .pdf                                   first 5 pages
  Image        .png .jpg .jpeg .webp .bmp .tif .tiff  1 page
  Text         .txt .md .eml .log .csv                first 8000 chars, 1 page
  Anything else is skipped.

ENVIRONMENT VARIABLES:
  LLM_NAME                Backend id (openai, anthropic, gemini)
  LLM_API_KEY             API key for that backend
  LLM_MODEL               Model id (backend default if unset)
  PROMPT_FILE             Instruction text file
  LLM_BASE_URL            API base URL override for the selected backend
  CLASSIFY_API_TIMEOUT    Per-call timeout in seconds (0 = none)
  CLASSIFY_ZOOM           PDF render magnification
  CLASSIFY_OUTPUT         Results file name inside the root
  PDFIUM_LIB_PATH         Path to the pdfium shared library file
"#;

/// Classify every file in a folder with a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "classify",
    version,
    about = "Classify documents in a folder using a multimodal LLM",
    long_about = "Walks a folder, renders each PDF, image or text file into at most five PNG \
pages and asks the selected backend (OpenAI, Anthropic or Gemini) for one short label per \
file. Results are written to filelist.csv in the scanned folder.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root folder to scan.
    root: PathBuf,

    /// Scan and render only; do not call the LLM.
    #[arg(long)]
    dry_run: bool,

    /// Backend: openai, anthropic, gemini.
    #[arg(long = "llm", env = "LLM_NAME")]
    llm: Option<String>,

    /// API key for the selected backend.
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model id. Defaults per backend.
    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// Instruction (prompt) text file.
    #[arg(long, env = "PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// API base URL override for the selected backend.
    #[arg(long, env = "LLM_BASE_URL")]
    base_url: Option<String>,

    /// Per-call timeout in seconds (0 disables).
    #[arg(long, env = "CLASSIFY_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// PDF render magnification (0.25–8.0; 2.0 ≈ 144 DPI).
    #[arg(long, env = "CLASSIFY_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// Results file name, written inside the root.
    #[arg(short, long, env = "CLASSIFY_OUTPUT", default_value = "filelist.csv")]
    output: String,

    /// Disable progress bar.
    #[arg(long, env = "CLASSIFY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CLASSIFY_VERBOSE")]
    verbose: bool,

    /// Suppress per-file lines except `[error]`, which goes to stderr.
    #[arg(short, long, env = "CLASSIFY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar and the per-file lines carry the useful feedback, so
    // INFO-level library logs are suppressed while the bar is active.
    // indicatif hides a bar drawn to a non-terminal, and its println with it.
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
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

    let backend: Backend = match cli.llm.as_deref() {
        Some(name) => name.parse()?,
        None if cli.dry_run => Backend::OpenAi,
        None => anyhow::bail!("No LLM backend configured.\nSet LLM_NAME or pass --llm."),
    };

    let progress: ProgressCallback = ConsoleCallback::new(backend, show_progress, cli.quiet);

    let config = build_config(&cli, backend, Some(progress))?;

    let summary = classify_directory(&cli.root, &config)
        .await
        .with_context(|| format!("Classification of {} failed", cli.root.display()))?;

    if let Some(ref path) = summary.output_path {
        println!("\nResults written to: {}", path.display());
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} classified, {} skipped, {} failed",
            if summary.failed.is_empty() {
                green("✔")
            } else {
                red("⚠")
            },
            bold(&summary.results.len().to_string()),
            summary.skipped.len(),
            summary.failed.len(),
        );
    }

    Ok(())
}

/// Map CLI args to `ClassifierConfig`.
fn build_config(
    cli: &Cli,
    backend: Backend,
    progress: Option<ProgressCallback>,
) -> Result<ClassifierConfig> {
    let mut builder = ClassifierConfig::builder(backend)
        .dry_run(cli.dry_run)
        .api_timeout_secs(cli.api_timeout)
        .pdf_zoom(cli.zoom)
        .output_file_name(cli.output.clone());

    match (&cli.prompt_file, cli.dry_run) {
        (Some(path), _) => builder = builder.instruction(load_instruction(path)?),
        (None, true) => {}
        (None, false) => {
            anyhow::bail!("No instruction file configured.\nSet PROMPT_FILE or pass --prompt-file.")
        }
    }

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
