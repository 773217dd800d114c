//! # edgequake-classify
//!
//! Label every file in a directory with a multimodal LLM.
//!
//! ## Why this crate?
//!
//! Document triage (bank statement? e-mail? chat screenshot?) rarely needs
//! text extraction: a vision model looking at the first few pages answers as
//! well as a human skimming them. This crate normalises every supported file
//! into a small, bounded set of PNG pages and asks one of several backends
//! for a single short label, so the same request works for PDFs, scans,
//! photos and plain-text exports alike.
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory
//!  │
//!  ├─ 1. Input     walk the root (sorted, dot-names skipped)
//!  ├─ 2. Render    PDF → ≤5 pages, image → 1 page, text → 1 page (spawn_blocking)
//!  ├─ 3. Encode    PNG → base64 ClassificationRequest
//!  ├─ 4. Dispatch  backend id → OpenAI / Anthropic / Gemini adapter
//!  └─ 5. Output    ordered results → filelist.csv (atomic write)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_classify::{classify_directory, load_instruction, Backend, ClassifierConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClassifierConfig::builder(Backend::OpenAi)
//!         .api_key(std::env::var("LLM_API_KEY")?)
//!         .instruction(load_instruction("prompt.txt")?)
//!         .build()?;
//!     let summary = classify_directory("./inbox", &config).await?;
//!     for r in &summary.results {
//!         println!("{} -> {}", r.filename, r.label);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `classify` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Backends
//!
//! | Id | Default model | Endpoint |
//! |----|---------------|----------|
//! | `openai`    | `gpt-4o-mini`              | `/v1/chat/completions` |
//! | `anthropic` | `claude-3-5-sonnet-latest` | `/v1/messages` |
//! | `gemini`    | `gemini-1.5-flash`         | `/v1beta/models/{model}:generateContent` |
//!
//! PDF rendering needs a pdfium shared library: set `PDFIUM_LIB_PATH`, place
//! it next to the working directory, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::{classify_directory, classify_directory_sync, classify_directory_with};
pub use config::{
    load_instruction, Backend, ClassifierConfig, ClassifierConfigBuilder, RenderOptions,
    TextCanvas, MAX_PAGES, TEXT_CHAR_LIMIT,
};
pub use dispatch::Dispatcher;
pub use error::{BackendError, ClassifyError, RenderError};
pub use output::{ClassificationResult, RunSummary};
pub use pipeline::encode::{ClassificationRequest, EncodedPage};
pub use pipeline::input::{FileKind, SourceFile};
pub use pipeline::page::{PageImage, PageSequence};
pub use pipeline::render::{render_file, RenderOutcome};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use providers::{Classifier, HttpClient};
