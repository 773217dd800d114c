//! Error types for the edgequake-classify library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`ClassifyError`]: **Fatal**: the run cannot proceed at all (root
//!   directory missing, no API key, unknown backend). Returned as
//!   `Err(ClassifyError)` from the top-level `classify_*` functions before
//!   or instead of producing a result list.
//!
//! * [`RenderError`]: **Per-file, local**: a file could not be turned into
//!   page images (corrupt PDF, truncated PNG). The renderer never returns it
//!   as an `Err`; it is reported as a diagnostic and the file is treated
//!   exactly like an unsupported one.
//!
//! * [`BackendError`]: **Per-file, remote**: the classification backend
//!   rejected or failed the call. The file gets no result row and the run
//!   moves on to the next file. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-classify library.
#[derive(Debug, Error)]
pub enum ClassifyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The directory to scan does not exist.
    #[error("Root folder not found: '{path}'")]
    RootNotFound { path: PathBuf },

    /// The path to scan exists but is a file, not a directory.
    #[error("Root path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// The instruction (prompt) file does not exist.
    #[error("Instruction file not found: '{path}'\nSet PROMPT_FILE or pass --prompt-file.")]
    InstructionNotFound { path: PathBuf },

    /// The instruction file exists but could not be read.
    #[error("Failed to read instruction file '{path}': {source}")]
    InstructionUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Backend configuration errors ──────────────────────────────────────
    /// The backend identifier does not name any registered adapter.
    #[error("Unsupported LLM backend: '{name}'\nSupported: openai, anthropic, gemini.")]
    UnsupportedBackend { name: String },

    /// No API key was supplied for a run that calls the backend.
    #[error("No API key configured for backend '{backend}'.\nSet LLM_API_KEY or pass --api-key.")]
    MissingApiKey { backend: String },

    /// The shared HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Per-file backend failure (recovered by the run loop) ──────────────
    /// A backend call failed; see [`BackendError`].
    #[error(transparent)]
    Backend(#[from] BackendError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the results CSV.
    #[error("Failed to write results file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClassifyError {
    /// `true` when the error only affects the file being processed.
    ///
    /// The run loop records these against the file and continues; every
    /// other variant aborts the run.
    pub fn is_per_file(&self) -> bool {
        matches!(self, ClassifyError::Backend(_))
    }
}

/// A failure while turning one file into page images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No pdfium shared library could be loaded.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the binary."
    )]
    PdfiumUnavailable(String),

    /// pdfium refused to open the document (corrupt, encrypted, not a PDF).
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium opened the document but failed on a specific page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// The image decoder rejected the file.
    #[error("Image '{path}' could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding a rendered page to PNG failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// The blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(String),
}

/// A failure reported by (or while talking to) a classification backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, DNS, TLS or other transport-level failure.
    #[error("Request to '{backend}' failed: {detail}")]
    Transport { backend: String, detail: String },

    /// The request exceeded the configured per-call timeout.
    #[error("Request to '{backend}' timed out after {secs}s")]
    Timeout { backend: String, secs: u64 },

    /// HTTP 401/403 from the backend.
    #[error("Authentication error from backend '{backend}': {detail}")]
    Auth { backend: String, detail: String },

    /// HTTP 429 from the backend.
    #[error("Rate limit exceeded for backend '{backend}'")]
    RateLimited {
        backend: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success HTTP status.
    #[error("Backend '{backend}' returned HTTP {status}: {message}")]
    Api {
        backend: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Malformed response from backend '{backend}': {detail}")]
    MalformedResponse { backend: String, detail: String },
}
