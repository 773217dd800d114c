//! Progress-callback trait for per-file run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::ClassifierConfigBuilder::progress_callback`] to receive
//! events as the run walks the directory. The CLI uses it to print the
//! `[skip]`, `[dry]` and `[error]` lines and drive its progress bar; library
//! callers can forward the same events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_classify::{Backend, ClassifierConfig, RunProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     classified: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_classified(&self, path: &Path, label: &str) {
//!         self.classified.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} -> {}", path.display(), label);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { classified: AtomicUsize::new(0) });
//!
//! let config = ClassifierConfig::builder(Backend::OpenAi)
//!     .api_key("sk-...")
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the run loop as it processes each file.
///
/// Files are processed strictly one after another, so events for different
/// files never interleave. Implementations must still be `Send + Sync`
/// because the config holding them crosses `spawn_blocking` boundaries.
/// All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after traversal, before the first file is rendered.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is rendered.
    ///
    /// # Arguments
    /// * `index`: 1-based position of the file in the run
    /// * `total`: number of files in the run
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a file produced no pages: unsupported type, zero-page
    /// document, or a render failure (`reason` carries the diagnostic).
    fn on_file_skipped(&self, path: &Path, reason: Option<&str>) {
        let _ = (path, reason);
    }

    /// Dry-run only: the file rendered to `pages` page images.
    fn on_file_rendered(&self, path: &Path, pages: usize) {
        let _ = (path, pages);
    }

    /// The backend returned `label` for the file.
    fn on_file_classified(&self, path: &Path, label: &str) {
        let _ = (path, label);
    }

    /// The backend call for the file failed; the file gets no result row.
    fn on_file_error(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called once after every file was attempted.
    ///
    /// # Arguments
    /// * `classified`: files with a result row
    /// * `skipped`:    files that produced no pages
    /// * `failed`:     files whose backend call failed
    fn on_run_complete(&self, classified: usize, skipped: usize, failed: usize) {
        let _ = (classified, skipped, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClassifierConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
