//! Run results and the CSV artifact.

use crate::error::ClassifyError;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// One classified file. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Base name of the file.
    pub filename: String,
    /// Backend answer, trimmed. Not validated against any vocabulary.
    pub label: String,
    /// Normalised backend identifier.
    pub llm: String,
    /// Model the request was sent to.
    pub model: String,
    /// Absolute path of the file.
    pub path: String,
}

/// Everything a run produced, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per file the backend labelled.
    pub results: Vec<ClassificationResult>,
    /// Files that produced no pages, with a diagnostic when rendering failed
    /// (`None` for unsupported types and zero-page documents).
    pub skipped: Vec<(PathBuf, Option<String>)>,
    /// Files whose backend call failed, with the error text.
    pub failed: Vec<(PathBuf, String)>,
    /// Dry run only: page count per rendered file.
    pub dry_run_pages: Vec<(PathBuf, usize)>,
    /// Where the CSV was written. `None` only while the run is in progress.
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    /// Total files the run attempted.
    pub fn total_files(&self) -> usize {
        self.results.len() + self.skipped.len() + self.failed.len() + self.dry_run_pages.len()
    }
}

/// Write `results` as CSV to `dir/file_name` and return the final path.
///
/// The header row is always written, even for an empty result list. Uses an
/// atomic write (temp file in `dir`, then rename) so an interrupted run never
/// leaves a half-written artifact behind.
pub fn write_results_csv(
    dir: &Path,
    file_name: &str,
    results: &[ClassificationResult],
) -> Result<PathBuf, ClassifyError> {
    let path = dir.join(file_name);
    let write_err = |source: std::io::Error| ClassifyError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        wtr.write_record(["filename", "label", "llm", "model", "path"])
            .map_err(|e| write_err(e.into()))?;
        for result in results {
            wtr.serialize(result).map_err(|e| write_err(e.into()))?;
        }
        wtr.flush().map_err(write_err)?;
    }
    tmp.as_file_mut().flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} result row(s) to {}", results.len(), path.display());
    Ok(path)
}
