//! Directory classification entry points.
//!
//! The run is strictly sequential: each file is rendered, then (unless this
//! is a dry run) classified, before the next one is touched. Per-file
//! failures, whether render or backend, are recorded in the [`RunSummary`]
//! and the run moves on. Only configuration-level problems abort it.

use crate::config::ClassifierConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClassifyError;
use crate::output::{write_results_csv, ClassificationResult, RunSummary};
use crate::pipeline::encode::ClassificationRequest;
use crate::pipeline::input;
use crate::pipeline::render::{self, RenderOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Classify every file under `root` with the built-in backend adapters.
///
/// # Arguments
/// * `root`: Directory to scan (recursively; dot-names are skipped)
/// * `config`: Run configuration
///
/// # Returns
/// `Ok(RunSummary)` once every file was attempted, even if some files were
/// skipped or their backend call failed. The results CSV has been written to
/// `summary.output_path`; on a dry run it holds only the header row.
///
/// # Errors
/// Returns `Err(ClassifyError)` only for fatal errors:
/// - Root missing or not a directory
/// - No API key for a non-dry run
/// - Unsupported backend identifier
/// - Results file could not be written
pub async fn classify_directory(
    root: impl AsRef<Path>,
    config: &ClassifierConfig,
) -> Result<RunSummary, ClassifyError> {
    let dispatcher = if config.dry_run {
        Dispatcher::new()
    } else {
        Dispatcher::for_config(config)?
    };
    classify_directory_with(root, config, &dispatcher).await
}

/// Like [`classify_directory`], but with a caller-supplied adapter table.
///
/// The configured backend is looked up in `dispatcher` when the first file
/// needs classifying; a miss aborts the run with
/// [`ClassifyError::UnsupportedBackend`].
pub async fn classify_directory_with(
    root: impl AsRef<Path>,
    config: &ClassifierConfig,
    dispatcher: &Dispatcher,
) -> Result<RunSummary, ClassifyError> {
    let run_start = Instant::now();

    // ── Step 1: Validate the root and list files ─────────────────────────
    let root = input::resolve_root(root.as_ref())?;
    info!("Scanning {}", root.display());

    let api_key = match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key,
        _ if config.dry_run => "",
        _ => {
            return Err(ClassifyError::MissingApiKey {
                backend: config.backend.to_string(),
            })
        }
    };
    if !config.dry_run && config.instruction.trim().is_empty() {
        warn!("Instruction text is empty; backends receive only the system directive");
    }

    let output_path = root.join(&config.output_file_name);
    let files = input::collect_files(&root, std::slice::from_ref(&output_path));
    let total = files.len();
    info!("Found {} file(s)", total);

    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    let backend_id = config.backend.as_str();
    let model = config.model();
    let mut summary = RunSummary::default();

    // ── Step 2: Render and classify, one file at a time ──────────────────
    for (i, file) in files.iter().enumerate() {
        let path = file.path();
        if let Some(cb) = cb {
            cb.on_file_start(i + 1, total, path);
        }

        let pages = match render::render_file_blocking(file, &config.render).await {
            RenderOutcome::Rendered(pages) if !pages.is_empty() => pages,
            RenderOutcome::Rendered(_) | RenderOutcome::Unsupported => {
                debug!("Skipping {}", path.display());
                if let Some(cb) = cb {
                    cb.on_file_skipped(path, None);
                }
                summary.skipped.push((path.to_path_buf(), None));
                continue;
            }
            RenderOutcome::Failed(e) => {
                let reason = e.to_string();
                warn!("Render failed for {}: {}", path.display(), reason);
                if let Some(cb) = cb {
                    cb.on_file_skipped(path, Some(&reason));
                }
                summary.skipped.push((path.to_path_buf(), Some(reason)));
                continue;
            }
        };

        if config.dry_run {
            if let Some(cb) = cb {
                cb.on_file_rendered(path, pages.len());
            }
            summary.dry_run_pages.push((path.to_path_buf(), pages.len()));
            continue;
        }

        let request = ClassificationRequest::build(Arc::clone(&config.instruction), &pages);
        match dispatcher.dispatch(backend_id, api_key, &request, model).await {
            Ok(label) => {
                debug!("{} -> {}", path.display(), label);
                if let Some(cb) = cb {
                    cb.on_file_classified(path, &label);
                }
                summary.results.push(ClassificationResult {
                    filename: file.file_name(),
                    label,
                    llm: backend_id.to_string(),
                    model: model.to_string(),
                    path: path.display().to_string(),
                });
            }
            Err(e) if e.is_per_file() => {
                let detail = e.to_string();
                warn!("Classification failed for {}: {}", path.display(), detail);
                if let Some(cb) = cb {
                    cb.on_file_error(path, &detail);
                }
                summary.failed.push((path.to_path_buf(), detail));
            }
            Err(e) => return Err(e),
        }
    }

    // ── Step 3: Write the artifact ───────────────────────────────────────
    let written = write_results_csv(&root, &config.output_file_name, &summary.results)?;
    summary.output_path = Some(written);

    info!(
        "Run complete: {} classified, {} skipped, {} failed in {}ms",
        summary.results.len(),
        summary.skipped.len(),
        summary.failed.len(),
        run_start.elapsed().as_millis()
    );

    if let Some(cb) = cb {
        cb.on_run_complete(
            summary.results.len(),
            summary.skipped.len(),
            summary.failed.len(),
        );
    }

    Ok(summary)
}

/// Synchronous wrapper around [`classify_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn classify_directory_sync(
    root: impl AsRef<Path>,
    config: &ClassifierConfig,
) -> Result<RunSummary, ClassifyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ClassifyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(classify_directory(root, config))
}
