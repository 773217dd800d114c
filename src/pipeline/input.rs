//! Input resolution: validate the root directory and list the files to classify.
//!
//! Traversal is recursive and deterministic (entries sorted by path). Any
//! file or directory whose name starts with `.` is skipped, together with
//! everything below it, so `.git/` and editor droppings never reach a
//! backend.

use crate::error::ClassifyError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a file is rendered, decided by extension alone (no content sniffing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.pdf`
    Pdf,
    /// `.png`, `.jpg`, `.jpeg`, `.webp`, `.bmp`, `.tif`, `.tiff`
    Image,
    /// `.txt`, `.md`, `.eml`, `.log`, `.csv`
    Text,
    /// Anything else.
    Unsupported,
}

impl FileKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("png" | "jpg" | "jpeg" | "webp" | "bmp" | "tif" | "tiff") => FileKind::Image,
            Some("txt" | "md" | "eml" | "log" | "csv") => FileKind::Text,
            _ => FileKind::Unsupported,
        }
    }
}

/// A file selected for classification. Content is read by the renderer,
/// not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    kind: FileKind,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::from_path(&path);
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Final path component, as written to the results CSV.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Check that `root` exists and is a directory, returning it absolutised.
pub fn resolve_root(root: &Path) -> Result<PathBuf, ClassifyError> {
    if !root.exists() {
        return Err(ClassifyError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ClassifyError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// List every non-hidden regular file under `root`, sorted by path.
///
/// Paths in `exclude` (e.g. the run's own results file) are left out.
/// Unreadable directories are logged and skipped rather than failing the run.
pub fn collect_files(root: &Path, exclude: &[PathBuf]) -> Vec<SourceFile> {
    let mut files = Vec::new();
    walk(root, exclude, &mut files);
    files.sort();
    debug!("Found {} files under {}", files.len(), root.display());
    files.into_iter().map(SourceFile::new).collect()
}

fn walk(dir: &Path, exclude: &[PathBuf], out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            walk(&path, exclude, out);
        } else if (file_type.is_file() || path.is_file()) && !exclude.contains(&path) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn kind_by_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/B.PDF")), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("x.jpeg")), FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("x.TIF")), FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("mail.eml")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("data.csv")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("setup.exe")), FileKind::Unsupported);
        assert_eq!(FileKind::from_path(Path::new("bundle.zip")), FileKind::Unsupported);
        assert_eq!(FileKind::from_path(Path::new("README")), FileKind::Unsupported);
    }

    #[test]
    fn resolve_root_errors() {
        let err = resolve_root(Path::new("/definitely/not/a/dir")).unwrap_err();
        assert!(matches!(err, ClassifyError::RootNotFound { .. }));

        let f = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_root(f.path()).unwrap_err();
        assert!(matches!(err, ClassifyError::NotADirectory { .. }));
    }

    #[test]
    fn traversal_skips_hidden_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.pdf"), "a").unwrap();
        fs::write(root.join(".hidden.txt"), "h").unwrap();
        fs::write(root.join("sub/c.png"), "c").unwrap();
        fs::write(root.join("sub/deeper/d.md"), "d").unwrap();
        fs::write(root.join(".git/objects/blob.txt"), "x").unwrap();
        fs::write(root.join("filelist.csv"), "old").unwrap();

        let files = collect_files(root, &[root.join("filelist.csv")]);
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                f.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.txt", "sub/c.png", "sub/deeper/d.md"]);
        assert_eq!(files[2].kind(), FileKind::Image);
        assert_eq!(files[2].file_name(), "c.png");
    }
}
