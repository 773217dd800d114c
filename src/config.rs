//! Configuration types for a classification run.
//!
//! All run behaviour is controlled through [`ClassifierConfig`], built via its
//! [`ClassifierConfigBuilder`]. The config is constructed once, before the
//! first file is touched, and is read-only for the rest of the run: the
//! instruction text and credentials are never reloaded or mutated mid-run.

use crate::error::ClassifyError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of page images produced for (and sent with) one file.
pub const MAX_PAGES: usize = 5;

/// Text files are cut to this many characters before they are drawn.
pub const TEXT_CHAR_LIMIT: usize = 8000;

/// Name of the results file written into the scanned root.
pub const DEFAULT_OUTPUT_FILE: &str = "filelist.csv";

/// The classification backends this crate ships adapters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI Chat Completions.
    OpenAi,
    /// Anthropic Messages.
    Anthropic,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl Backend {
    /// Every built-in backend, in registration order.
    pub const ALL: [Backend; 3] = [Backend::OpenAi, Backend::Anthropic, Backend::Gemini];

    /// The identifier used in configuration, the dispatcher table and the CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Anthropic => "anthropic",
            Backend::Gemini => "gemini",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-4o-mini",
            Backend::Anthropic => "claude-3-5-sonnet-latest",
            Backend::Gemini => "gemini-1.5-flash",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ClassifyError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = normalize_backend_id(s);
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str() == id)
            .ok_or_else(|| ClassifyError::UnsupportedBackend {
                name: s.trim().to_string(),
            })
    }
}

/// Canonical form of a backend identifier: trimmed and lowercased.
pub fn normalize_backend_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Geometry of the white canvas that text files are drawn onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCanvas {
    /// Canvas width in pixels. Default: 1600.
    pub width: u32,
    /// Canvas height in pixels. Default: 2000.
    pub height: u32,
    /// Blank border on every side, in pixels. Default: 40.
    pub margin: u32,
    /// Extra pixels between consecutive lines. Default: 6.
    pub line_spacing: u32,
    /// Integer magnification of the 8×8 glyphs. Default: 2 (16 px cells).
    pub glyph_scale: u32,
}

impl Default for TextCanvas {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 2000,
            margin: 40,
            line_spacing: 6,
            glyph_scale: 2,
        }
    }
}

/// Knobs for the renderer. The page cap and text limit are not here: they are
/// fixed invariants ([`MAX_PAGES`], [`TEXT_CHAR_LIMIT`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Magnification applied to PDF pages. Default: 2.0 (≈144 DPI).
    pub pdf_zoom: f32,
    /// Longest allowed edge of a rendered PDF page in pixels. Default: 4000.
    ///
    /// Only bites on oversized page boxes (posters, drawings); an A4 page at
    /// zoom 2.0 is about 1190 × 1684 px.
    pub max_page_edge_px: u32,
    /// Text canvas geometry.
    pub text: TextCanvas,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pdf_zoom: 2.0,
            max_page_edge_px: 4000,
            text: TextCanvas::default(),
        }
    }
}

/// Configuration for a classification run.
///
/// # Example
/// ```rust
/// use edgequake_classify::{Backend, ClassifierConfig};
///
/// let config = ClassifierConfig::builder(Backend::Anthropic)
///     .api_key("sk-ant-...")
///     .instruction("Classify this document.")
///     .build()
///     .unwrap();
/// assert_eq!(config.model(), "claude-3-5-sonnet-latest");
/// ```
#[derive(Clone)]
pub struct ClassifierConfig {
    /// Backend that receives every request of the run.
    pub backend: Backend,

    /// API key for `backend`. Required unless `dry_run` is set.
    pub api_key: Option<String>,

    /// Model identifier. If None, uses [`Backend::default_model`].
    pub model: Option<String>,

    /// Instruction text sent with every file, shared read-only for the run.
    pub instruction: Arc<str>,

    /// Override for the configured backend's API base URL
    /// (e.g. an OpenAI-compatible proxy).
    pub base_url: Option<String>,

    /// Per-call HTTP timeout in seconds; 0 disables it. Default: 120.
    pub api_timeout_secs: u64,

    /// Render and report page counts only; never call the backend. Default: false.
    pub dry_run: bool,

    /// File name of the results CSV inside the scanned root. Default: `filelist.csv`.
    pub output_file_name: String,

    /// Renderer settings.
    pub render: RenderOptions,

    /// Optional per-file event sink (console lines, progress bar).
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("instruction_len", &self.instruction.len())
            .field("base_url", &self.base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("dry_run", &self.dry_run)
            .field("output_file_name", &self.output_file_name)
            .field("render", &self.render)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl ClassifierConfig {
    /// Create a new builder for `ClassifierConfig`.
    pub fn builder(backend: Backend) -> ClassifierConfigBuilder {
        ClassifierConfigBuilder {
            config: Self {
                backend,
                api_key: None,
                model: None,
                instruction: Arc::from(""),
                base_url: None,
                api_timeout_secs: 120,
                dry_run: false,
                output_file_name: DEFAULT_OUTPUT_FILE.to_string(),
                render: RenderOptions::default(),
                progress_callback: None,
            },
        }
    }

    /// The model actually sent to the backend.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Builder for [`ClassifierConfig`].
pub struct ClassifierConfigBuilder {
    config: ClassifierConfig,
}

impl fmt::Debug for ClassifierConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.config.fmt(f)
    }
}

impl ClassifierConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Blank model names fall back to the backend default.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        let model = model.trim();
        self.config.model = (!model.is_empty()).then(|| model.to_string());
        self
    }

    pub fn instruction(mut self, text: impl AsRef<str>) -> Self {
        self.config.instruction = Arc::from(text.as_ref());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn pdf_zoom(mut self, zoom: f32) -> Self {
        self.config.render.pdf_zoom = zoom.clamp(0.25, 8.0);
        self
    }

    pub fn render_options(mut self, render: RenderOptions) -> Self {
        self.config.render = render;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClassifierConfig, ClassifyError> {
        let c = &self.config;

        if !c.dry_run && c.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(ClassifyError::MissingApiKey {
                backend: c.backend.to_string(),
            });
        }

        let name = c.output_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ClassifyError::InvalidConfig(format!(
                "Output file name must be a bare file name, got {:?}",
                c.output_file_name
            )));
        }

        let t = &c.render.text;
        if t.glyph_scale == 0 || t.width <= 2 * t.margin || t.height <= 2 * t.margin {
            return Err(ClassifyError::InvalidConfig(format!(
                "Text canvas {}x{} with margin {} and glyph scale {} leaves no drawable area",
                t.width, t.height, t.margin, t.glyph_scale
            )));
        }

        if !(c.render.pdf_zoom.is_finite() && c.render.pdf_zoom > 0.0) {
            return Err(ClassifyError::InvalidConfig(format!(
                "PDF zoom must be positive, got {}",
                c.render.pdf_zoom
            )));
        }

        Ok(self.config)
    }
}

/// Read the instruction file once for the run, trimming surrounding whitespace.
pub fn load_instruction(path: impl AsRef<Path>) -> Result<String, ClassifyError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClassifyError::InstructionNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ClassifyError::InstructionUnreadable {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn backend_parse_is_case_and_space_insensitive() {
        for id in ["OpenAI", "openai", " openai ", "OPENAI\n"] {
            assert_eq!(id.parse::<Backend>().unwrap(), Backend::OpenAi, "id {id:?}");
        }
        assert_eq!("Gemini".parse::<Backend>().unwrap(), Backend::Gemini);
        assert_eq!(" anthropic".parse::<Backend>().unwrap(), Backend::Anthropic);
    }

    #[test]
    fn backend_parse_rejects_unknown() {
        let err = "foo".parse::<Backend>().unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedBackend { ref name } if name == "foo"));
    }

    #[test]
    fn model_defaults_per_backend() {
        let cfg = ClassifierConfig::builder(Backend::Gemini)
            .api_key("k")
            .build()
            .unwrap();
        assert_eq!(cfg.model(), "gemini-1.5-flash");

        let cfg = ClassifierConfig::builder(Backend::OpenAi)
            .api_key("k")
            .model("  ")
            .build()
            .unwrap();
        assert_eq!(cfg.model(), "gpt-4o-mini");

        let cfg = ClassifierConfig::builder(Backend::OpenAi)
            .api_key("k")
            .model("gpt-4.1")
            .build()
            .unwrap();
        assert_eq!(cfg.model(), "gpt-4.1");
    }

    #[test]
    fn missing_api_key_is_rejected_unless_dry_run() {
        let err = ClassifierConfig::builder(Backend::OpenAi).build().unwrap_err();
        assert!(matches!(err, ClassifyError::MissingApiKey { .. }));

        let err = ClassifierConfig::builder(Backend::OpenAi)
            .api_key("   ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifyError::MissingApiKey { .. }));

        assert!(ClassifierConfig::builder(Backend::OpenAi)
            .dry_run(true)
            .build()
            .is_ok());
    }

    #[test]
    fn output_name_must_be_bare() {
        let err = ClassifierConfig::builder(Backend::OpenAi)
            .dry_run(true)
            .output_file_name("../out.csv")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));
    }

    #[test]
    fn zoom_is_clamped() {
        let cfg = ClassifierConfig::builder(Backend::OpenAi)
            .dry_run(true)
            .pdf_zoom(100.0)
            .build()
            .unwrap();
        assert_eq!(cfg.render.pdf_zoom, 8.0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = ClassifierConfig::builder(Backend::OpenAi)
            .api_key("sk-secret")
            .build()
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn load_instruction_trims() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "\n  Classify the document.  \n").unwrap();
        assert_eq!(load_instruction(f.path()).unwrap(), "Classify the document.");
    }

    #[test]
    fn load_instruction_missing_file() {
        let err = load_instruction("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ClassifyError::InstructionNotFound { .. }));
    }
}
