//! Rendering: turn one file into at most [`MAX_PAGES`] page images.
//!
//! The renderer never fails a run. Every outcome is a [`RenderOutcome`]:
//! pages, "unsupported", or a failure carrying its diagnostic. Callers that
//! only want pages use [`RenderOutcome::into_pages`], which maps both of the
//! latter to an empty sequence. A failure part-way through a PDF discards the
//! pages already produced; half a document is never submitted.
//!
//! ## Why spawn_blocking?
//!
//! pdfium and the image codecs are CPU-bound and synchronous. The async run
//! loop calls [`render_file`] through `tokio::task::spawn_blocking` so the
//! runtime's worker threads never stall on a large page.
//!
//! ## Bounds
//!
//! The page cap and the text-character cap are enforced here, not by
//! callers: a 900-page PDF costs five page renders, and a 2 GB log costs one
//! canvas.

use crate::config::{RenderOptions, MAX_PAGES};
use crate::error::RenderError;
use crate::pipeline::input::{FileKind, SourceFile};
use crate::pipeline::page::{PageImage, PageSequence};
use crate::pipeline::text;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of rendering one file.
#[derive(Debug)]
pub enum RenderOutcome {
    /// The file rendered to these pages, in reading order. May be empty
    /// (a PDF with zero pages).
    Rendered(PageSequence),
    /// Extension is not one the renderer handles.
    Unsupported,
    /// Rendering was attempted and failed.
    Failed(RenderError),
}

impl RenderOutcome {
    /// The rendered pages; empty for unsupported or failed files.
    pub fn into_pages(self) -> PageSequence {
        match self {
            RenderOutcome::Rendered(pages) => pages,
            RenderOutcome::Unsupported | RenderOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            RenderOutcome::Rendered(pages) => pages.len(),
            _ => 0,
        }
    }
}

/// Render a file according to its extension.
pub fn render_file(file: &SourceFile, opts: &RenderOptions) -> RenderOutcome {
    let path = file.path();
    let result = match file.kind() {
        FileKind::Unsupported => {
            debug!("Unsupported file type: {}", path.display());
            return RenderOutcome::Unsupported;
        }
        FileKind::Pdf => render_pdf(path, opts),
        FileKind::Image => render_image(path).map(|page| vec![page]),
        FileKind::Text => text::render_text_file(path, &opts.text).map(|page| vec![page]),
    };

    match result {
        Ok(mut pages) => {
            pages.truncate(MAX_PAGES);
            debug!("Rendered {} → {} page(s)", path.display(), pages.len());
            RenderOutcome::Rendered(pages)
        }
        Err(e) => {
            warn!("Render failed for {}: {}", path.display(), e);
            RenderOutcome::Failed(e)
        }
    }
}

/// [`render_file`] on the blocking thread pool.
pub async fn render_file_blocking(file: &SourceFile, opts: &RenderOptions) -> RenderOutcome {
    let file = file.clone();
    let opts = *opts;
    tokio::task::spawn_blocking(move || render_file(&file, &opts))
        .await
        .unwrap_or_else(|e| RenderOutcome::Failed(RenderError::Task(e.to_string())))
}

// ── Raster images ────────────────────────────────────────────────────────

/// Decode an image file and normalise it to a single RGB PNG page.
fn render_image(path: &Path) -> Result<PageImage, RenderError> {
    let decode_err = |source| RenderError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let img = image::ImageReader::open(path)
        .map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(decode_err)?;

    debug!(
        "Decoded image {} → {}x{} {:?}",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(PageImage::from_dynamic(&img)?)
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Bind to a pdfium shared library.
///
/// `PDFIUM_LIB_PATH` (path to the library file) wins; otherwise a library
/// next to the working directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, RenderError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(lib) => Pdfium::bind_to_library(lib),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| RenderError::PdfiumUnavailable(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Rasterise the first [`MAX_PAGES`] pages of a PDF at `opts.pdf_zoom`.
fn render_pdf(path: &Path, opts: &RenderOptions) -> Result<PageSequence, RenderError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| RenderError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let wanted = total_pages.min(MAX_PAGES);
    info!(
        "PDF loaded: {} ({} pages, rendering {})",
        path.display(),
        total_pages,
        wanted
    );

    let max_edge = opts.max_page_edge_px as i32;
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(opts.pdf_zoom)
        .set_maximum_width(max_edge)
        .set_maximum_height(max_edge);

    let mut results = Vec::with_capacity(wanted);

    for (idx, page) in pages.iter().take(wanted).enumerate() {
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| RenderError::RasterisationFailed {
                    path: path.to_path_buf(),
                    page: idx + 1,
                    detail: format!("{e:?}"),
                })?;

        // pdfium hands back BGRA; pages are flattened to RGB without alpha.
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(PageImage::from_dynamic(&image)?);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn write_image(path: &Path, img: &DynamicImage, format: ImageFormat) {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        std::fs::write(path, buf).unwrap();
    }

    #[test]
    fn unsupported_extensions_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["setup.exe", "bundle.zip", "noext"] {
            let p = dir.path().join(name);
            std::fs::write(&p, b"MZ\x90\x00 whatever").unwrap();
            let outcome = render_file(&SourceFile::new(&p), &RenderOptions::default());
            assert!(matches!(outcome, RenderOutcome::Unsupported), "{name}");
            assert!(outcome.into_pages().is_empty());
        }
    }

    #[test]
    fn rgba_png_becomes_one_rgb_page() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("photo.PNG");
        let src = RgbaImage::from_fn(23, 11, |x, y| Rgba([x as u8 * 10, y as u8 * 20, 77, 128]));
        write_image(&p, &DynamicImage::ImageRgba8(src.clone()), ImageFormat::Png);

        let pages = render_file(&SourceFile::new(&p), &RenderOptions::default()).into_pages();
        assert_eq!(pages.len(), 1);

        let decoded = image::load_from_memory(pages[0].png_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (23, 11));
        assert!(!decoded.color().has_alpha());
        let rgb = decoded.to_rgb8();
        for (x, y, px) in src.enumerate_pixels() {
            assert_eq!(rgb.get_pixel(x, y).0, [px.0[0], px.0[1], px.0[2]]);
        }
    }

    #[test]
    fn grayscale_and_bmp_are_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let gray = dir.path().join("scan.png");
        write_image(
            &gray,
            &DynamicImage::ImageLuma8(image::GrayImage::from_pixel(5, 5, image::Luma([42]))),
            ImageFormat::Png,
        );
        let bmp = dir.path().join("pic.bmp");
        write_image(
            &bmp,
            &DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([9, 8, 7]))),
            ImageFormat::Bmp,
        );

        let opts = RenderOptions::default();
        let g = render_file(&SourceFile::new(&gray), &opts).into_pages();
        let decoded = image::load_from_memory(g[0].png_bytes()).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8().get_pixel(2, 2).0, [42, 42, 42]);

        let b = render_file(&SourceFile::new(&bmp), &opts).into_pages();
        assert_eq!((b[0].width(), b[0].height()), (6, 4));
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("photo.jpg");
        write_image(
            &p,
            &DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([120, 60, 30]))),
            ImageFormat::Jpeg,
        );
        let pages = render_file(&SourceFile::new(&p), &RenderOptions::default()).into_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (40, 30));
    }

    #[test]
    fn corrupt_image_is_a_failure_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.png");
        std::fs::write(&p, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
        let outcome = render_file(&SourceFile::new(&p), &RenderOptions::default());
        assert!(matches!(outcome, RenderOutcome::Failed(_)));
        assert_eq!(outcome.page_count(), 0);
    }

    #[test]
    fn corrupt_pdf_is_a_failure_not_a_panic() {
        // Fails either at pdfium binding or at document load; both are Failed.
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.pdf");
        std::fs::write(&p, b"%PDF-1.4 truncated garbage").unwrap();
        let outcome = render_file(&SourceFile::new(&p), &RenderOptions::default());
        assert!(matches!(outcome, RenderOutcome::Failed(_)));
        assert!(outcome.into_pages().is_empty());
    }

    #[test]
    fn text_file_is_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.md");
        std::fs::write(&p, "# Statement\n\nBalance due: 42.00").unwrap();
        let pages = render_file(&SourceFile::new(&p), &RenderOptions::default()).into_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (1600, 2000));
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.webp");
        write_image(
            &img,
            &DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]))),
            ImageFormat::WebP,
        );
        let txt = dir.path().join("b.log");
        std::fs::write(&txt, "2025-01-01 INFO started\n".repeat(100)).unwrap();

        let opts = RenderOptions::default();
        for p in [img, txt] {
            let a = render_file(&SourceFile::new(&p), &opts).into_pages();
            let b = render_file(&SourceFile::new(&p), &opts).into_pages();
            assert_eq!(a.len(), 1);
            assert_eq!(a, b, "{}", p.display());
        }
    }

    #[tokio::test]
    async fn blocking_wrapper_matches_direct_call() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x.txt");
        std::fs::write(&p, "hello").unwrap();
        let file = SourceFile::new(&p);
        let opts = RenderOptions::default();
        let a = render_file_blocking(&file, &opts).await.into_pages();
        let b = render_file(&file, &opts).into_pages();
        assert_eq!(a, b);
    }
}
