//! Text preview rendering: draw the start of a text file onto one white page.
//!
//! Backends only accept images here, so plain text, Markdown, e-mail, logs
//! and CSV are shown to them the same way a human would glance at them: as
//! a page of text. Only a preview is guaranteed. Input is cut to
//! [`TEXT_CHAR_LIMIT`] characters first, and drawing stops at the bottom
//! margin of a single fixed-size canvas, so neither a huge file nor a long
//! line can grow the render.
//!
//! Glyphs come from the `font8x8` bitmap tables, scaled by an integer factor.
//! That keeps the output byte-identical across machines: no system fonts,
//! no anti-aliasing, no hinting.

use crate::config::{TextCanvas, TEXT_CHAR_LIMIT};
use crate::error::RenderError;
use crate::pipeline::page::PageImage;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Edge of an unscaled glyph cell in pixels.
const GLYPH_PX: u32 = 8;

/// Read size for the streaming decoder.
const READ_CHUNK: usize = 8 * 1024;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Render the beginning of a text file as a single page.
pub fn render_text_file(path: &Path, canvas: &TextCanvas) -> Result<PageImage, RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let (text, bytes_read) = read_valid_prefix(file, TEXT_CHAR_LIMIT).map_err(io_err)?;
    debug!(
        "Text preview of {}: {} bytes read, {} chars kept",
        path.display(),
        bytes_read,
        text.chars().count()
    );

    Ok(render_text(&text, canvas)?)
}

/// Collect the first `limit` valid UTF-8 characters of `reader`.
///
/// Invalid byte sequences are dropped before counting, so a long run of junk
/// ahead of the text does not eat into the limit. Reading stops as soon as
/// the limit is reached or the input ends. Returns the text and the number of
/// bytes consumed.
pub fn read_valid_prefix(reader: impl Read, limit: usize) -> io::Result<(String, u64)> {
    let mut reader = BufReader::new(reader);
    let mut text = String::new();
    let mut kept = 0usize;
    let mut consumed = 0u64;
    // Bytes of a sequence split across two reads; never more than three.
    let mut carry: Vec<u8> = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    while kept < limit {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        consumed += n as u64;
        carry.extend_from_slice(&buf[..n]);

        let mut rest: &[u8] = &carry;
        while kept < limit {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    kept += push_chars(&mut text, valid, limit - kept);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        kept += push_chars(&mut text, valid, limit - kept);
                    }
                    match e.error_len() {
                        Some(bad) => rest = &after[bad..],
                        // Incomplete sequence at the end of the buffer.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        carry = rest.to_vec();
    }

    Ok((text, consumed))
}

/// Append at most `max` characters of `s` to `out`; returns how many.
fn push_chars(out: &mut String, s: &str, max: usize) -> usize {
    let taken = truncate_chars(s, max);
    out.push_str(taken);
    taken.chars().count()
}

/// The first `limit` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Draw `text` onto a blank canvas with greedy word wrap.
pub fn render_text(text: &str, canvas: &TextCanvas) -> Result<PageImage, image::ImageError> {
    let scale = canvas.glyph_scale.max(1);
    let max_width = canvas.width.saturating_sub(2 * canvas.margin);
    let line_height = GLYPH_PX * scale;
    let pitch = line_height + canvas.line_spacing;
    let bottom = canvas.height.saturating_sub(canvas.margin);

    let mut img = RgbImage::from_pixel(canvas.width, canvas.height, WHITE);

    let lines = wrap_words(text, max_width, scale);
    let mut y = canvas.margin;
    let mut drawn = 0usize;
    for line in &lines {
        if y + line_height > bottom {
            break;
        }
        draw_line(&mut img, line, canvas.margin, y, scale);
        drawn += 1;
        y += pitch;
    }
    debug!("Text canvas: {}/{} lines drawn", drawn, lines.len());

    PageImage::from_rgb(img)
}

/// Pixel width of `s` when drawn at `scale`.
fn text_width(s: &str, scale: u32) -> u32 {
    (s.chars().count() as u32).saturating_mul(GLYPH_PX * scale)
}

/// Greedy word wrap on whitespace-separated words.
///
/// Words are added to the current line while it still fits in `max_width`;
/// the first word that does not fit closes the line and opens the next one.
/// A single word wider than the canvas gets a line of its own and is clipped
/// when drawn.
pub fn wrap_words(text: &str, max_width: u32, scale: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, scale) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn glyph_for(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_line(img: &mut RgbImage, line: &str, x0: u32, y0: u32, scale: u32) {
    let advance = GLYPH_PX * scale;
    let (w, h) = img.dimensions();

    for (i, c) in line.chars().enumerate() {
        let gx = x0 + i as u32 * advance;
        if gx >= w {
            break;
        }
        for (row, bits) in glyph_for(c).iter().enumerate() {
            for col in 0..GLYPH_PX {
                // Bit 0 is the leftmost pixel of the row.
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = gx + col * scale;
                let py = y0 + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (x, y) = (px + dx, py + dy);
                        if x < w && y < h {
                            img.put_pixel(x, y, BLACK);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn small_canvas() -> TextCanvas {
        TextCanvas {
            width: 200,
            height: 100,
            margin: 10,
            line_spacing: 2,
            glyph_scale: 1,
        }
    }

    fn decode(page: &PageImage) -> RgbImage {
        image::load_from_memory(page.png_bytes()).unwrap().to_rgb8()
    }

    #[test]
    fn wrap_is_greedy() {
        // scale 1 → 8 px per char; 40 px → 5 chars per line
        let lines = wrap_words("aa bb ccc dddddd e", 40, 1);
        assert_eq!(lines, vec!["aa bb", "ccc", "dddddd", "e"]);
    }

    #[test]
    fn wrap_collapses_whitespace_and_skips_empty_lines() {
        let lines = wrap_words("  toolongword\n\n  x\ty ", 24, 1);
        assert_eq!(lines, vec!["toolongword", "x y"]);
        assert!(wrap_words(" \n\t ", 100, 1).is_empty());
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        let long = "ü".repeat(TEXT_CHAR_LIMIT + 10);
        assert_eq!(truncate_chars(&long, TEXT_CHAR_LIMIT).chars().count(), TEXT_CHAR_LIMIT);
    }

    #[test]
    fn invalid_utf8_is_dropped() {
        let bytes: &[u8] = b"ab\xff\xfecd\xe2\x82";
        let (text, consumed) = read_valid_prefix(bytes, 100).unwrap();
        assert_eq!(text, "abcd");
        assert_eq!(consumed, bytes.len() as u64);
    }

    #[test]
    fn sequence_split_across_reads_is_kept() {
        // 'é' straddles the READ_CHUNK boundary.
        let mut bytes = vec![b'a'; READ_CHUNK - 1];
        bytes.extend_from_slice("éz".as_bytes());
        let (text, _) = read_valid_prefix(bytes.as_slice(), usize::MAX).unwrap();
        assert!(text.ends_with("éz"));
        assert_eq!(text.chars().count(), READ_CHUNK + 1);
    }

    #[test]
    fn reading_stops_at_the_character_limit() {
        let bytes = "ü".repeat(TEXT_CHAR_LIMIT * 4);
        let (text, consumed) = read_valid_prefix(bytes.as_bytes(), TEXT_CHAR_LIMIT).unwrap();
        assert_eq!(text.chars().count(), TEXT_CHAR_LIMIT);
        assert!(consumed < bytes.len() as u64);
    }

    #[test]
    fn long_invalid_prefix_does_not_hide_the_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noisy.log");
        let mut bytes = vec![0xFFu8; 40_000];
        bytes.extend_from_slice(b"HELLO WORLD");
        std::fs::write(&path, bytes).unwrap();

        let canvas = TextCanvas::default();
        let from_file = render_text_file(&path, &canvas).unwrap();
        let expected = render_text("HELLO WORLD", &canvas).unwrap();
        assert_eq!(from_file.png_bytes(), expected.png_bytes());
    }

    #[test]
    fn canvas_has_fixed_size() {
        let canvas = TextCanvas::default();
        let page = render_text("hello world", &canvas).unwrap();
        assert_eq!((page.width(), page.height()), (1600, 2000));
        let empty = render_text("", &canvas).unwrap();
        assert_eq!((empty.width(), empty.height()), (1600, 2000));
    }

    #[test]
    fn text_is_drawn_inside_margins() {
        let canvas = small_canvas();
        let img = decode(&render_text("HELLO", &canvas).unwrap());
        let dark: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dark.is_empty(), "expected glyph pixels");
        for (x, y) in dark {
            assert!(x >= 10 && x < 190, "x={x} outside margins");
            assert!(y >= 10 && y < 90, "y={y} outside margins");
        }
    }

    #[test]
    fn blank_text_gives_white_page() {
        let img = decode(&render_text("   ", &small_canvas()).unwrap());
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn overflowing_lines_are_dropped() {
        // 8 px glyphs on a 10 px pitch between y = 10 and y = 90: eight lines
        // fit (y = 10..=80). 60 words at five per line make twelve.
        let canvas = small_canvas();
        let text = (0..60).map(|i| format!("w{i:02}")).collect::<Vec<_>>().join(&" ".repeat(30));
        let with_extra = format!("{text} trailing words that never show");
        let a = render_text(&text, &canvas).unwrap();
        let b = render_text(&with_extra, &canvas).unwrap();
        assert_eq!(a.png_bytes(), b.png_bytes());

        let img = decode(&a);
        let lowest_dark = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [0, 0, 0])
            .map(|(_, y, _)| y)
            .max()
            .unwrap();
        assert!(lowest_dark < 90, "lowest dark row {lowest_dark}");
    }

    #[test]
    fn render_is_deterministic() {
        let canvas = TextCanvas::default();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(50);
        let a = render_text(&text, &canvas).unwrap();
        let b = render_text(&text, &canvas).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn file_content_past_limit_does_not_change_render() {
        let dir = tempfile::tempdir().unwrap();
        let head: String = "abc ".repeat(TEXT_CHAR_LIMIT / 4);
        assert_eq!(head.chars().count(), TEXT_CHAR_LIMIT);

        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, format!("{head}ZZZZ YYYY")).unwrap();
        std::fs::write(&b, format!("{head}completely different tail")).unwrap();

        let canvas = TextCanvas::default();
        let pa = render_text_file(&a, &canvas).unwrap();
        let pb = render_text_file(&b, &canvas).unwrap();
        assert_eq!(pa.png_bytes(), pb.png_bytes());
        assert_eq!(
            image::load_from_memory(pa.png_bytes()).unwrap().dimensions(),
            (1600, 2000)
        );
    }
}
