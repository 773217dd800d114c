//! The page image: the one artifact every renderer produces.
//!
//! Whatever the source (PDF page, photo, text preview), a page ends up as an
//! 8-bit RGB raster encoded as PNG. Fixing the encoding here means the
//! request builder and the backend adapters never need to know where a page
//! came from, and every payload is a standalone decodable image.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// MIME type of every [`PageImage`] payload.
pub const PAGE_MEDIA_TYPE: &str = "image/png";

/// A single rendered page: lossless RGB PNG bytes plus dimensions.
///
/// Immutable once built. Cloning copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

/// Pages of one file in reading order, at most [`crate::config::MAX_PAGES`]
/// long. Empty means "unsupported or unrenderable".
pub type PageSequence = Vec<PageImage>;

impl PageImage {
    /// Encode an RGB raster as a page.
    pub fn from_rgb(img: RgbImage) -> Result<Self, image::ImageError> {
        let (width, height) = img.dimensions();
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self { width, height, png })
    }

    /// Flatten any decoded image to RGB (alpha and palette dropped) and encode it.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self, image::ImageError> {
        Self::from_rgb(img.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The PNG payload.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn media_type(&self) -> &'static str {
        PAGE_MEDIA_TYPE
    }
}
