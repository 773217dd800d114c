//! Request building: pages + instruction → provider-neutral request.
//!
//! Multimodal APIs (OpenAI, Anthropic, Gemini) take images as base64 strings
//! embedded in the JSON body. Encoding happens once here, so each adapter
//! only arranges already-encoded payloads into its own envelope and nothing
//! is ever re-rendered.

use crate::config::MAX_PAGES;
use crate::pipeline::page::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::debug;

/// One page, ready for embedding in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPage {
    /// Base64 (standard alphabet, padded) of the PNG payload.
    pub data: String,
    /// Always `image/png`.
    pub media_type: &'static str,
}

impl EncodedPage {
    /// `data:` URI form, for APIs that take image URLs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Base64-encode one page.
pub fn encode_page(page: &PageImage) -> EncodedPage {
    let data = STANDARD.encode(page.png_bytes());
    debug!("Encoded page → {} bytes base64", data.len());
    EncodedPage {
        data,
        media_type: page.media_type(),
    }
}

/// Instruction plus encoded pages for a single file. Built fresh per file.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    instruction: Arc<str>,
    pages: Vec<EncodedPage>,
}

impl ClassificationRequest {
    /// Build a request from rendered pages, keeping at most [`MAX_PAGES`].
    pub fn build(instruction: Arc<str>, pages: &[PageImage]) -> Self {
        let pages = pages.iter().take(MAX_PAGES).map(encode_page).collect();
        Self { instruction, pages }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn pages(&self) -> &[EncodedPage] {
        &self.pages
    }
}
