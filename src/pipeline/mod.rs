//! Pipeline stages for file classification.
//!
//! Each submodule implements exactly one transformation step. Only the last
//! stage (the backend call, in [`crate::providers`]) touches the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ page ──▶ encode ──▶ dispatch/providers
//! (walk)   (pdf/img/txt) (PNG)  (base64)   (backend call)
//! ```
//!
//! 1. [`input`] : validate the root, list non-hidden files, pick a [`input::FileKind`]
//! 2. [`render`]: PDF pages via pdfium, raster images via `image`, text via
//!    [`text`]; runs in `spawn_blocking`
//! 3. [`page`]  : the fixed RGB PNG page artifact
//! 4. [`encode`]: base64-wrap pages into a [`encode::ClassificationRequest`]

pub mod encode;
pub mod input;
pub mod page;
pub mod render;
pub mod text;
