//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, resize, and encode to PNG. Cropping and mirroring are
//! lossless pixel copies and live in [`operations`](super::operations).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{PngCompression, ResizeParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image or cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared by rayon workers during export.
pub trait ImageBackend: Sync {
    /// Decode uploaded bytes (PNG or JPEG) into an image.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resize to exactly `params.width` × `params.height`.
    fn resize(
        &self,
        image: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, BackendError>;

    /// Encode as PNG.
    fn encode_png(
        &self,
        image: &DynamicImage,
        compression: PngCompression,
    ) -> Result<Vec<u8>, BackendError>;
}
