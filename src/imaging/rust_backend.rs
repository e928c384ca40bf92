//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with the configured filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::params::{PngCompression, ResizeParams, Resampling};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const UPLOAD_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    UPLOAD_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of upload extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend built on the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(filter: Resampling) -> FilterType {
    match filter {
        Resampling::Nearest => FilterType::Nearest,
        Resampling::Triangle => FilterType::Triangle,
        Resampling::CatmullRom => FilterType::CatmullRom,
        Resampling::Gaussian => FilterType::Gaussian,
        Resampling::Lanczos3 => FilterType::Lanczos3,
    }
}

fn compression_type(compression: PngCompression) -> CompressionType {
    match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, BackendError> {
        Ok(image.resize_exact(params.width, params.height, filter_type(params.filter)))
    }

    fn encode_png(
        &self,
        image: &DynamicImage,
        compression: PngCompression,
    ) -> Result<Vec<u8>, BackendError> {
        // PNG has no float formats
        let converted;
        let image = match image.color() {
            ColorType::Rgb32F | ColorType::Rgba32F => {
                converted = DynamicImage::ImageRgba16(image.to_rgba16());
                &converted
            }
            _ => image,
        };

        let mut buf = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buf, compression_type(compression), PngFilter::Adaptive);
        image
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn encoded_fixture() -> Vec<u8> {
        let mut img = RgbaImage::new(6, 4);
        img.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn png_and_jpeg_are_supported() {
        let exts = supported_input_extensions();
        assert!(exts.contains(&"png"));
        assert!(exts.contains(&"jpg"));
        assert!(exts.contains(&"jpeg"));
    }

    #[test]
    fn decode_round_trips_png() {
        let backend = RustBackend::new();
        let img = backend.decode(&encoded_fixture()).unwrap();
        assert_eq!(img.dimensions(), (6, 4));
        assert_eq!(img.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn decode_rejects_garbage() {
        let backend = RustBackend::new();
        let err = backend.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn resize_is_exact() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgba8(500, 500);
        let out = backend
            .resize(&img, &ResizeParams::new(72, 72, Resampling::CatmullRom))
            .unwrap();
        assert_eq!(out.dimensions(), (72, 72));
    }

    #[test]
    fn encode_is_deterministic_and_lossless() {
        let backend = RustBackend::new();
        let img = backend.decode(&encoded_fixture()).unwrap();
        let a = backend.encode_png(&img, PngCompression::Best).unwrap();
        let b = backend.encode_png(&img, PngCompression::Best).unwrap();
        assert_eq!(a, b);
        let back = backend.decode(&a).unwrap();
        assert_eq!(back.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn encode_converts_float_images() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgba32f(4, 4);
        let bytes = backend.encode_png(&img, PngCompression::Fast).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
