//! High-level image operations: cell extraction, mirroring, variant rendering.
//!
//! [`plan_variants`] decides *which* outputs a cell produces and is pure;
//! [`render_variants`] executes a plan against an [`ImageBackend`].

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{covers_cell, is_downscale, ladder_top, visible_region};
use super::params::{PngCompression, ResizeParams, Resampling};
use crate::grid::CellRect;
use crate::naming::{Orientation, VariantKind, variant_label};
use crate::types::Category;
use image::{DynamicImage, ImageBuffer, Pixel, imageops};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("category '{0}' cannot be rendered")]
    InvalidCategory(Category),
    #[error("no sizes configured for category '{0}'")]
    EmptyLadder(Category),
    #[error("{label}: refusing to upscale a {from}px cell to {width}x{height}")]
    Upscale {
        label: String,
        from: u32,
        width: u32,
        height: u32,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// One square region cut out of the source image.
#[derive(Debug, Clone)]
pub struct Cell {
    image: DynamicImage,
}

impl Cell {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }
}

/// Copy `rect` out of `image`.
///
/// Parts of the rectangle past the image edge are zero-filled in the image's
/// own color type, so an overhanging cell of an RGBA sheet is transparent
/// there and the cell always has the full `rect.size`.
pub fn extract(image: &DynamicImage, rect: CellRect) -> Cell {
    let region = visible_region(rect, Dimensions::of(image));
    match region {
        Some(region) if covers_cell(&region, rect) => {
            Cell::new(image.crop_imm(rect.x, rect.y, rect.size, rect.size))
        }
        Some(region) => {
            let visible = image.crop_imm(region.x, region.y, region.width, region.height);
            Cell::new(pad(visible, rect.size))
        }
        None => Cell::new(DynamicImage::new(rect.size, rect.size, image.color())),
    }
}

/// Place `visible` at the top-left of a zeroed `size`×`size` canvas.
///
/// Copies in the image's own pixel type so 16-bit and float sheets keep
/// their precision.
fn pad(visible: DynamicImage, size: u32) -> DynamicImage {
    fn canvas<P: Pixel>(
        top: &ImageBuffer<P, Vec<P::Subpixel>>,
        size: u32,
    ) -> ImageBuffer<P, Vec<P::Subpixel>> {
        let mut canvas = ImageBuffer::new(size, size);
        imageops::replace(&mut canvas, top, 0, 0);
        canvas
    }

    match visible {
        DynamicImage::ImageLuma8(b) => DynamicImage::ImageLuma8(canvas(&b, size)),
        DynamicImage::ImageLumaA8(b) => DynamicImage::ImageLumaA8(canvas(&b, size)),
        DynamicImage::ImageRgb8(b) => DynamicImage::ImageRgb8(canvas(&b, size)),
        DynamicImage::ImageRgba8(b) => DynamicImage::ImageRgba8(canvas(&b, size)),
        DynamicImage::ImageLuma16(b) => DynamicImage::ImageLuma16(canvas(&b, size)),
        DynamicImage::ImageLumaA16(b) => DynamicImage::ImageLumaA16(canvas(&b, size)),
        DynamicImage::ImageRgb16(b) => DynamicImage::ImageRgb16(canvas(&b, size)),
        DynamicImage::ImageRgba16(b) => DynamicImage::ImageRgba16(canvas(&b, size)),
        DynamicImage::ImageRgb32F(b) => DynamicImage::ImageRgb32F(canvas(&b, size)),
        DynamicImage::ImageRgba32F(b) => DynamicImage::ImageRgba32F(canvas(&b, size)),
        other => {
            let mut padded = DynamicImage::new(size, size, other.color());
            imageops::replace(&mut padded, &other, 0, 0);
            padded
        }
    }
}

/// Horizontally flipped copy.
pub fn mirror(cell: &Cell) -> Cell {
    Cell::new(cell.image.fliph())
}

/// Everything the renderer needs besides the cell itself.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Sizes for [`Category::Emote`].
    pub emote_sizes: Vec<(u32, u32)>,
    /// Sizes for badges, badge bits and flairs.
    pub badge_sizes: Vec<(u32, u32)>,
    pub filter: Resampling,
    pub compression: PngCompression,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            emote_sizes: vec![(128, 128), (112, 112), (56, 56), (28, 28)],
            badge_sizes: vec![(128, 128), (72, 72), (36, 36), (18, 18)],
            filter: Resampling::default(),
            compression: PngCompression::default(),
        }
    }
}

impl RenderConfig {
    /// Size ladder for a category.
    pub fn sizes_for(&self, category: Category) -> Result<&[(u32, u32)]> {
        let sizes = match category {
            Category::Emote => &self.emote_sizes,
            Category::Badge | Category::BadgeBit | Category::Flair => &self.badge_sizes,
            Category::None => return Err(RenderError::InvalidCategory(category)),
        };
        if sizes.is_empty() {
            return Err(RenderError::EmptyLadder(category));
        }
        Ok(sizes.as_slice())
    }
}

/// One planned output of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    pub label: String,
    pub orientation: Orientation,
    /// `None` keeps the full-resolution crop.
    pub target: Option<(u32, u32)>,
}

/// Plan the outputs of a cell without touching pixels.
///
/// Order: the original (and its flipped copy when mirrored), then each ladder
/// size in order, flipped copy right after its as-drawn twin.
pub fn plan_variants(
    category: Category,
    mirrored: bool,
    config: &RenderConfig,
) -> Result<Vec<VariantPlan>> {
    let sizes = config.sizes_for(category)?;
    let top = ladder_top(sizes);
    let orientations = Orientation::for_cell(mirrored);

    let mut plan = Vec::with_capacity(orientations.len() * (sizes.len() + 1));
    for &orientation in orientations {
        plan.push(VariantPlan {
            label: variant_label(orientation, VariantKind::Original),
            orientation,
            target: None,
        });
    }
    for &(width, height) in sizes {
        let kind = if Some((width, height)) == top {
            VariantKind::DiscordSize
        } else {
            VariantKind::Sized { width, height }
        };
        for &orientation in orientations {
            plan.push(VariantPlan {
                label: variant_label(orientation, kind),
                orientation,
                target: Some((width, height)),
            });
        }
    }
    Ok(plan)
}

/// An encoded output ready for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVariant {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Render every planned output of `cell` as PNG.
pub fn render_variants(
    backend: &impl ImageBackend,
    cell: &Cell,
    category: Category,
    mirrored: bool,
    config: &RenderConfig,
) -> Result<Vec<RenderedVariant>> {
    let plan = plan_variants(category, mirrored, config)?;
    let flipped = mirrored.then(|| mirror(cell));
    let native = cell.dimensions();

    plan.into_iter()
        .map(|item| {
            let source = match (item.orientation, &flipped) {
                (Orientation::Flipped, Some(flipped)) => flipped,
                _ => cell,
            };
            let image = match item.target {
                None => source.image.clone(),
                Some(target) => {
                    if !is_downscale(native, target) {
                        return Err(RenderError::Upscale {
                            label: item.label,
                            from: native.width,
                            width: target.0,
                            height: target.1,
                        });
                    }
                    let params = ResizeParams::new(target.0, target.1, config.filter);
                    backend.resize(&source.image, &params)?
                }
            };
            let bytes = backend.encode_png(&image, config.compression)?;
            Ok(RenderedVariant {
                label: item.label,
                width: image.width(),
                height: image.height(),
                bytes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::RustBackend;
    use crate::test_helpers::{asymmetric_cell, opaque_cell};
    use image::{GenericImageView, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn labels(plan: &[VariantPlan]) -> Vec<&str> {
        plan.iter().map(|p| p.label.as_str()).collect()
    }

    // =========================================================================
    // extract / mirror
    // =========================================================================

    #[test]
    fn extract_copies_rectangle() {
        let mut sheet = RgbaImage::new(40, 30);
        sheet.put_pixel(12, 7, Rgba([255, 0, 0, 255]));
        let cell = extract(
            &DynamicImage::ImageRgba8(sheet),
            CellRect {
                x: 10,
                y: 5,
                size: 10,
            },
        );
        assert_eq!(cell.dimensions(), Dimensions { width: 10, height: 10 });
        assert_eq!(cell.image().get_pixel(2, 2), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn extract_pads_overhang_with_transparency() {
        let sheet = RgbaImage::from_pixel(30, 30, Rgba([9, 9, 9, 255]));
        let cell = extract(
            &DynamicImage::ImageRgba8(sheet),
            CellRect {
                x: 20,
                y: 20,
                size: 20,
            },
        );
        assert_eq!(cell.dimensions(), Dimensions { width: 20, height: 20 });
        assert_eq!(cell.image().get_pixel(5, 5), Rgba([9, 9, 9, 255]));
        assert_eq!(cell.image().get_pixel(15, 5), Rgba([0, 0, 0, 0]));
        assert_eq!(cell.image().get_pixel(5, 15), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn extract_overhang_keeps_sixteen_bit_values() {
        let px = Rgba([0x1234u16, 0x5678, 0x9abc, 0xfffe]);
        let sheet = DynamicImage::ImageRgba16(ImageBuffer::from_pixel(6, 6, px));
        let cell = extract(
            &sheet,
            CellRect {
                x: 2,
                y: 2,
                size: 8,
            },
        );

        let buf = cell.image().as_rgba16().unwrap();
        assert_eq!(buf.dimensions(), (8, 8));
        assert_eq!(*buf.get_pixel(0, 0), px);
        assert_eq!(*buf.get_pixel(3, 3), px);
        assert_eq!(*buf.get_pixel(4, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*buf.get_pixel(7, 7), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn extract_overhang_keeps_luma_alpha() {
        let sheet = DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(4, 4, LumaA([77u8, 200])));
        let cell = extract(
            &sheet,
            CellRect {
                x: 2,
                y: 0,
                size: 4,
            },
        );
        let buf = cell.image().as_luma_alpha8().unwrap();
        assert_eq!(*buf.get_pixel(1, 3), LumaA([77, 200]));
        assert_eq!(*buf.get_pixel(2, 0), LumaA([0, 0]));
    }

    #[test]
    fn extract_outside_keeps_color_type() {
        let sheet = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([1, 2, 3])));
        let cell = extract(
            &sheet,
            CellRect {
                x: 50,
                y: 50,
                size: 8,
            },
        );
        assert_eq!(cell.image().color(), image::ColorType::Rgb8);
        assert_eq!(cell.dimensions(), Dimensions { width: 8, height: 8 });
    }

    #[test]
    fn mirror_flips_horizontally_without_touching_input() {
        let cell = asymmetric_cell(8);
        let before = cell.image().clone();
        let flipped = mirror(&cell);
        assert_eq!(cell.image(), &before);
        assert_eq!(
            flipped.image().get_pixel(7, 3),
            cell.image().get_pixel(0, 3)
        );
        assert_ne!(flipped.image(), cell.image());
    }

    // =========================================================================
    // plan_variants
    // =========================================================================

    #[test]
    fn plan_emote_single() {
        let plan = plan_variants(Category::Emote, false, &RenderConfig::default()).unwrap();
        assert_eq!(
            labels(&plan),
            vec![
                "_Original",
                "_DiscordSize",
                "_112x112",
                "_56x56",
                "_28x28"
            ]
        );
        assert_eq!(plan[0].target, None);
        assert_eq!(plan[1].target, Some((128, 128)));
    }

    #[test]
    fn plan_badge_mirrored_interleaves_orientations() {
        let plan = plan_variants(Category::Badge, true, &RenderConfig::default()).unwrap();
        assert_eq!(
            labels(&plan),
            vec![
                "A_Original",
                "B_Original",
                "A_DiscordSize",
                "B_DiscordSize",
                "A_72x72",
                "B_72x72",
                "A_36x36",
                "B_36x36",
                "A_18x18",
                "B_18x18",
            ]
        );
    }

    #[test]
    fn plan_flair_and_badge_bit_use_badge_ladder() {
        let config = RenderConfig::default();
        for category in [Category::Flair, Category::BadgeBit] {
            let plan = plan_variants(category, false, &config).unwrap();
            assert_eq!(labels(&plan)[2], "_72x72");
        }
    }

    #[test]
    fn plan_rejects_none_category() {
        let err = plan_variants(Category::None, false, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidCategory(Category::None)));
    }

    #[test]
    fn plan_rejects_empty_ladder() {
        let config = RenderConfig {
            emote_sizes: vec![],
            ..RenderConfig::default()
        };
        let err = plan_variants(Category::Emote, false, &config).unwrap_err();
        assert!(matches!(err, RenderError::EmptyLadder(Category::Emote)));
    }

    // =========================================================================
    // render_variants
    // =========================================================================

    #[test]
    fn render_emote_produces_five_entries() {
        let backend = MockBackend::new();
        let cell = opaque_cell(500);
        let out = render_variants(
            &backend,
            &cell,
            Category::Emote,
            false,
            &RenderConfig::default(),
        )
        .unwrap();

        let shapes: Vec<(&str, u32)> = out.iter().map(|v| (v.label.as_str(), v.width)).collect();
        assert_eq!(
            shapes,
            vec![
                ("_Original", 500),
                ("_DiscordSize", 128),
                ("_112x112", 112),
                ("_56x56", 56),
                ("_28x28", 28),
            ]
        );
    }

    #[test]
    fn render_resizes_from_native_cell_with_fixed_filter() {
        let backend = MockBackend::new();
        let cell = opaque_cell(300);
        render_variants(
            &backend,
            &cell,
            Category::Badge,
            true,
            &RenderConfig::default(),
        )
        .unwrap();

        let resizes: Vec<RecordedOp> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Resize { .. }))
            .collect();
        assert_eq!(resizes.len(), 8);
        for op in resizes {
            assert!(matches!(
                op,
                RecordedOp::Resize {
                    from: (300, 300),
                    filter: Resampling::CatmullRom,
                    ..
                }
            ));
        }
    }

    #[test]
    fn render_mirrored_produces_ten_entries_with_distinct_originals() {
        let backend = RustBackend::new();
        let cell = asymmetric_cell(500);
        let out = render_variants(
            &backend,
            &cell,
            Category::Emote,
            true,
            &RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(out.len(), 10);
        assert_eq!(out[0].label, "A_Original");
        assert_eq!(out[1].label, "B_Original");
        assert_ne!(out[0].bytes, out[1].bytes);
        assert!(out.iter().all(|v| v.bytes.starts_with(b"\x89PNG")));
    }

    #[test]
    fn render_refuses_upscale() {
        let backend = MockBackend::new();
        let cell = opaque_cell(100);
        let err = render_variants(
            &backend,
            &cell,
            Category::Emote,
            false,
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Upscale {
                from: 100,
                width: 128,
                ..
            }
        ));
    }
}
