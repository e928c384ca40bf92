//! Pure calculation functions for cell and variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use crate::grid::CellRect;

/// Portion of a cell rectangle that overlaps the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRegion {
    /// Top-left corner in source coordinates (equals the cell's origin).
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clip a cell rectangle to the image bounds.
///
/// Cell origins are never negative, so only the right and bottom edges can
/// overhang. Returns `None` when the cell lies entirely outside the image.
///
/// # Examples
/// ```
/// # use emote_slicer::grid::CellRect;
/// # use emote_slicer::imaging::{Dimensions, visible_region};
/// let image = Dimensions { width: 1000, height: 800 };
/// let rect = CellRect { x: 800, y: 150, size: 500 };
/// let region = visible_region(rect, image).unwrap();
/// assert_eq!((region.width, region.height), (200, 500));
/// ```
pub fn visible_region(rect: CellRect, image: Dimensions) -> Option<VisibleRegion> {
    if rect.x >= image.width || rect.y >= image.height || rect.size == 0 {
        return None;
    }
    Some(VisibleRegion {
        x: rect.x,
        y: rect.y,
        width: rect.size.min(image.width - rect.x),
        height: rect.size.min(image.height - rect.y),
    })
}

/// Whether the region covers the whole cell (no padding needed).
pub fn covers_cell(region: &VisibleRegion, rect: CellRect) -> bool {
    region.width == rect.size && region.height == rect.size
}

/// The ladder entry labelled as the Discord upload size: the largest by area,
/// first one winning ties.
///
/// ```
/// # use emote_slicer::imaging::ladder_top;
/// assert_eq!(ladder_top(&[(128, 128), (112, 112), (56, 56)]), Some((128, 128)));
/// assert_eq!(ladder_top(&[(36, 36), (72, 72)]), Some((72, 72)));
/// assert_eq!(ladder_top(&[]), None);
/// ```
pub fn ladder_top(sizes: &[(u32, u32)]) -> Option<(u32, u32)> {
    sizes.iter().copied().fold(None, |best, size| match best {
        Some(b) if area(b) >= area(size) => Some(b),
        _ => Some(size),
    })
}

fn area((w, h): (u32, u32)) -> u64 {
    w as u64 * h as u64
}

/// Fraction of pixels that are fully transparent. An empty cell counts as
/// fully transparent.
pub fn transparent_fraction(transparent: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    transparent as f64 / total as f64
}

/// True when `target` fits inside `source` on both axes.
pub fn is_downscale(source: Dimensions, target: (u32, u32)) -> bool {
    target.0 <= source.width && target.1 <= source.height
}
