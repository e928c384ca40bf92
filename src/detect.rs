//! Detection pass: which grid cells hold content.
//!
//! A cell is *empty* when more than `threshold` of its pixels are fully
//! transparent (alpha exactly zero). Images without a 4-channel alpha layout
//! carry no transparency information, so their cells are always treated as
//! content.
//!
//! [`detect`] runs once per uploaded image. It is pure; callers that re-run it
//! for the same upload should memoize through
//! [`DetectionCache`](crate::cache::DetectionCache).

use crate::grid::{GridError, GridSpec};
use crate::imaging::{Cell, extract, transparent_fraction};
use crate::types::{CellIndex, CellPosition};
use image::DynamicImage;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default emptiness threshold: only near-fully transparent cells are empty.
pub const DEFAULT_THRESHOLD: f64 = 0.99;

/// Count of pixels whose alpha is exactly zero, or `None` without alpha.
fn transparent_pixels(image: &DynamicImage) -> Option<u64> {
    let count = match image {
        DynamicImage::ImageRgba8(buf) => buf.pixels().filter(|p| p[3] == 0).count(),
        DynamicImage::ImageRgba16(buf) => buf.pixels().filter(|p| p[3] == 0).count(),
        DynamicImage::ImageRgba32F(buf) => buf.pixels().filter(|p| p[3] == 0.0).count(),
        other if other.color().channel_count() >= 4 => {
            other.to_rgba8().pixels().filter(|p| p[3] == 0).count()
        }
        _ => return None,
    };
    Some(count as u64)
}

/// True when the cell is background.
///
/// Strict comparison: a cell exactly at the threshold is content.
pub fn is_empty(cell: &Cell, threshold: f64) -> bool {
    let image = cell.image();
    let Some(transparent) = transparent_pixels(image) else {
        return false;
    };
    let total = image.width() as u64 * image.height() as u64;
    transparent_fraction(transparent, total) > threshold
}

/// Non-empty cells of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// Content cells, ordered by index.
    pub cells: BTreeMap<CellIndex, CellPosition>,
    /// Rows with at least one content cell.
    pub rows: BTreeSet<u32>,
}

impl Detection {
    pub fn contains(&self, index: CellIndex) -> bool {
        self.cells.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Content cells of `row`, left to right.
    pub fn cells_in_row(&self, row: u32) -> Vec<CellIndex> {
        let mut cells: Vec<(u32, CellIndex)> = self
            .cells
            .iter()
            .filter(|(_, pos)| pos.row == row)
            .map(|(index, pos)| (pos.col, *index))
            .collect();
        cells.sort();
        cells.into_iter().map(|(_, index)| index).collect()
    }
}

/// Classify every declared cell of `grid` in `image`.
pub fn detect(
    image: &DynamicImage,
    grid: &GridSpec,
    threshold: f64,
) -> Result<Detection, GridError> {
    let mut detection = Detection::default();
    for pos in grid.positions() {
        let rect = grid.cell_rect(pos.row, pos.col)?;
        let index = grid.cell_index(pos.row, pos.col)?;
        let cell = extract(image, rect);
        if is_empty(&cell, threshold) {
            debug!(%index, row = pos.row, col = pos.col, "empty cell");
            continue;
        }
        debug!(%index, row = pos.row, col = pos.col, "content cell");
        detection.cells.insert(index, pos);
        detection.rows.insert(pos.row);
    }
    Ok(detection)
}
