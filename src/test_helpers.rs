//! Shared test utilities for the emote-slicer test suite.
//!
//! Builders for synthetic cells and sprite sheets, plus small archive readers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let grid = GridSpec::uniform(2, 3, 20, 5, 5);
//! let sheet = sheet_with_content(&grid, &[(0, 1)]);
//! let detection = detect(&sheet, &grid, DEFAULT_THRESHOLD).unwrap();
//! assert!(detection.contains(CellIndex(2)));
//! ```

use crate::archive;
use crate::grid::GridSpec;
use crate::imaging::Cell;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Cells
// =========================================================================

/// Fully opaque square cell.
pub fn opaque_cell(size: u32) -> Cell {
    Cell::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        size,
        size,
        Rgba([40, 160, 220, 255]),
    )))
}

/// Opaque cell whose left half differs from its right half.
pub fn asymmetric_cell(size: u32) -> Cell {
    let img = RgbaImage::from_fn(size, size, |x, _| {
        if x < size / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    Cell::new(DynamicImage::ImageRgba8(img))
}

// =========================================================================
// Sheets
// =========================================================================

/// Width and height that fit every cell of `grid` plus a trailing margin.
pub fn sheet_dimensions(grid: &GridSpec) -> (u32, u32) {
    grid.positions()
        .map(|pos| grid.cell_rect(pos.row, pos.col).unwrap())
        .fold((0, 0), |(w, h), rect| {
            (
                w.max(rect.x + rect.size + grid.margin),
                h.max(rect.y + rect.size + grid.margin),
            )
        })
}

/// Transparent RGBA sheet with opaque content in the listed `(row, col)` cells.
///
/// Each content cell gets a left/right asymmetric fill so mirrored output
/// differs from the original.
pub fn sheet_with_content(grid: &GridSpec, content: &[(u32, u32)]) -> DynamicImage {
    let (width, height) = sheet_dimensions(grid);
    let mut sheet = RgbaImage::new(width, height);
    for &(row, col) in content {
        let rect = grid.cell_rect(row, col).unwrap();
        for dy in 0..rect.size {
            for dx in 0..rect.size {
                let shade = if dx < rect.size / 2 { 230 } else { 30 };
                sheet.put_pixel(
                    rect.x + dx,
                    rect.y + dy,
                    Rgba([shade, (row * 40) as u8, (col * 30) as u8, 255]),
                );
            }
        }
    }
    DynamicImage::ImageRgba8(sheet)
}

/// Encode an image as PNG bytes, the way an upload arrives.
pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Archives
// =========================================================================

/// Entry paths of an archive, in archive order.
pub fn archive_names(bytes: &[u8]) -> Vec<String> {
    archive::read_entries(bytes)
        .unwrap()
        .into_iter()
        .map(|e| e.path)
        .collect()
}
