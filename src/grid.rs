//! Grid geometry: where each cell of a sprite sheet lives.
//!
//! A sheet is described by a [`GridSpec`]: a top margin, an inter-cell gap,
//! and an ordered list of [`RowBand`]s. Each band is a run of rows sharing one
//! cell size, column count and left margin, so a sheet whose trailing rows use
//! smaller cells is just a second band, not a special case.
//!
//! ```text
//!  margin
//!  ┌────────────────────────────────────────────┐
//!  │  [500] gap [500] gap [500] ...   band 0     │  rows 0..3, 7 cols
//!  │  [500] gap [500] gap [500] ...              │
//!  │  [500] gap [500] gap [500] ...              │
//!  │  [300][300][300][300] ...        band 1     │  rows 3..5, 10 cols
//!  └────────────────────────────────────────────┘
//! ```
//!
//! ## Cell numbering
//!
//! Cells are numbered `row * stride + col + 1`, where `row` is the global row
//! index and `stride` is the band's column count unless the band declares its
//! own `index_stride`. Numbering therefore restarts its arithmetic per band,
//! and two bands can produce the same number. [`GridSpec::validate`] rejects
//! such layouts so a [`CellIndex`] stays a unique key.

use crate::types::{CellIndex, CellPosition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell (row {row}, col {col}) is outside the grid")]
    InvalidCell { row: u32, col: u32 },
    #[error("cell index {0} does not map to any grid position")]
    UnknownIndex(CellIndex),
    #[error("invalid grid layout: {0}")]
    Layout(String),
}

/// A run of rows sharing cell size, column count and left margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowBand {
    /// Number of rows in this band.
    pub rows: u32,
    /// Columns per row.
    pub cols: u32,
    /// Edge length of the square cells, in pixels.
    pub cell_size: u32,
    /// Left margin before the first column.
    pub margin: u32,
    /// Multiplier used for cell numbering. Defaults to `cols`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_stride: Option<u32>,
    /// Absolute top of the band's first row. Defaults to directly below the
    /// previous band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_offset: Option<u32>,
}

impl RowBand {
    pub fn uniform(rows: u32, cols: u32, cell_size: u32, margin: u32) -> Self {
        Self {
            rows,
            cols,
            cell_size,
            margin,
            index_stride: None,
            y_offset: None,
        }
    }

    pub fn stride(&self) -> u32 {
        self.index_stride.unwrap_or(self.cols)
    }
}

/// Pixel rectangle of one square cell in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Full sheet layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSpec {
    /// Top margin above the first band.
    pub margin: u32,
    /// Gap between neighbouring cells, both horizontally and vertically.
    pub gap: u32,
    pub bands: Vec<RowBand>,
}

impl Default for GridSpec {
    /// Five rows of seven 500 px cells, 150 px margin and gap.
    fn default() -> Self {
        Self {
            margin: 150,
            gap: 150,
            bands: vec![RowBand::uniform(5, 7, 500, 150)],
        }
    }
}

/// A band together with its resolved position in the sheet.
#[derive(Debug, Clone, Copy)]
struct BandSlot<'a> {
    band: &'a RowBand,
    first_row: u32,
    y_start: u32,
}

impl GridSpec {
    /// Uniform grid with a single band.
    pub fn uniform(rows: u32, cols: u32, cell_size: u32, margin: u32, gap: u32) -> Self {
        Self {
            margin,
            gap,
            bands: vec![RowBand::uniform(rows, cols, cell_size, margin)],
        }
    }

    fn slots(&self) -> impl Iterator<Item = BandSlot<'_>> {
        let mut first_row = 0u32;
        let mut next_y = self.margin;
        self.bands.iter().map(move |band| {
            let y_start = band.y_offset.unwrap_or(next_y);
            let slot = BandSlot {
                band,
                first_row,
                y_start,
            };
            first_row = first_row.saturating_add(band.rows);
            next_y = y_start.saturating_add(
                band.rows
                    .saturating_mul(band.cell_size.saturating_add(self.gap)),
            );
            slot
        })
    }

    fn slot_for_row(&self, row: u32) -> Option<BandSlot<'_>> {
        self.slots()
            .find(|s| row >= s.first_row && row < s.first_row.saturating_add(s.band.rows))
    }

    /// Total number of rows across all bands.
    pub fn row_count(&self) -> u32 {
        self.bands.iter().map(|b| b.rows).fold(0, u32::saturating_add)
    }

    /// Column count of `row`.
    pub fn cols(&self, row: u32) -> Result<u32, GridError> {
        self.slot_for_row(row)
            .map(|s| s.band.cols)
            .ok_or(GridError::InvalidCell { row, col: 0 })
    }

    /// Smallest cell edge in the layout (the ceiling for variant sizes).
    pub fn min_cell_size(&self) -> Option<u32> {
        self.bands.iter().map(|b| b.cell_size).min()
    }

    fn checked_slot(&self, row: u32, col: u32) -> Result<BandSlot<'_>, GridError> {
        self.slot_for_row(row)
            .filter(|s| col < s.band.cols)
            .ok_or(GridError::InvalidCell { row, col })
    }

    /// Pixel rectangle of the cell at `(row, col)`.
    pub fn cell_rect(&self, row: u32, col: u32) -> Result<CellRect, GridError> {
        let slot = self.checked_slot(row, col)?;
        let size = slot.band.cell_size;
        let overflow = || {
            GridError::Layout(format!(
                "cell (row {row}, col {col}) overflows u32 pixel coordinates"
            ))
        };
        let step = size.checked_add(self.gap).ok_or_else(overflow)?;
        let x = col
            .checked_mul(step)
            .and_then(|dx| dx.checked_add(slot.band.margin))
            .ok_or_else(overflow)?;
        let y = (row - slot.first_row)
            .checked_mul(step)
            .and_then(|dy| dy.checked_add(slot.y_start))
            .ok_or_else(overflow)?;
        Ok(CellRect { x, y, size })
    }

    /// Linear index of the cell at `(row, col)`: `row * stride + col + 1`.
    pub fn cell_index(&self, row: u32, col: u32) -> Result<CellIndex, GridError> {
        let slot = self.checked_slot(row, col)?;
        row.checked_mul(slot.band.stride())
            .and_then(|n| n.checked_add(col))
            .and_then(|n| n.checked_add(1))
            .map(CellIndex)
            .ok_or_else(|| {
                GridError::Layout(format!("cell (row {row}, col {col}) has no u32 cell number"))
            })
    }

    /// Inverse of [`cell_index`](Self::cell_index).
    pub fn position(&self, index: CellIndex) -> Result<CellPosition, GridError> {
        let zero_based = index
            .get()
            .checked_sub(1)
            .ok_or(GridError::UnknownIndex(index))?;
        self.slots()
            .find_map(|slot| {
                let stride = slot.band.stride();
                if stride == 0 {
                    return None;
                }
                let row = zero_based / stride;
                let col = zero_based % stride;
                let in_band = row >= slot.first_row && row < slot.first_row.saturating_add(slot.band.rows);
                (in_band && col < slot.band.cols).then_some(CellPosition { row, col })
            })
            .ok_or(GridError::UnknownIndex(index))
    }

    /// Pixel rectangle of the cell numbered `index`.
    pub fn rect_for_index(&self, index: CellIndex) -> Result<CellRect, GridError> {
        let pos = self.position(index)?;
        self.cell_rect(pos.row, pos.col)
    }

    /// Every declared position, row-major.
    pub fn positions(&self) -> impl Iterator<Item = CellPosition> + '_ {
        self.slots().flat_map(|slot| {
            (slot.first_row..slot.first_row.saturating_add(slot.band.rows)).flat_map(move |row| {
                (0..slot.band.cols).map(move |col| CellPosition { row, col })
            })
        })
    }

    /// Total number of declared cells.
    pub fn cell_count(&self) -> u32 {
        self.bands
            .iter()
            .map(|b| b.rows.saturating_mul(b.cols))
            .fold(0, u32::saturating_add)
    }

    /// Every band's pixel extent and cell numbers must fit in `u32`.
    fn check_extent(&self) -> Result<(), GridError> {
        let limit = u64::from(u32::MAX);
        let mut first_row = 0u64;
        let mut next_y = u64::from(self.margin);
        for (i, band) in self.bands.iter().enumerate() {
            let step = u64::from(band.cell_size) + u64::from(self.gap);
            let y_start = band.y_offset.map_or(next_y, u64::from);
            let bottom = y_start + u64::from(band.rows) * step;
            let right = u64::from(band.margin) + u64::from(band.cols) * step;
            let last_row = first_row + u64::from(band.rows) - 1;
            let last_index = last_row * u64::from(band.stride()) + u64::from(band.cols);
            if bottom > limit || right > limit || last_index > limit {
                return Err(GridError::Layout(format!(
                    "band {i} overflows u32 pixel coordinates or cell numbers"
                )));
            }
            first_row = last_row + 1;
            next_y = bottom;
        }
        Ok(())
    }

    /// Check that the layout is usable and that cell numbers are unique.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.bands.is_empty() {
            return Err(GridError::Layout("at least one row band is required".into()));
        }
        for (i, band) in self.bands.iter().enumerate() {
            if band.rows == 0 || band.cols == 0 {
                return Err(GridError::Layout(format!(
                    "band {i} must have at least one row and one column"
                )));
            }
            if band.cell_size == 0 {
                return Err(GridError::Layout(format!(
                    "band {i} cell_size must be non-zero"
                )));
            }
            if band.stride() < band.cols {
                return Err(GridError::Layout(format!(
                    "band {i} index_stride ({}) is smaller than its column count ({})",
                    band.stride(),
                    band.cols
                )));
            }
        }

        self.check_extent()?;

        let mut seen = BTreeSet::new();
        for pos in self.positions() {
            let index = self.cell_index(pos.row, pos.col)?;
            if !seen.insert(index) {
                return Err(GridError::Layout(format!(
                    "cell number {index} is produced by more than one position \
                     (row {}, col {}); set index_stride on the later band",
                    pos.row, pos.col
                )));
            }
        }
        Ok(())
    }
}
