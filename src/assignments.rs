//! The caller-owned table of per-cell decisions.
//!
//! The table is a plain value: the caller builds or loads it, mutates it as the
//! user changes their mind, and hands a reference to
//! [`build_archive`](crate::export::build_archive). Iteration is ordered by
//! [`CellIndex`], which fixes the archive's entry order.
//!
//! ## File format
//!
//! ```toml
//! # Every detected cell of row 2 (zero-based) becomes an emote.
//! [[row]]
//! row = 2
//! category = "Emote"
//!
//! # Explicit cells win over row entries.
//! [[cell]]
//! index = 1
//! category = "Badge"       # Emote | Badge | Badge Bit | Flair | None
//! name = "Wave"            # optional, defaults to the index
//! mirrored = false         # optional
//! ```

use crate::detect::Detection;
use crate::grid::{GridError, GridSpec};
use crate::naming::is_valid_folder_name;
use crate::types::{Category, CellAssignment, CellIndex};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("cell {0} is assigned more than once")]
    DuplicateCell(CellIndex),
    #[error("cell {index}: name {name:?} must not contain '/', '\\' or be '.' or '..'")]
    InvalidName { index: CellIndex, name: String },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Per-cell assignments, unique by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentTable {
    cells: BTreeMap<CellIndex, CellAssignment>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous assignment.
    pub fn set(&mut self, index: CellIndex, assignment: CellAssignment) -> Option<CellAssignment> {
        self.cells.insert(index, assignment)
    }

    /// Change only the category, keeping name and mirror flag.
    pub fn set_category(&mut self, index: CellIndex, category: Category) {
        self.cells.entry(index).or_default().category = category;
    }

    pub fn get(&self, index: CellIndex) -> Option<&CellAssignment> {
        self.cells.get(&index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, &CellAssignment)> {
        self.cells.iter().map(|(index, a)| (*index, a))
    }

    /// Assignments that produce archive entries (category other than None).
    pub fn exportable(&self) -> impl Iterator<Item = (CellIndex, &CellAssignment)> {
        self.iter().filter(|(_, a)| a.category.is_exported())
    }

    /// Set the category of every detected cell in `row`. `Category::None`
    /// clears the row. Returns the number of cells touched.
    pub fn assign_row(&mut self, detection: &Detection, row: u32, category: Category) -> usize {
        let cells = detection.cells_in_row(row);
        for &index in &cells {
            self.set_category(index, category);
        }
        cells.len()
    }

    /// Exportable cells that detection found empty.
    pub fn undetected(&self, detection: &Detection) -> Vec<CellIndex> {
        self.exportable()
            .map(|(index, _)| index)
            .filter(|index| !detection.contains(*index))
            .collect()
    }
}

impl FromIterator<(CellIndex, CellAssignment)> for AssignmentTable {
    fn from_iter<T: IntoIterator<Item = (CellIndex, CellAssignment)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellEntry {
    index: CellIndex,
    category: Category,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mirrored: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RowEntry {
    row: u32,
    category: Category,
}

/// Raw contents of an assignment file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignmentFile {
    cell: Vec<CellEntry>,
    row: Vec<RowEntry>,
}

impl AssignmentFile {
    pub fn parse(content: &str) -> Result<Self, AssignmentError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve row entries against `detection`, then apply cell entries on
    /// top. Every index and row must exist in `grid`, and names must be
    /// usable as an archive folder.
    pub fn resolve(
        self,
        grid: &GridSpec,
        detection: &Detection,
    ) -> Result<AssignmentTable, AssignmentError> {
        let mut table = AssignmentTable::new();

        for entry in &self.row {
            if entry.row >= grid.row_count() {
                return Err(GridError::InvalidCell {
                    row: entry.row,
                    col: 0,
                }
                .into());
            }
            table.assign_row(detection, entry.row, entry.category);
        }

        let mut explicit = BTreeSet::new();
        for entry in self.cell {
            grid.position(entry.index)?;
            if !explicit.insert(entry.index) {
                return Err(AssignmentError::DuplicateCell(entry.index));
            }
            if let Some(name) = entry
                .name
                .as_deref()
                .filter(|n| !n.is_empty() && !is_valid_folder_name(n))
            {
                return Err(AssignmentError::InvalidName {
                    index: entry.index,
                    name: name.to_string(),
                });
            }
            table.set(
                entry.index,
                CellAssignment {
                    category: entry.category,
                    name: entry.name,
                    mirrored: entry.mirrored,
                },
            );
        }

        Ok(table)
    }
}

/// Load and resolve an assignment file.
pub fn load_assignments(
    path: &Path,
    grid: &GridSpec,
    detection: &Detection,
) -> Result<AssignmentTable, AssignmentError> {
    let content = fs::read_to_string(path)?;
    AssignmentFile::parse(&content)?.resolve(grid, detection)
}
