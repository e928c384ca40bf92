//! Export pipeline: assignments → rendered variants → zip archive.
//!
//! For every assigned cell (category other than `None`), in ascending index
//! order:
//!
//! ```text
//! rect_for_index → extract → render_variants → {name}/{name}{label}.png
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! Cats.zip
//! ├── Wave/
//! │   ├── Wave_Original.png        # Full-resolution crop
//! │   ├── Wave_DiscordSize.png     # Largest ladder size
//! │   ├── Wave_72x72.png
//! │   ├── Wave_36x36.png
//! │   └── Wave_18x18.png
//! └── Hop/                         # Mirrored: A_ as drawn, B_ flipped
//!     ├── HopA_Original.png
//!     ├── HopB_Original.png
//!     ├── HopA_DiscordSize.png
//!     ├── HopB_DiscordSize.png
//!     └── ...
//! ```
//!
//! ## Parallel Processing
//!
//! Cells are rendered in parallel using [rayon](https://docs.rs/rayon). Each
//! worker produces the entries of one cell; results are merged in table order
//! before the single zip writer runs, so the archive is byte-identical across
//! runs and worker counts. Any failing cell aborts the export and no archive is
//! returned.

use crate::archive::{self, ArchiveEntry, ArchiveError};
use crate::assignments::AssignmentTable;
use crate::cache::hash_bytes;
use crate::grid::{GridError, GridSpec};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, RenderConfig, RenderError, extract, render_variants,
};
use crate::naming::{entry_path, is_valid_folder_name};
use crate::types::{Category, CellAssignment, CellIndex};
use image::DynamicImage;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("name {0:?} is not a single archive folder")]
    InvalidName(String),
    #[error("cell {index}: {source}")]
    Cell {
        index: CellIndex,
        #[source]
        source: Box<ExportError>,
    },
}

/// A decoded upload, immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    id: String,
    name: Option<String>,
}

impl SourceImage {
    /// Decode uploaded bytes. The content identity is the SHA-256 of `bytes`.
    ///
    /// Decode failures surface as [`BackendError::Decode`] before any detection
    /// runs.
    pub fn load(
        bytes: &[u8],
        name: Option<&str>,
        backend: &impl ImageBackend,
    ) -> Result<Self, ExportError> {
        let image = backend.decode(bytes)?;
        let id = hash_bytes(bytes);
        debug!(
            id = %id,
            width = image.width(),
            height = image.height(),
            "decoded source image"
        );
        Ok(Self {
            image,
            id,
            name: name.map(str::to_string),
        })
    }

    /// Wrap an already decoded image under an explicit identity.
    pub fn from_image(image: DynamicImage, id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            image,
            id: id.into(),
            name: name.map(str::to_string),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Uploaded file name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }
}

/// Progress event emitted once per exported cell, in table order.
#[derive(Debug, Clone)]
pub enum ExportEvent {
    CellRendered {
        index: CellIndex,
        name: String,
        category: Category,
        mirrored: bool,
        entries: Vec<String>,
    },
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Zip archive bytes.
    pub bytes: Vec<u8>,
    /// Entry paths in archive order, one per written entry.
    pub entries: Vec<String>,
    /// Number of cells exported.
    pub cells: usize,
}

/// Render one cell into its archive entries.
fn render_cell(
    source: &SourceImage,
    grid: &GridSpec,
    index: CellIndex,
    assignment: &CellAssignment,
    config: &RenderConfig,
    backend: &impl ImageBackend,
) -> Result<Vec<ArchiveEntry>, ExportError> {
    let name = assignment.folder_name(index);
    if !is_valid_folder_name(&name) {
        return Err(ExportError::InvalidName(name));
    }
    let rect = grid.rect_for_index(index)?;
    let cell = extract(source.image(), rect);
    let variants = render_variants(
        backend,
        &cell,
        assignment.category,
        assignment.mirrored,
        config,
    )?;
    debug!(%index, name = %name, variants = variants.len(), "rendered cell");
    Ok(variants
        .into_iter()
        .map(|v| ArchiveEntry::new(entry_path(&name, &v.label), v.bytes))
        .collect())
}

/// Merge per-cell entries in table order, collapsing repeated paths.
///
/// A later cell's bytes replace an earlier entry with the same path, which
/// keeps its first position. Returns the entries with the position of the
/// owning cell in `rendered`.
fn merge_cells(
    cells: &[(CellIndex, &CellAssignment)],
    rendered: Vec<Vec<ArchiveEntry>>,
) -> (Vec<ArchiveEntry>, Vec<usize>) {
    let mut entries: Vec<ArchiveEntry> = Vec::new();
    let mut owners: Vec<usize> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for (cell, cell_entries) in rendered.into_iter().enumerate() {
        for entry in cell_entries {
            match slots.get(&entry.path) {
                Some(&slot) => {
                    warn!(
                        path = %entry.path,
                        index = %cells[cell].0,
                        replaces = %cells[owners[slot]].0,
                        "duplicate entry path, keeping the later cell"
                    );
                    owners[slot] = cell;
                    entries[slot] = entry;
                }
                None => {
                    slots.insert(entry.path.clone(), entries.len());
                    owners.push(cell);
                    entries.push(entry);
                }
            }
        }
    }
    (entries, owners)
}

/// Build the archive for every exportable assignment in `table`.
///
/// Optionally sends an [`ExportEvent`] per cell through `events` so the
/// caller can print progress. Each event lists only the entries that cell
/// actually contributes to the archive.
pub fn build_archive(
    source: &SourceImage,
    grid: &GridSpec,
    table: &AssignmentTable,
    config: &RenderConfig,
    backend: &impl ImageBackend,
    events: Option<Sender<ExportEvent>>,
) -> Result<ExportResult, ExportError> {
    let cells: Vec<(CellIndex, &CellAssignment)> = table.exportable().collect();
    info!(cells = cells.len(), source = source.id(), "exporting");

    let rendered: Vec<Vec<ArchiveEntry>> = cells
        .par_iter()
        .map(|&(index, assignment)| {
            render_cell(source, grid, index, assignment, config, backend).map_err(|e| {
                ExportError::Cell {
                    index,
                    source: Box::new(e),
                }
            })
        })
        .collect::<Result<_, _>>()?;

    let (entries, owners) = merge_cells(&cells, rendered);

    if let Some(tx) = &events {
        let mut owned: Vec<Vec<String>> = vec![Vec::new(); cells.len()];
        for (entry, &owner) in entries.iter().zip(&owners) {
            owned[owner].push(entry.path.clone());
        }
        for (&(index, assignment), cell_entries) in cells.iter().zip(owned) {
            tx.send(ExportEvent::CellRendered {
                index,
                name: assignment.folder_name(index),
                category: assignment.category,
                mirrored: assignment.mirrored,
                entries: cell_entries,
            })
            .ok();
        }
    }

    let bytes = archive::write_archive(&entries)?;
    info!(entries = entries.len(), bytes = bytes.len(), "archive built");

    Ok(ExportResult {
        bytes,
        entries: entries.into_iter().map(|e| e.path).collect(),
        cells: cells.len(),
    })
}
