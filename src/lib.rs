//! # Emote Slicer
//!
//! Slices a sprite sheet of emotes and badges into a zip of platform-ready
//! PNGs. The sheet is a grid of square cells; each cell the artist marks as an
//! Emote, Badge, Badge Bit or Flair is exported at its full resolution plus a
//! ladder of smaller sizes, optionally with a horizontally flipped twin.
//!
//! # Architecture: Two Passes
//!
//! ```text
//! 1. Detect    sheet + grid           →  Detection       (which cells hold content)
//! 2. Export    sheet + grid + table   →  archive bytes   (every assigned cell, every size)
//! ```
//!
//! Detection runs once per upload and is memoized by content hash. Between the
//! passes the caller owns an [`AssignmentTable`](assignments::AssignmentTable)
//! that records, per cell, a category, an optional name and a mirror flag.
//! Export is idempotent: the same inputs give a byte-identical archive.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`grid`] | Row-band layout, cell rectangles, the `row * stride + col + 1` numbering and its inverse |
//! | [`detect`] | Alpha-ratio emptiness classifier and the per-sheet detection pass |
//! | [`imaging`] | Cell extraction, mirroring, variant planning and rendering behind an [`ImageBackend`](imaging::ImageBackend) |
//! | [`assignments`] | Caller-owned assignment table and its TOML file format |
//! | [`export`] | Per-cell render pipeline feeding the archive, parallel over cells |
//! | [`archive`] | Deterministic zip writer and reader |
//! | [`naming`] | Variant labels, entry paths, archive file names |
//! | [`cache`] | Content-addressed detection memoization |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`types`] | Shared value types (`CellIndex`, `Category`, `CellAssignment`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Row Bands Instead of One Uniform Grid
//!
//! Sheets grow: a template of 500 px cells later gains rows of smaller 300 px
//! cells with more columns. A [`GridSpec`](grid::GridSpec) is an ordered list of
//! bands, each with its own size, column count, left margin and numbering
//! stride. Layouts whose numbering would give two positions the same index are
//! rejected by [`GridSpec::validate`](grid::GridSpec::validate), so the index
//! stays a safe key for assignments.
//!
//! ## Transparency Decides Emptiness
//!
//! A cell is empty when more than 99% of its pixels are fully transparent.
//! Sheets without alpha carry no such signal, so none of their cells are ever
//! classified empty; the artist simply leaves unused cells unassigned.
//!
//! ## Deterministic Archives
//!
//! Entries are written in ascending index order with a fixed timestamp.
//! Rendering runs on rayon workers but results are merged in table order before
//! the single zip writer runs, so the worker count never changes the output.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing and PNG encoding use the `image` crate. One resampling
//! filter (Catmull-Rom by default) is used for every resize in a run. Cells are
//! only ever downscaled; a size ladder entry larger than the cell is an error.

pub mod archive;
pub mod assignments;
pub mod cache;
pub mod config;
pub mod detect;
pub mod export;
pub mod grid;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
