//! CLI output formatting for detection and export.
//!
//! # Cell Display Contract
//!
//! Every cell is shown by its 3-digit index first, then its name and category
//! when it has them. Paths inside the archive are secondary context on
//! indented lines.
//!
//! # Output Format
//!
//! ## Detect
//!
//! ```text
//! Row 0: 001 002 005
//! Row 2: 015
//! 4 content cells in 2 rows (35 scanned)
//! ```
//!
//! ## Export
//!
//! ```text
//! 001 Wave (Badge)
//!     Wave/Wave_Original.png
//!     Wave/Wave_DiscordSize.png
//!     ...
//! 009 Hop (Emote, mirrored)
//!     Hop/HopA_Original.png
//!     ...
//! Wrote Cats.zip: 2 cells, 15 entries
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::detect::Detection;
use crate::export::{ExportEvent, ExportResult};
use crate::grid::GridSpec;
use crate::types::CellIndex;
use std::path::Path;

/// Format a cell index as 3-digit zero-padded.
fn format_index(index: CellIndex) -> String {
    format!("{:0>3}", index.get())
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 cell`, `2 cells`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

// ============================================================================
// Detect
// ============================================================================

/// Format detection results grouped by row.
///
/// Rows without content are omitted, matching the row tabs a UI would show.
pub fn format_detection(detection: &Detection, grid: &GridSpec) -> Vec<String> {
    let mut lines = Vec::new();
    for &row in &detection.rows {
        let cells: Vec<String> = detection
            .cells_in_row(row)
            .into_iter()
            .map(format_index)
            .collect();
        lines.push(format!("Row {}: {}", row, cells.join(" ")));
    }
    lines.push(format!(
        "{} in {} ({} scanned)",
        count(detection.len(), "content cell", "content cells"),
        count(detection.rows.len(), "row", "rows"),
        grid.cell_count()
    ));
    lines
}

/// Print detection results to stdout.
pub fn print_detection(detection: &Detection, grid: &GridSpec) {
    for line in format_detection(detection, grid) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format a single export progress event as display lines.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::CellRendered {
            index,
            name,
            category,
            mirrored,
            entries,
        } => {
            let detail = if *mirrored {
                format!("{}, mirrored", category)
            } else {
                category.to_string()
            };
            let mut lines = vec![format!("{} {} ({})", format_index(*index), name, detail)];
            for entry in entries {
                lines.push(format!("{}{}", indent(1), entry));
            }
            lines
        }
    }
}

/// Print an export event to stdout.
pub fn print_export_event(event: &ExportEvent) {
    for line in format_export_event(event) {
        println!("{}", line);
    }
}

/// Format the closing line of an export.
pub fn format_export_summary(archive_path: &Path, result: &ExportResult) -> Vec<String> {
    let file_name = archive_path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());
    vec![format!(
        "Wrote {}: {}, {}",
        file_name,
        count(result.cells, "cell", "cells"),
        count(result.entries.len(), "entry", "entries")
    )]
}

/// Print the export summary to stdout.
pub fn print_export_summary(archive_path: &Path, result: &ExportResult) {
    for line in format_export_summary(archive_path, result) {
        println!("{}", line);
    }
}
