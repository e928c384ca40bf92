//! Centralized naming for archive entries and the archive itself.
//!
//! Every exported file follows one pattern:
//!
//! ```text
//! {name}/{name}{orientation}{variant}.png
//!
//! Wave/Wave_Original.png        single orientation
//! Wave/Wave_DiscordSize.png
//! Wave/Wave_72x72.png
//! Hop/HopA_Original.png         mirrored pair: A_ = as drawn
//! Hop/HopB_Original.png                        B_ = flipped
//! Hop/HopA_DiscordSize.png
//! Hop/HopB_DiscordSize.png
//! ```
//!
//! The largest size of a ladder is labelled `DiscordSize` rather than by its
//! dimensions.

use std::path::Path;

/// Archive stem used when neither a custom name nor a usable upload name exists.
pub const FALLBACK_ARCHIVE_STEM: &str = "emotes_and_badges";

/// Which copy of a cell a variant was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The only copy of a non-mirrored cell.
    Single,
    /// The as-drawn copy of a mirrored cell.
    Front,
    /// The flipped copy of a mirrored cell.
    Flipped,
}

impl Orientation {
    pub fn suffix(self) -> &'static str {
        match self {
            Orientation::Single => "_",
            Orientation::Front => "A_",
            Orientation::Flipped => "B_",
        }
    }

    /// Orientations emitted for a cell, in output order.
    pub fn for_cell(mirrored: bool) -> &'static [Orientation] {
        if mirrored {
            &[Orientation::Front, Orientation::Flipped]
        } else {
            &[Orientation::Single]
        }
    }
}

/// What a variant is, independent of orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Full-resolution crop.
    Original,
    /// Largest ladder entry.
    DiscordSize,
    /// Any other ladder entry.
    Sized { width: u32, height: u32 },
}

/// Label appended to the cell name, e.g. `A_DiscordSize` or `_56x56`.
pub fn variant_label(orientation: Orientation, kind: VariantKind) -> String {
    let suffix = orientation.suffix();
    match kind {
        VariantKind::Original => format!("{suffix}Original"),
        VariantKind::DiscordSize => format!("{suffix}DiscordSize"),
        VariantKind::Sized { width, height } => format!("{suffix}{width}x{height}"),
    }
}

/// Path of an entry inside the archive: `{name}/{name}{label}.png`.
pub fn entry_path(name: &str, label: &str) -> String {
    format!("{name}/{name}{label}.png")
}

/// Whether `name` can be used as a single folder inside the archive.
///
/// Rejects separators and the `.`/`..` components, which would place entries
/// outside their own folder.
pub fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Archive stem derived from the uploaded file name.
///
/// Drops directories and the extension, removes the literal `Grid`, trims
/// whitespace. May return an empty string.
///
/// - `"Cats Grid.png"` → `"Cats"`
/// - `"uploads/SpringGrid.jpeg"` → `"Spring"`
/// - `"Grid.png"` → `""`
pub fn default_archive_stem(upload_name: &str) -> String {
    let file_name = upload_name.rsplit(['/', '\\']).next().unwrap_or(upload_name);
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace("Grid", "").trim().to_string()
}

/// Final archive file name, including `.zip`.
///
/// A non-empty custom name wins, then the upload-derived stem, then
/// [`FALLBACK_ARCHIVE_STEM`].
pub fn archive_file_name(custom: Option<&str>, upload_name: Option<&str>) -> String {
    if let Some(custom) = custom.map(str::trim).filter(|c| !c.is_empty()) {
        return format!("{custom}.zip");
    }
    let stem = upload_name.map(default_archive_stem).unwrap_or_default();
    if stem.is_empty() {
        format!("{FALLBACK_ARCHIVE_STEM}.zip")
    } else {
        format!("{stem}.zip")
    }
}
