//! Shared value types used across detection, assignment and export.
//!
//! These are the vocabulary of the pipeline: a cell is addressed either by its
//! grid position ([`CellPosition`]) or by its 1-based linear [`CellIndex`], and
//! a user decision about a cell is a [`CellAssignment`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 1-based linear cell identifier.
///
/// Only meaningful together with the [`GridSpec`](crate::grid::GridSpec) that
/// produced it: numbering follows each row band's stride, not a global column
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellIndex(pub u32);

impl CellIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based `(row, col)` grid position. `row` is global across row bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: u32,
    pub col: u32,
}

impl CellPosition {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category '{0}' (expected Emote, Badge, Badge Bit, Flair or None)")]
pub struct CategoryParseError(pub String);

/// What a cell is exported as.
///
/// `None` marks a detected cell the user chose not to export; it is filtered
/// out before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Emote,
    Badge,
    #[serde(rename = "Badge Bit", alias = "BadgeBit")]
    BadgeBit,
    Flair,
    #[default]
    None,
}

impl Category {
    /// All categories in the order the selector offers them.
    pub const ALL: [Category; 5] = [
        Category::None,
        Category::Emote,
        Category::Badge,
        Category::BadgeBit,
        Category::Flair,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Emote => "Emote",
            Category::Badge => "Badge",
            Category::BadgeBit => "Badge Bit",
            Category::Flair => "Flair",
            Category::None => "None",
        }
    }

    /// Whether cells of this category end up in the archive.
    pub fn is_exported(self) -> bool {
        self != Category::None
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Emote" => Ok(Category::Emote),
            "Badge" => Ok(Category::Badge),
            "Badge Bit" | "BadgeBit" => Ok(Category::BadgeBit),
            "Flair" => Ok(Category::Flair),
            "None" => Ok(Category::None),
            other => Err(CategoryParseError(other.to_string())),
        }
    }
}

/// A user decision about one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAssignment {
    pub category: Category,
    /// Folder and file name. Absent or empty falls back to the cell index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub mirrored: bool,
}

impl CellAssignment {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            name: None,
            mirrored: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    /// Resolved folder name for the cell at `index`.
    pub fn folder_name(&self, index: CellIndex) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => index.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_display_names() {
        assert_eq!("Emote".parse::<Category>().unwrap(), Category::Emote);
        assert_eq!("Badge Bit".parse::<Category>().unwrap(), Category::BadgeBit);
        assert_eq!("BadgeBit".parse::<Category>().unwrap(), Category::BadgeBit);
        assert_eq!(" Flair ".parse::<Category>().unwrap(), Category::Flair);
        assert_eq!("None".parse::<Category>().unwrap(), Category::None);
    }

    #[test]
    fn category_rejects_unknown() {
        let err = "Sticker".parse::<Category>().unwrap_err();
        assert_eq!(err, CategoryParseError("Sticker".to_string()));
    }

    #[test]
    fn category_display_round_trips() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn only_none_is_not_exported() {
        assert!(!Category::None.is_exported());
        assert!(Category::Emote.is_exported());
        assert!(Category::BadgeBit.is_exported());
    }

    #[test]
    fn folder_name_falls_back_to_index() {
        let index = CellIndex(12);
        assert_eq!(CellAssignment::new(Category::Emote).folder_name(index), "12");
        assert_eq!(
            CellAssignment::new(Category::Emote)
                .named("")
                .folder_name(index),
            "12"
        );
        assert_eq!(
            CellAssignment::new(Category::Emote)
                .named("Wave")
                .folder_name(index),
            "Wave"
        );
    }

    #[test]
    fn assignment_deserializes_with_defaults() {
        let a: CellAssignment = toml::from_str(r#"category = "Badge Bit""#).unwrap();
        assert_eq!(a.category, Category::BadgeBit);
        assert_eq!(a.name, None);
        assert!(!a.mirrored);
    }
}
