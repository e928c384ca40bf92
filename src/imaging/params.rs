//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which variants to produce) and the [`backend`](super::backend)
//! (which does the pixel work). Keeping them backend-agnostic lets tests swap in
//! a mock without touching operation logic.
//!
//! ## Types
//!
//! - [`Resampling`]: Resize filter. One filter is used for every resize in a run
//!   so outputs are reproducible.
//! - [`PngCompression`]: Deflate effort for PNG encoding. Lossless either way.
//! - [`ResizeParams`]: Target dimensions plus filter.

use serde::{Deserialize, Serialize};

/// Resampling filter used when downscaling cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resampling {
    Nearest,
    /// Bilinear.
    Triangle,
    /// Bicubic.
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

/// PNG deflate effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Parameters for an exact resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub filter: Resampling,
}

impl ResizeParams {
    pub fn new(width: u32, height: u32, filter: Resampling) -> Self {
        Self {
            width,
            height,
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_bicubic() {
        assert_eq!(Resampling::default(), Resampling::CatmullRom);
    }

    #[test]
    fn filters_parse_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            filter: Resampling,
            compression: PngCompression,
        }
        let w: Wrapper = toml::from_str(
            r#"
filter = "lanczos3"
compression = "best"
"#,
        )
        .unwrap();
        assert_eq!(w.filter, Resampling::Lanczos3);
        assert_eq!(w.compression, PngCompression::Best);

        let w: Wrapper = toml::from_str(
            r#"
filter = "catmull-rom"
compression = "fast"
"#,
        )
        .unwrap();
        assert_eq!(w.filter, Resampling::CatmullRom);
        assert_eq!(w.compression, PngCompression::Fast);
    }
}
