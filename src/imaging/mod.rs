//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode upload** | `image::load_from_memory` (PNG, JPEG) |
//! | **Extract cell** | `DynamicImage::crop_imm`, zero-padded past the edge |
//! | **Mirror** | `DynamicImage::fliph` |
//! | **Resize** | `resize_exact` with one fixed filter per run |
//! | **Encode** | `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for region and ladder math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Extraction, mirroring, variant planning and rendering

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    VisibleRegion, covers_cell, is_downscale, ladder_top, transparent_fraction, visible_region,
};
pub use operations::{
    Cell, RenderConfig, RenderError, RenderedVariant, VariantPlan, extract, mirror, plan_variants,
    render_variants,
};
pub use params::{PngCompression, ResizeParams, Resampling};
pub use rust_backend::RustBackend;
