//! Detection memoization by image identity.
//!
//! Detection is pure but walks every pixel of every cell, so callers that keep
//! a session open (re-export after changing an assignment, switching tabs)
//! should not repeat it for the same upload.
//!
//! # Design
//!
//! The cache is **content-addressed**: lookups are by the combination of
//! `source_hash` and `params_hash`, not by file name. Re-uploading the same
//! bytes under another name is a hit; a different image under the same name
//! is a miss.
//!
//! - **`source_hash`**: SHA-256 of the uploaded bytes, computed once when the
//!   source is loaded ([`SourceImage::id`](crate::export::SourceImage::id)).
//!
//! - **`params_hash`**: SHA-256 of the grid layout and threshold. Changing
//!   either yields a different key, so stale results are never returned.
//!
//! Entries live in memory for the lifetime of the cache value.

use crate::detect::{Detection, detect};
use crate::export::SourceImage;
use crate::grid::{GridError, GridSpec};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// SHA-256 of `bytes` as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of the detection parameters.
///
/// Inputs: every grid field and the threshold bits.
pub fn hash_detection_params(grid: &GridSpec, threshold: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"detection\0");
    hasher.update(grid.margin.to_le_bytes());
    hasher.update(grid.gap.to_le_bytes());
    for band in &grid.bands {
        hasher.update(b"band\0");
        hasher.update(band.rows.to_le_bytes());
        hasher.update(band.cols.to_le_bytes());
        hasher.update(band.cell_size.to_le_bytes());
        hasher.update(band.margin.to_le_bytes());
        hasher.update(band.stride().to_le_bytes());
        match band.y_offset {
            Some(y) => {
                hasher.update(b"\x01");
                hasher.update(y.to_le_bytes());
            }
            None => hasher.update(b"\x00"),
        }
    }
    hasher.update(threshold.to_bits().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Memoized detection results.
#[derive(Debug, Default)]
pub struct DetectionCache {
    entries: HashMap<String, Detection>,
    stats: CacheStats,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached detection for `source` under `grid` and `threshold`, running
    /// [`detect`] on a miss.
    pub fn get_or_detect(
        &mut self,
        source: &SourceImage,
        grid: &GridSpec,
        threshold: f64,
    ) -> Result<&Detection, GridError> {
        let key = format!(
            "{}:{}",
            source.id(),
            hash_detection_params(grid, threshold)
        );
        if self.entries.contains_key(&key) {
            debug!(source = source.id(), "detection cache hit");
            self.stats.hit();
        } else {
            debug!(source = source.id(), "detection cache miss");
            let detection = detect(source.image(), grid, threshold)?;
            self.stats.miss();
            self.entries.insert(key.clone(), detection);
        }
        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Stats are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Summary of cache performance.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} detected ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} detected", self.misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RowBand;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{png_bytes, sheet_with_content};
    use crate::types::CellIndex;

    fn source(grid: &GridSpec, content: &[(u32, u32)]) -> SourceImage {
        let bytes = png_bytes(&sheet_with_content(grid, content));
        SourceImage::load(&bytes, Some("sheet.png"), &RustBackend::new()).unwrap()
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    #[test]
    fn hash_bytes_is_hex_sha256() {
        let h = hash_bytes(b"");
        assert_eq!(
            h,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
    }

    #[test]
    fn params_hash_deterministic() {
        let grid = GridSpec::default();
        assert_eq!(
            hash_detection_params(&grid, 0.99),
            hash_detection_params(&grid, 0.99)
        );
    }

    #[test]
    fn params_hash_varies_with_threshold() {
        let grid = GridSpec::default();
        assert_ne!(
            hash_detection_params(&grid, 0.99),
            hash_detection_params(&grid, 0.5)
        );
    }

    #[test]
    fn params_hash_varies_with_layout() {
        let uniform = GridSpec::default();
        let mut mixed = GridSpec::default();
        mixed.bands.push(RowBand {
            index_stride: Some(10),
            ..RowBand::uniform(2, 10, 300, 150)
        });
        assert_ne!(
            hash_detection_params(&uniform, 0.99),
            hash_detection_params(&mixed, 0.99)
        );

        let mut offset = GridSpec::default();
        offset.bands[0].y_offset = Some(150);
        assert_ne!(
            hash_detection_params(&uniform, 0.99),
            hash_detection_params(&offset, 0.99)
        );
    }

    // =========================================================================
    // DetectionCache
    // =========================================================================

    #[test]
    fn second_lookup_is_a_hit() {
        let grid = GridSpec::uniform(2, 2, 20, 5, 5);
        let src = source(&grid, &[(0, 0)]);
        let mut cache = DetectionCache::new();

        let first = cache.get_or_detect(&src, &grid, 0.99).unwrap().clone();
        let second = cache.get_or_detect(&src, &grid, 0.99).unwrap().clone();

        assert_eq!(first, second);
        assert!(first.contains(CellIndex(1)));
        assert_eq!(cache.stats(), &CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_image_is_a_miss() {
        let grid = GridSpec::uniform(2, 2, 20, 5, 5);
        let mut cache = DetectionCache::new();

        let a = cache
            .get_or_detect(&source(&grid, &[(0, 0)]), &grid, 0.99)
            .unwrap()
            .clone();
        let b = cache
            .get_or_detect(&source(&grid, &[(1, 1)]), &grid, 0.99)
            .unwrap()
            .clone();

        assert_ne!(a, b);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn same_bytes_under_another_name_hit() {
        let grid = GridSpec::uniform(1, 2, 20, 5, 5);
        let bytes = png_bytes(&sheet_with_content(&grid, &[(0, 1)]));
        let backend = RustBackend::new();
        let a = SourceImage::load(&bytes, Some("a.png"), &backend).unwrap();
        let b = SourceImage::load(&bytes, Some("b.png"), &backend).unwrap();

        let mut cache = DetectionCache::new();
        cache.get_or_detect(&a, &grid, 0.99).unwrap();
        cache.get_or_detect(&b, &grid, 0.99).unwrap();
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn changed_threshold_is_a_miss() {
        let grid = GridSpec::uniform(1, 1, 20, 5, 5);
        let src = source(&grid, &[]);
        let mut cache = DetectionCache::new();

        assert!(cache.get_or_detect(&src, &grid, 0.99).unwrap().is_empty());
        // Strict comparison: at 1.0 even a fully transparent cell is content.
        assert!(!cache.get_or_detect(&src, &grid, 1.0).unwrap().is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn clear_forces_redetection() {
        let grid = GridSpec::uniform(1, 1, 20, 5, 5);
        let src = source(&grid, &[(0, 0)]);
        let mut cache = DetectionCache::new();
        cache.get_or_detect(&src, &grid, 0.99).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_detect(&src, &grid, 0.99).unwrap();
        assert_eq!(cache.stats().misses, 2);
    }

    // =========================================================================
    // CacheStats display
    // =========================================================================

    #[test]
    fn cache_stats_display_all_detected() {
        let stats = CacheStats { hits: 0, misses: 3 };
        assert_eq!(format!("{}", stats), "3 detected");
    }

    #[test]
    fn cache_stats_display_with_hits() {
        let stats = CacheStats { hits: 4, misses: 1 };
        assert_eq!(format!("{}", stats), "4 cached, 1 detected (5 total)");
    }
}
