//! Per-zoom pyramid metadata and layout arithmetic.

use serde::{Deserialize, Serialize};

use crate::coord::{Extent, KeyBounds, SpatialKey, HALF_EARTH, WEB_MERCATOR};
use crate::raster::TILE_SIZE;

/// Spatial metadata for one zoom level of a layer pyramid.
///
/// The layout divides `layout_extent` into a `layout_cols` × `layout_rows`
/// grid of tiles, each `tile_cols` × `tile_rows` pixels. Row 0 is the
/// northernmost row. `bounds` is the range of keys that actually hold data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// EPSG code of the layer CRS.
    pub crs: i32,
    pub layout_extent: Extent,
    pub layout_cols: u32,
    pub layout_rows: u32,
    pub tile_cols: u32,
    pub tile_rows: u32,
    pub band_count: usize,
    pub bounds: KeyBounds,
}

/// A pixel-aligned window in the zoom level's global pixel grid.
///
/// Offsets may be negative or exceed the layout when the requested extent
/// reaches past the layout edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_min: i64,
    pub row_min: i64,
    pub cols: u64,
    pub rows: u64,
}

impl PixelWindow {
    /// True if neither side exceeds `limit` pixels.
    pub fn fits(&self, limit: u32) -> bool {
        self.cols <= limit as u64 && self.rows <= limit as u64
    }
}

impl LayerMetadata {
    /// Metadata for a standard Web Mercator XYZ layout at `zoom`.
    pub fn web_mercator(zoom: u8, bounds: KeyBounds, band_count: usize) -> Self {
        let n = 1u32 << zoom;
        Self {
            crs: WEB_MERCATOR,
            layout_extent: Extent::new(-HALF_EARTH, -HALF_EARTH, HALF_EARTH, HALF_EARTH),
            layout_cols: n,
            layout_rows: n,
            tile_cols: TILE_SIZE,
            tile_rows: TILE_SIZE,
            band_count,
            bounds,
        }
    }

    /// Width and height of one pixel in CRS units.
    pub fn cell_size(&self) -> (f64, f64) {
        let total_cols = self.layout_cols as f64 * self.tile_cols as f64;
        let total_rows = self.layout_rows as f64 * self.tile_rows as f64;
        (
            self.layout_extent.width() / total_cols,
            self.layout_extent.height() / total_rows,
        )
    }

    /// Geographic extent of a single tile.
    pub fn key_extent(&self, key: SpatialKey) -> Extent {
        let tile_w = self.layout_extent.width() / self.layout_cols as f64;
        let tile_h = self.layout_extent.height() / self.layout_rows as f64;
        let xmin = self.layout_extent.xmin + key.col as f64 * tile_w;
        let ymax = self.layout_extent.ymax - key.row as f64 * tile_h;
        Extent::new(xmin, ymax - tile_h, xmin + tile_w, ymax)
    }

    /// Pixel window covering `extent`, expanded outward to whole pixels.
    pub fn pixel_window(&self, extent: &Extent) -> PixelWindow {
        let (cell_w, cell_h) = self.cell_size();
        let layout = &self.layout_extent;

        let col_min = to_offset(snap((extent.xmin - layout.xmin) / cell_w).floor());
        let col_max = to_offset(snap((extent.xmax - layout.xmin) / cell_w).ceil());
        let row_min = to_offset(snap((layout.ymax - extent.ymax) / cell_h).floor());
        let row_max = to_offset(snap((layout.ymax - extent.ymin) / cell_h).ceil());

        PixelWindow {
            col_min,
            row_min,
            cols: (col_max - col_min).max(1) as u64,
            rows: (row_max - row_min).max(1) as u64,
        }
    }

    /// Keys overlapping a pixel window, restricted to `bounds`.
    pub fn keys_in_window(&self, window: &PixelWindow) -> Vec<SpatialKey> {
        let tile_cols = self.tile_cols as i64;
        let tile_rows = self.tile_rows as i64;

        let first_col = window.col_min.div_euclid(tile_cols).max(self.bounds.min.col as i64);
        let last_col = (window.col_min + window.cols as i64 - 1)
            .div_euclid(tile_cols)
            .min(self.bounds.max.col as i64);
        let first_row = window.row_min.div_euclid(tile_rows).max(self.bounds.min.row as i64);
        let last_row = (window.row_min + window.rows as i64 - 1)
            .div_euclid(tile_rows)
            .min(self.bounds.max.row as i64);

        let mut keys = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                keys.push(SpatialKey::new(col as u32, row as u32));
            }
        }
        keys
    }
}

/// Largest pixel offset a window edge may take. Extents reaching further
/// are clamped here, so window spans stay far from `i64` overflow and are
/// rejected by the size check instead.
const MAX_PIXEL_OFFSET: f64 = (1u64 << 52) as f64;

#[inline]
fn to_offset(v: f64) -> i64 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(-MAX_PIXEL_OFFSET, MAX_PIXEL_OFFSET) as i64
}

/// Absorb floating point noise so extents aligned to pixel edges map to
/// exact pixel offsets.
#[inline]
fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-6 {
        rounded
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_layout() -> LayerMetadata {
        // 4x4 tiles of 2x2 pixels over (0,0)-(8,8): one pixel per unit
        LayerMetadata {
            crs: 32633,
            layout_extent: Extent::new(0.0, 0.0, 8.0, 8.0),
            layout_cols: 4,
            layout_rows: 4,
            tile_cols: 2,
            tile_rows: 2,
            band_count: 1,
            bounds: KeyBounds::new(SpatialKey::new(0, 0), SpatialKey::new(3, 3)),
        }
    }

    #[test]
    fn test_cell_size() {
        assert_eq!(simple_layout().cell_size(), (1.0, 1.0));
    }

    #[test]
    fn test_key_extent_row_zero_is_north() {
        let meta = simple_layout();
        assert_eq!(meta.key_extent(SpatialKey::new(0, 0)), Extent::new(0.0, 6.0, 2.0, 8.0));
        assert_eq!(meta.key_extent(SpatialKey::new(3, 3)), Extent::new(6.0, 0.0, 8.0, 2.0));
    }

    #[test]
    fn test_pixel_window_aligned() {
        let meta = simple_layout();
        let window = meta.pixel_window(&Extent::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(
            window,
            PixelWindow {
                col_min: 2,
                row_min: 0,
                cols: 4,
                rows: 4
            }
        );
    }

    #[test]
    fn test_pixel_window_expands_partial_pixels() {
        let meta = simple_layout();
        let window = meta.pixel_window(&Extent::new(0.5, 0.5, 1.5, 1.5));
        assert_eq!(window.col_min, 0);
        assert_eq!(window.cols, 2);
        assert_eq!(window.row_min, 6);
        assert_eq!(window.rows, 2);
    }

    #[test]
    fn test_pixel_window_huge_extent_is_clamped() {
        let meta = LayerMetadata::web_mercator(
            1,
            KeyBounds::new(SpatialKey::new(0, 0), SpatialKey::new(1, 1)),
            1,
        );
        let window = meta.pixel_window(&Extent::new(-1e300, 0.0, 1e300, 1.0));

        assert_eq!(window.col_min, -(1i64 << 52));
        assert_eq!(window.cols, 1u64 << 53);
        assert!(!window.fits(4096));

        let keys = meta.keys_in_window(&window);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_window_fits() {
        let meta = simple_layout();
        let window = meta.pixel_window(&Extent::new(0.0, 0.0, 8.0, 8.0));
        assert!(window.fits(8));
        assert!(!window.fits(7));
    }

    #[test]
    fn test_keys_in_window_clamped_to_bounds() {
        let mut meta = simple_layout();
        meta.bounds = KeyBounds::new(SpatialKey::new(1, 0), SpatialKey::new(2, 3));

        let window = meta.pixel_window(&Extent::new(-4.0, 4.0, 12.0, 8.0));
        let keys = meta.keys_in_window(&window);

        assert_eq!(
            keys,
            vec![
                SpatialKey::new(1, 0),
                SpatialKey::new(2, 0),
                SpatialKey::new(1, 1),
                SpatialKey::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_web_mercator_layout_matches_xyz() {
        let bounds = KeyBounds::new(SpatialKey::new(0, 0), SpatialKey::new(3, 3));
        let meta = LayerMetadata::web_mercator(2, bounds, 1);

        let key = SpatialKey::new(1, 2);
        let extent = meta.key_extent(key);
        let xyz = Extent::from_xyz(2, 1, 2);
        assert!((extent.xmin - xyz.xmin).abs() < 1e-6);
        assert!((extent.ymax - xyz.ymax).abs() < 1e-6);

        let window = meta.pixel_window(&xyz);
        assert_eq!(window.cols, TILE_SIZE as u64);
        assert_eq!(window.rows, TILE_SIZE as u64);
        assert_eq!(meta.keys_in_window(&window), vec![key]);
    }
}
