//! Coordinate types for tiled raster pyramids.
//!
//! Provides the grid addressing used by layer pyramids (`SpatialKey`,
//! `KeyBounds`), geographic rectangles (`Extent`), and Web Mercator helpers
//! for converting XYZ tile addresses into map extents.

pub mod projection;

pub use projection::{
    is_geographic_crs, project_point, reproject_extent, ProjectionError, LAT_LNG, WEB_MERCATOR,
};

use serde::{Deserialize, Serialize};

/// Half the earth's circumference in Web Mercator meters.
pub const HALF_EARTH: f64 = 20_037_508.342_789_244;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.051_128_78;

/// Grid address of one tile within a zoom level's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpatialKey {
    pub col: u32,
    pub row: u32,
}

impl SpatialKey {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Inclusive range of valid spatial keys for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBounds {
    pub min: SpatialKey,
    pub max: SpatialKey,
}

impl KeyBounds {
    pub fn new(min: SpatialKey, max: SpatialKey) -> Self {
        Self { min, max }
    }

    /// Returns true if `key` lies inside the bounds (inclusive on both ends).
    #[inline]
    pub fn contains(&self, key: SpatialKey) -> bool {
        key.col >= self.min.col
            && key.col <= self.max.col
            && key.row >= self.min.row
            && key.row <= self.max.row
    }
}

/// Axis-aligned rectangle in some coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Check if this extent overlaps another (touching edges do not count).
    pub fn intersects(&self, other: &Extent) -> bool {
        self.xmin < other.xmax
            && other.xmin < self.xmax
            && self.ymin < other.ymax
            && other.ymin < self.ymax
    }

    /// Returns the overlapping region of two extents, if any.
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        if !self.intersects(other) {
            return None;
        }
        Some(Extent::new(
            self.xmin.max(other.xmin),
            self.ymin.max(other.ymin),
            self.xmax.min(other.xmax),
            self.ymax.min(other.ymax),
        ))
    }

    /// Extent of an XYZ tile in Web Mercator (EPSG:3857) meters.
    ///
    /// Row 0 is the northernmost row, matching slippy-map conventions.
    pub fn from_xyz(zoom: u8, col: u32, row: u32) -> Self {
        let n = 2_f64.powi(zoom as i32);
        let tile_size = 2.0 * HALF_EARTH / n;

        let xmin = -HALF_EARTH + col as f64 * tile_size;
        let ymax = HALF_EARTH - row as f64 * tile_size;

        Extent::new(xmin, ymax - tile_size, xmin + tile_size, ymax)
    }

    /// Stable text form used in cache keys.
    pub(crate) fn cache_fragment(&self) -> String {
        format!("{}:{}:{}:{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// An extent tagged with the EPSG code of its coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsExtent {
    pub extent: Extent,
    pub crs: i32,
}

impl CrsExtent {
    pub fn new(extent: Extent, crs: i32) -> Self {
        Self { extent, crs }
    }

    /// Reproject into another CRS, returning the bounding box of the result.
    pub fn reproject(&self, target_crs: i32) -> Result<CrsExtent, ProjectionError> {
        let extent = reproject_extent(&self.extent, self.crs, target_crs)?;
        Ok(CrsExtent::new(extent, target_crs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bounds_contains() {
        let bounds = KeyBounds::new(SpatialKey::new(2, 3), SpatialKey::new(5, 7));

        assert!(bounds.contains(SpatialKey::new(2, 3)));
        assert!(bounds.contains(SpatialKey::new(5, 7)));
        assert!(bounds.contains(SpatialKey::new(4, 4)));
        assert!(!bounds.contains(SpatialKey::new(1, 4)));
        assert!(!bounds.contains(SpatialKey::new(6, 4)));
        assert!(!bounds.contains(SpatialKey::new(3, 8)));
    }

    #[test]
    fn test_extent_intersection() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, Extent::new(5.0, 5.0, 10.0, 10.0));

        let far = Extent::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersection(&far).is_none());
    }

    #[test]
    fn test_touching_extents_do_not_intersect() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_from_xyz_world_tile() {
        let world = Extent::from_xyz(0, 0, 0);
        assert!((world.xmin + HALF_EARTH).abs() < 1e-6);
        assert!((world.xmax - HALF_EARTH).abs() < 1e-6);
        assert!((world.ymin + HALF_EARTH).abs() < 1e-6);
        assert!((world.ymax - HALF_EARTH).abs() < 1e-6);
    }

    #[test]
    fn test_from_xyz_quadrants() {
        // Zoom 1, tile (1, 1) is the south-east quadrant
        let se = Extent::from_xyz(1, 1, 1);
        assert!(se.xmin.abs() < 1e-6);
        assert!(se.ymax.abs() < 1e-6);
        assert!((se.xmax - HALF_EARTH).abs() < 1e-6);
        assert!((se.ymin + HALF_EARTH).abs() < 1e-6);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_xyz_children_tile_parent(
                zoom in 0u8..=18,
                col_seed in 0u32..u32::MAX,
                row_seed in 0u32..u32::MAX,
            ) {
                let n = 1u32 << zoom;
                let (col, row) = (col_seed % n, row_seed % n);
                let parent = Extent::from_xyz(zoom, col, row);
                let child = Extent::from_xyz(zoom + 1, col * 2 + 1, row * 2 + 1);

                let tolerance = 1e-6 * HALF_EARTH;
                prop_assert!((child.xmax - parent.xmax).abs() < tolerance);
                prop_assert!((child.ymin - parent.ymin).abs() < tolerance);
                prop_assert!((child.width() * 2.0 - parent.width()).abs() < tolerance);
            }
        }
    }
}
