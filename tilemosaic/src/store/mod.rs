//! Backing stores for layer pyramids.
//!
//! The mosaic pipeline reads pyramids through two narrow, synchronous
//! interfaces: [`AttributeStore`] for per-zoom metadata and histograms, and
//! [`TileStore`] for raster data. Implementations may block; callers run them
//! on the [`BlockingPool`](crate::executor::BlockingPool).
//!
//! # Implementations
//!
//! - [`MemoryLayerStore`]: in-memory pyramids, used for tests and embedding
//! - [`FsLayerStore`]: read-only directory layout on local disk

mod error;
mod fs;
mod memory;
mod metadata;
mod stitch;

pub use error::StoreError;
pub use fs::{FsLayerStore, LayerAttributes, ZoomAttributes};
pub use memory::MemoryLayerStore;
pub use metadata::{LayerMetadata, PixelWindow};
pub use stitch::MAX_EXTENT_PIXELS;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::{Extent, SpatialKey};
use crate::raster::{Histogram, Tile};

/// Stable identifier of a layer (one ingested scene).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Read access to pyramid metadata.
pub trait AttributeStore: Send + Sync {
    /// Highest indexed zoom of a layer, or `None` if the layer has no zooms.
    fn max_zoom(&self, layer: &LayerId) -> Result<Option<u8>, StoreError>;

    /// Metadata of one indexed zoom level.
    fn metadata(&self, layer: &LayerId, zoom: u8) -> Result<LayerMetadata, StoreError>;

    /// One histogram per band for one zoom level.
    fn histogram(&self, layer: &LayerId, zoom: u8) -> Result<Vec<Histogram>, StoreError>;
}

/// Read access to pyramid raster data.
pub trait TileStore: Send + Sync {
    /// Read the tile stored at `key`. Sparse pyramids return `Ok(None)` for
    /// keys inside the layer bounds that hold no tile.
    fn read_tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<Option<Tile>, StoreError>;

    /// Read the raster covering `extent` (in the layer CRS) at native
    /// resolution. Cells without data are NoData.
    fn read_tile_for_extent(&self, layer: &LayerId, zoom: u8, extent: &Extent) -> Result<Tile, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id_display_and_serde() {
        let id = LayerId::new("scene-42");
        assert_eq!(id.to_string(), "scene-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"scene-42\"");

        let parsed: LayerId = serde_json::from_str("\"scene-42\"").unwrap();
        assert_eq!(parsed, id);
    }
}
