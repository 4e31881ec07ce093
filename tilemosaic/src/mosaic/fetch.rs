//! Single-tile fetch with zoom fallback.
//!
//! Requests above a layer's highest indexed zoom are served from the
//! ancestor tile at the effective zoom: the sub-window covering the
//! requested tile is cropped out and resampled (nearest neighbour) back to
//! the output size.
//!
//! ```text
//! requested z=5 (col 13, row 6), layer max z=3
//!   factor     = 2^(5-3) = 4
//!   source key = (13/4, 6/4) = (3, 1)
//!   sub-window = (13%4, 6%4) = (1, 2) of a 4x4 split, 64x64 px
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::cache::CachedLayerReader;
use crate::coord::SpatialKey;
use crate::raster::Tile;
use crate::store::LayerId;

use super::resolver::{MetadataResolver, ResolvedLayer};
use super::FetchResult;

/// Fetches one output tile for a layer.
#[derive(Clone)]
pub struct TileFetcher {
    reader: Arc<CachedLayerReader>,
    resolver: MetadataResolver,
    tile_size: u32,
}

impl TileFetcher {
    pub fn new(reader: Arc<CachedLayerReader>, tile_size: u32) -> Self {
        Self {
            resolver: MetadataResolver::new(Arc::clone(&reader)),
            reader,
            tile_size: tile_size.max(1),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Fetch the tile at (`zoom`, `col`, `row`), always `tile_size` square.
    pub async fn fetch(&self, layer: &LayerId, zoom: u8, col: u32, row: u32) -> FetchResult<Tile> {
        let Some(resolved) = self.resolver.resolve(layer, zoom).await? else {
            return Ok(None);
        };
        self.fetch_resolved(layer, &resolved, zoom, col, row).await
    }

    /// Fetch using an already resolved layer.
    pub(crate) async fn fetch_resolved(
        &self,
        layer: &LayerId,
        resolved: &ResolvedLayer,
        zoom: u8,
        col: u32,
        row: u32,
    ) -> FetchResult<Tile> {
        let Some(plan) = SourcePlan::new(zoom, resolved.zoom, col, row) else {
            debug!(layer = %layer, zoom, effective = resolved.zoom, "Zoom difference too large");
            return Ok(None);
        };

        if !resolved.metadata.bounds.contains(plan.key) {
            debug!(
                layer = %layer,
                col = plan.key.col,
                row = plan.key.row,
                zoom = resolved.zoom,
                "Source key outside layer bounds"
            );
            return Ok(None);
        }

        let Some(source) = self.reader.tile(layer, resolved.zoom, plan.key).await? else {
            return Ok(None);
        };

        let size = self.tile_size;
        if plan.factor == 1 {
            if source.dimensions() == (size, size) {
                return Ok(Some(source));
            }
            return Ok(Some(source.resample(size, size)));
        }

        let (x0, w) = plan.window(plan.sub.col, source.cols());
        let (y0, h) = plan.window(plan.sub.row, source.rows());
        Ok(Some(source.crop(x0, y0, w, h).resample(size, size)))
    }
}

/// Where to read a requested tile from at the effective zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourcePlan {
    factor: u64,
    key: SpatialKey,
    sub: SpatialKey,
}

impl SourcePlan {
    fn new(zoom: u8, effective: u8, col: u32, row: u32) -> Option<Self> {
        let diff = zoom.saturating_sub(effective) as u32;
        let factor = 1u64.checked_shl(diff)?;
        let split = |v: u32| ((v as u64 / factor) as u32, (v as u64 % factor) as u32);
        let (key_col, sub_col) = split(col);
        let (key_row, sub_row) = split(row);
        Some(Self {
            factor,
            key: SpatialKey::new(key_col, key_row),
            sub: SpatialKey::new(sub_col, sub_row),
        })
    }

    /// Pixel offset and length of sub-window `sub` along an axis of `len`
    /// pixels. Never shorter than one pixel.
    fn window(&self, sub: u32, len: u32) -> (u32, u32) {
        let start = (sub as u128 * len as u128 / self.factor as u128) as u32;
        let span = (len as u64 / self.factor).max(1) as u32;
        (start, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheProvider;
    use crate::coord::KeyBounds;
    use crate::executor::BlockingPool;
    use crate::raster::TILE_SIZE;
    use crate::store::{LayerMetadata, MemoryLayerStore};

    fn fetcher(store: MemoryLayerStore) -> (Arc<MemoryLayerStore>, TileFetcher) {
        let store = Arc::new(store);
        let reader = CachedLayerReader::new(
            store.clone(),
            store.clone(),
            Arc::new(MemoryCacheProvider::new(100_000_000, None)),
            Arc::new(BlockingPool::new(2, "fetch-test").unwrap()),
        );
        (store, TileFetcher::new(Arc::new(reader), TILE_SIZE))
    }

    /// Zoom-1 layer with one 256x256 tile at (1, 0) whose quadrants hold
    /// 1, 2, 3, 4 (row-major).
    fn quadrant_store() -> MemoryLayerStore {
        let mut data = vec![0.0f32; 256 * 256];
        for row in 0..256 {
            for col in 0..256 {
                let q = (row / 128) * 2 + (col / 128) + 1;
                data[row * 256 + col] = q as f32;
            }
        }
        let tile = Tile::new(256, 256, vec![data]).unwrap();
        let meta = LayerMetadata::web_mercator(
            1,
            KeyBounds::new(SpatialKey::new(1, 0), SpatialKey::new(1, 0)),
            1,
        );
        let mut store = MemoryLayerStore::new();
        store.insert_zoom_with_tiles("a", 1, meta, vec![(SpatialKey::new(1, 0), tile)]);
        store
    }

    #[test]
    fn test_source_plan() {
        let plan = SourcePlan::new(5, 3, 13, 6).unwrap();
        assert_eq!(plan.factor, 4);
        assert_eq!(plan.key, SpatialKey::new(3, 1));
        assert_eq!(plan.sub, SpatialKey::new(1, 2));
        assert_eq!(plan.window(1, 256), (64, 64));
    }

    #[test]
    fn test_window_never_collapses() {
        let plan = SourcePlan::new(20, 9, 2047, 0).unwrap();
        assert_eq!(plan.factor, 2048);
        let (start, span) = plan.window(plan.sub.col, 256);
        assert_eq!(span, 1);
        assert_eq!(start, 255);
    }

    #[tokio::test]
    async fn test_native_zoom_returns_tile() {
        let (_, fetcher) = fetcher(quadrant_store());
        let tile = fetcher.fetch(&LayerId::new("a"), 1, 1, 0).await.unwrap().unwrap();
        assert_eq!(tile.dimensions(), (256, 256));
        assert_eq!(tile.get(0, 0, 0), 1.0);
        assert_eq!(tile.get(0, 255, 255), 4.0);
    }

    #[tokio::test]
    async fn test_overzoom_crops_quadrant() {
        let (_, fetcher) = fetcher(quadrant_store());
        let layer = LayerId::new("a");

        // z=2 children of (1, 0) are cols 2..=3, rows 0..=1
        for (col, row, expected) in [(2, 0, 1.0), (3, 0, 2.0), (2, 1, 3.0), (3, 1, 4.0)] {
            let tile = fetcher.fetch(&layer, 2, col, row).await.unwrap().unwrap();
            assert_eq!(tile.dimensions(), (256, 256));
            assert_eq!(tile.get(0, 0, 0), expected);
            assert_eq!(tile.get(0, 255, 255), expected);
        }
    }

    #[tokio::test]
    async fn test_overzoom_outside_bounds_is_empty() {
        let (store, fetcher) = fetcher(quadrant_store());
        // (0, 0) at z=2 maps to source (0, 0), outside bounds
        assert!(fetcher.fetch(&LayerId::new("a"), 2, 0, 0).await.unwrap().is_none());
        assert_eq!(store.tile_reads(), 0);
    }

    #[tokio::test]
    async fn test_unknown_layer_is_empty() {
        let (_, fetcher) = fetcher(quadrant_store());
        assert!(fetcher.fetch(&LayerId::new("missing"), 3, 0, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_odd_sized_native_tile_is_normalized() {
        let meta = LayerMetadata::web_mercator(
            0,
            KeyBounds::new(SpatialKey::new(0, 0), SpatialKey::new(0, 0)),
            1,
        );
        let mut store = MemoryLayerStore::new();
        store.insert_zoom_with_tiles("a", 0, meta, vec![(SpatialKey::new(0, 0), Tile::filled(100, 100, 1, 2.0))]);
        let (_, fetcher) = fetcher(store);

        let tile = fetcher.fetch(&LayerId::new("a"), 0, 0, 0).await.unwrap().unwrap();
        assert_eq!(tile.dimensions(), (256, 256));
        assert_eq!(tile.get(0, 128, 128), 2.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn test_overzoom_always_full_size(extra in 1u8..12, seed in any::<u64>()) {
                let zoom = 1 + extra;
                let n = 1u64 << extra;
                // child of source (1, 0)
                let col = (n + seed % n) as u32;
                let row = ((seed >> 32) % n) as u32;

                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let (_, fetcher) = fetcher(quadrant_store());
                let tile = runtime
                    .block_on(fetcher.fetch(&LayerId::new("a"), zoom, col, row))
                    .unwrap()
                    .unwrap();
                prop_assert_eq!(tile.dimensions(), (TILE_SIZE, TILE_SIZE));
            }
        }
    }
}
