//! Cache-aside reads of layer pyramids.
//!
//! Every lookup first consults the cache; on a miss the store is read on the
//! blocking pool and the result is written back. There is no invalidation:
//! pyramids are immutable once ingested. Two concurrent misses for the same
//! key may both read the store; the second write simply replaces the first.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::coord::{Extent, SpatialKey};
use crate::executor::BlockingPool;
use crate::mosaic::MosaicError;
use crate::raster::{Histogram, Tile};
use crate::store::{AttributeStore, LayerId, LayerMetadata, StoreError, TileStore};

use super::clients::{CacheStats, LayerCacheClient};
use super::traits::Cache;

/// Layer reader that puts a cache in front of the attribute and tile stores.
pub struct CachedLayerReader {
    attributes: Arc<dyn AttributeStore>,
    tiles: Arc<dyn TileStore>,
    cache: LayerCacheClient,
    pool: Arc<BlockingPool>,
}

impl CachedLayerReader {
    pub fn new(
        attributes: Arc<dyn AttributeStore>,
        tiles: Arc<dyn TileStore>,
        cache: Arc<dyn Cache>,
        pool: Arc<BlockingPool>,
    ) -> Self {
        Self {
            attributes,
            tiles,
            cache: LayerCacheClient::new(cache),
            pool,
        }
    }

    /// Highest indexed zoom of `layer`.
    pub async fn max_zoom(&self, layer: &LayerId) -> Result<Option<u8>, MosaicError> {
        let store = Arc::clone(&self.attributes);
        let owned = layer.clone();
        self.get_or_fetch(LayerCacheClient::max_zoom_key(layer), move || {
            store.max_zoom(&owned)
        })
        .await
    }

    pub async fn metadata(&self, layer: &LayerId, zoom: u8) -> Result<LayerMetadata, MosaicError> {
        let store = Arc::clone(&self.attributes);
        let owned = layer.clone();
        self.get_or_fetch(LayerCacheClient::metadata_key(layer, zoom), move || {
            store.metadata(&owned, zoom)
        })
        .await
    }

    /// Per-band histograms of one zoom level.
    pub async fn histogram(&self, layer: &LayerId, zoom: u8) -> Result<Vec<Histogram>, MosaicError> {
        let store = Arc::clone(&self.attributes);
        let owned = layer.clone();
        self.get_or_fetch(LayerCacheClient::histogram_key(layer, zoom), move || {
            store.histogram(&owned, zoom)
        })
        .await
    }

    /// Tile at `key`. Sparse keys are cached as absent too.
    pub async fn tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<Option<Tile>, MosaicError> {
        let store = Arc::clone(&self.tiles);
        let owned = layer.clone();
        self.get_or_fetch(LayerCacheClient::tile_key(layer, zoom, key), move || {
            store.read_tile(&owned, zoom, key)
        })
        .await
    }

    /// Native-resolution raster covering `extent` in the layer CRS.
    pub async fn tile_for_extent(&self, layer: &LayerId, zoom: u8, extent: Extent) -> Result<Tile, MosaicError> {
        let store = Arc::clone(&self.tiles);
        let owned = layer.clone();
        self.get_or_fetch(LayerCacheClient::extent_key(layer, zoom, &extent), move || {
            store.read_tile_for_extent(&owned, zoom, &extent)
        })
        .await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn pool(&self) -> &Arc<BlockingPool> {
        &self.pool
    }

    async fn get_or_fetch<T, F>(&self, key: String, read: F) -> Result<T, MosaicError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    {
        if let Some(value) = self.cache.get::<T>(&key).await {
            return Ok(value);
        }

        let value = self.pool.run(read).await??;
        self.cache.set(&key, &value).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheProvider;
    use crate::coord::KeyBounds;
    use crate::store::MemoryLayerStore;

    fn store() -> Arc<MemoryLayerStore> {
        let mut store = MemoryLayerStore::new();
        let meta = LayerMetadata::web_mercator(
            1,
            KeyBounds::new(SpatialKey::new(0, 0), SpatialKey::new(1, 1)),
            1,
        );
        store.insert_zoom_with_tiles(
            "a",
            1,
            meta,
            vec![(SpatialKey::new(0, 0), Tile::filled(256, 256, 1, 4.0))],
        );
        Arc::new(store)
    }

    fn reader(store: &Arc<MemoryLayerStore>, cache: Arc<dyn Cache>) -> CachedLayerReader {
        CachedLayerReader::new(
            store.clone(),
            store.clone(),
            cache,
            Arc::new(BlockingPool::new(2, "reader-test").unwrap()),
        )
    }

    #[tokio::test]
    async fn test_second_read_served_from_cache() {
        let store = store();
        let reader = reader(&store, Arc::new(MemoryCacheProvider::new(10_000_000, None)));
        let layer = LayerId::new("a");

        let first = reader.tile(&layer, 1, SpatialKey::new(0, 0)).await.unwrap();
        let second = reader.tile(&layer, 1, SpatialKey::new(0, 0)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.tile_reads(), 1);
        assert_eq!(reader.stats().hits, 1);
        assert_eq!(reader.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_absent_tile_is_cached() {
        let store = store();
        let reader = reader(&store, Arc::new(MemoryCacheProvider::new(10_000_000, None)));
        let layer = LayerId::new("a");

        assert!(reader.tile(&layer, 1, SpatialKey::new(1, 1)).await.unwrap().is_none());
        assert!(reader.tile(&layer, 1, SpatialKey::new(1, 1)).await.unwrap().is_none());
        assert_eq!(store.tile_reads(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_falls_back_to_store() {
        let store = store();
        let cache = Arc::new(MemoryCacheProvider::new(10_000_000, None));
        let reader = reader(&store, cache.clone());
        let layer = LayerId::new("a");

        cache.set("meta:a:1", b"not bincode".to_vec()).await.unwrap();

        let meta = reader.metadata(&layer, 1).await.unwrap();
        assert_eq!(meta.layout_cols, 2);
        assert_eq!(store.attribute_reads(), 1);
        assert_eq!(reader.stats().errors, 1);

        // Store result replaced the corrupt entry
        reader.metadata(&layer, 1).await.unwrap();
        assert_eq!(store.attribute_reads(), 1);
    }

    #[tokio::test]
    async fn test_store_errors_are_not_cached() {
        let mut failing = MemoryLayerStore::new();
        failing.fail_layer("a");
        let failing = Arc::new(failing);
        let reader = reader(&failing, Arc::new(MemoryCacheProvider::new(10_000_000, None)));
        let layer = LayerId::new("a");

        assert!(matches!(reader.max_zoom(&layer).await, Err(MosaicError::Store(_))));
        assert!(matches!(reader.max_zoom(&layer).await, Err(MosaicError::Store(_))));
        assert_eq!(failing.attribute_reads(), 2);
    }

    #[tokio::test]
    async fn test_extent_reads_are_cached_per_extent() {
        let store = store();
        let reader = reader(&store, Arc::new(MemoryCacheProvider::new(100_000_000, None)));
        let layer = LayerId::new("a");
        let extent = Extent::from_xyz(1, 0, 0);

        let tile = reader.tile_for_extent(&layer, 1, extent).await.unwrap();
        assert_eq!(tile.dimensions(), (256, 256));
        reader.tile_for_extent(&layer, 1, extent).await.unwrap();
        assert_eq!(store.extent_reads(), 1);

        reader
            .tile_for_extent(&layer, 1, Extent::from_xyz(1, 1, 0))
            .await
            .unwrap();
        assert_eq!(store.extent_reads(), 2);
    }
}
