//! Cache client for layer pyramid lookups.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::traits::Cache;
use crate::coord::{Extent, SpatialKey};
use crate::store::LayerId;

/// Snapshot of cache client counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Backend failures and undecodable entries. Each also counts as a miss.
    pub errors: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Typed cache access for layer lookups.
///
/// Values are bincode-encoded. Backend errors and entries that fail to
/// decode are logged and reported as misses, so callers always fall back
/// to the store.
pub struct LayerCacheClient {
    cache: Arc<dyn Cache>,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl LayerCacheClient {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Look up and decode a cached value.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Layer cache get failed");
                self.errors.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match bincode::deserialize(&bytes) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Undecodable cache entry, treating as miss");
                self.errors.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Encode and store a value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = match bincode::serialize(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, key = %key, "Failed to encode cache value");
                self.errors.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        if let Err(e) = self.cache.set(key, bytes).await {
            warn!(error = %e, key = %key, "Layer cache set failed");
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.cache.size_bytes()
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Format: `maxzoom:{layer}`
    pub fn max_zoom_key(layer: &LayerId) -> String {
        format!("maxzoom:{}", layer)
    }

    /// Format: `meta:{layer}:{zoom}`
    pub fn metadata_key(layer: &LayerId, zoom: u8) -> String {
        format!("meta:{}:{}", layer, zoom)
    }

    /// Format: `tile:{layer}:{zoom}:{col}:{row}`
    pub fn tile_key(layer: &LayerId, zoom: u8, key: SpatialKey) -> String {
        format!("tile:{}:{}:{}:{}", layer, zoom, key.col, key.row)
    }

    /// Format: `hist:{layer}:{zoom}`
    pub fn histogram_key(layer: &LayerId, zoom: u8) -> String {
        format!("hist:{}:{}", layer, zoom)
    }

    /// Format: `extent:{layer}:{zoom}:{xmin}:{ymin}:{xmax}:{ymax}`
    pub fn extent_key(layer: &LayerId, zoom: u8, extent: &Extent) -> String {
        format!("extent:{}:{}:{}", layer, zoom, extent.cache_fragment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheProvider;

    fn client() -> (Arc<MemoryCacheProvider>, LayerCacheClient) {
        let provider = Arc::new(MemoryCacheProvider::new(1_000_000, None));
        let client = LayerCacheClient::new(provider.clone());
        (provider, client)
    }

    #[test]
    fn test_key_formats() {
        let layer = LayerId::new("scene-1");
        assert_eq!(LayerCacheClient::max_zoom_key(&layer), "maxzoom:scene-1");
        assert_eq!(LayerCacheClient::metadata_key(&layer, 7), "meta:scene-1:7");
        assert_eq!(
            LayerCacheClient::tile_key(&layer, 7, SpatialKey::new(3, 9)),
            "tile:scene-1:7:3:9"
        );
        assert_eq!(LayerCacheClient::histogram_key(&layer, 7), "hist:scene-1:7");
        assert_eq!(
            LayerCacheClient::extent_key(&layer, 7, &Extent::new(1.0, 2.5, 3.0, 4.0)),
            "extent:scene-1:7:1:2.5:3:4"
        );
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_provider, client) = client();
        let key = "maxzoom:a";

        assert_eq!(client.get::<Option<u8>>(key).await, None);
        client.set(key, &Some(12u8)).await;
        assert_eq!(client.get::<Option<u8>>(key).await, Some(Some(12)));

        assert_eq!(
            client.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                errors: 0
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_miss() {
        let (provider, client) = client();
        provider.set("hist:a:3", vec![0xff]).await.unwrap();

        let value: Option<Vec<crate::raster::Histogram>> = client.get("hist:a:3").await;
        assert!(value.is_none());

        let stats = client.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            errors: 0,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
