//! In-memory layer store.
//!
//! Holds complete pyramids in memory. Populated up front through `&mut self`
//! builder methods and then shared read-only behind an `Arc`. Read counters
//! make cache behaviour observable, and individual layers can be marked as
//! failing to exercise error isolation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coord::{Extent, SpatialKey};
use crate::raster::{Histogram, Tile};

use super::stitch::stitch_extent;
use super::{AttributeStore, LayerId, LayerMetadata, StoreError, TileStore};

struct MemoryZoom {
    metadata: LayerMetadata,
    histograms: Vec<Histogram>,
    tiles: HashMap<SpatialKey, Tile>,
}

/// In-memory implementation of [`AttributeStore`] and [`TileStore`].
#[derive(Default)]
pub struct MemoryLayerStore {
    layers: HashMap<LayerId, BTreeMap<u8, MemoryZoom>>,
    failing: HashSet<LayerId>,
    attribute_reads: AtomicU64,
    tile_reads: AtomicU64,
    extent_reads: AtomicU64,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zoom level with explicit histograms.
    pub fn insert_zoom(
        &mut self,
        layer: impl Into<LayerId>,
        zoom: u8,
        metadata: LayerMetadata,
        histograms: Vec<Histogram>,
    ) {
        self.layers.entry(layer.into()).or_default().insert(
            zoom,
            MemoryZoom {
                metadata,
                histograms,
                tiles: HashMap::new(),
            },
        );
    }

    /// Register a zoom level together with its tiles, deriving one
    /// histogram per band from the tile samples.
    pub fn insert_zoom_with_tiles(
        &mut self,
        layer: impl Into<LayerId>,
        zoom: u8,
        metadata: LayerMetadata,
        tiles: impl IntoIterator<Item = (SpatialKey, Tile)>,
    ) {
        let tiles: HashMap<SpatialKey, Tile> = tiles.into_iter().collect();
        let histograms = (0..metadata.band_count)
            .map(|band| {
                let mut hist = Histogram::new();
                for tile in tiles.values() {
                    if let Some(data) = tile.band_data(band) {
                        hist = hist.merge(&Histogram::from_samples(data));
                    }
                }
                hist
            })
            .collect();

        self.layers.entry(layer.into()).or_default().insert(
            zoom,
            MemoryZoom {
                metadata,
                histograms,
                tiles,
            },
        );
    }

    /// Add one tile to a zoom level registered earlier.
    pub fn insert_tile(
        &mut self,
        layer: impl Into<LayerId>,
        zoom: u8,
        key: SpatialKey,
        tile: Tile,
    ) -> Result<(), StoreError> {
        let layer = layer.into();
        let level = self
            .layers
            .get_mut(&layer)
            .and_then(|zooms| zooms.get_mut(&zoom))
            .ok_or_else(|| StoreError::MissingZoom {
                layer: layer.clone(),
                zoom,
            })?;
        level.tiles.insert(key, tile);
        Ok(())
    }

    /// Make every read of `layer` fail with an I/O error.
    pub fn fail_layer(&mut self, layer: impl Into<LayerId>) {
        self.failing.insert(layer.into());
    }

    /// Number of attribute reads (max zoom, metadata, histogram) served.
    pub fn attribute_reads(&self) -> u64 {
        self.attribute_reads.load(Ordering::Relaxed)
    }

    /// Number of single-tile reads served.
    pub fn tile_reads(&self) -> u64 {
        self.tile_reads.load(Ordering::Relaxed)
    }

    /// Number of extent reads served.
    pub fn extent_reads(&self) -> u64 {
        self.extent_reads.load(Ordering::Relaxed)
    }

    fn check_failing(&self, layer: &LayerId) -> Result<(), StoreError> {
        if self.failing.contains(layer) {
            return Err(StoreError::io(
                layer,
                std::io::Error::new(std::io::ErrorKind::Other, "injected read failure"),
            ));
        }
        Ok(())
    }

    fn zoom_level(&self, layer: &LayerId, zoom: u8) -> Result<&MemoryZoom, StoreError> {
        self.check_failing(layer)?;
        self.layers
            .get(layer)
            .and_then(|zooms| zooms.get(&zoom))
            .ok_or_else(|| StoreError::MissingZoom {
                layer: layer.clone(),
                zoom,
            })
    }
}

impl AttributeStore for MemoryLayerStore {
    fn max_zoom(&self, layer: &LayerId) -> Result<Option<u8>, StoreError> {
        self.attribute_reads.fetch_add(1, Ordering::Relaxed);
        self.check_failing(layer)?;
        Ok(self
            .layers
            .get(layer)
            .and_then(|zooms| zooms.keys().next_back().copied()))
    }

    fn metadata(&self, layer: &LayerId, zoom: u8) -> Result<LayerMetadata, StoreError> {
        self.attribute_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.zoom_level(layer, zoom)?.metadata.clone())
    }

    fn histogram(&self, layer: &LayerId, zoom: u8) -> Result<Vec<Histogram>, StoreError> {
        self.attribute_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.zoom_level(layer, zoom)?.histograms.clone())
    }
}

impl TileStore for MemoryLayerStore {
    fn read_tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<Option<Tile>, StoreError> {
        self.tile_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.zoom_level(layer, zoom)?.tiles.get(&key).cloned())
    }

    fn read_tile_for_extent(&self, layer: &LayerId, zoom: u8, extent: &Extent) -> Result<Tile, StoreError> {
        self.extent_reads.fetch_add(1, Ordering::Relaxed);
        let level = self.zoom_level(layer, zoom)?;
        stitch_extent(layer, &level.metadata, extent, |key| Ok(level.tiles.get(&key).cloned()))
    }
}
