//! Read-only layer store over a local directory tree.
//!
//! Layout:
//!
//! ```text
//! {root}/{layer}/attributes.json        per-zoom metadata and histograms
//! {root}/{layer}/{zoom}/{col}/{row}.tile bincode-encoded tiles
//! ```
//!
//! A missing tile file is a sparse key, not an error. A missing
//! `attributes.json` means the layer has no indexed zooms.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coord::{Extent, SpatialKey};
use crate::raster::{Histogram, Tile};

use super::stitch::stitch_extent;
use super::{AttributeStore, LayerId, LayerMetadata, StoreError, TileStore};

const ATTRIBUTES_FILE: &str = "attributes.json";
const TILE_EXTENSION: &str = "tile";

/// Contents of a layer's `attributes.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerAttributes {
    pub zooms: BTreeMap<u8, ZoomAttributes>,
}

/// Attributes of one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomAttributes {
    pub metadata: LayerMetadata,
    #[serde(default)]
    pub histograms: Vec<Histogram>,
}

/// Layer store reading pyramids from `root`.
#[derive(Debug, Clone)]
pub struct FsLayerStore {
    root: PathBuf,
}

impl FsLayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a layer's attributes file.
    pub fn attributes_path(&self, layer: &LayerId) -> Result<PathBuf, StoreError> {
        Ok(self.layer_dir(layer)?.join(ATTRIBUTES_FILE))
    }

    /// Path of one tile file.
    pub fn tile_path(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .layer_dir(layer)?
            .join(zoom.to_string())
            .join(key.col.to_string())
            .join(format!("{}.{}", key.row, TILE_EXTENSION)))
    }

    /// Write a layer's attributes, creating directories as needed.
    pub fn write_attributes(&self, layer: &LayerId, attributes: &LayerAttributes) -> Result<(), StoreError> {
        let path = self.attributes_path(layer)?;
        create_parent(layer, &path)?;
        let json = serde_json::to_vec_pretty(attributes)
            .map_err(|e| StoreError::decode(layer, "attributes", e))?;
        fs::write(&path, json).map_err(|e| StoreError::io(layer, e))
    }

    /// Write one tile, creating directories as needed.
    pub fn write_tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey, tile: &Tile) -> Result<(), StoreError> {
        let path = self.tile_path(layer, zoom, key)?;
        create_parent(layer, &path)?;
        let bytes = bincode::serialize(tile).map_err(|e| StoreError::decode(layer, "tile", e))?;
        fs::write(&path, bytes).map_err(|e| StoreError::io(layer, e))
    }

    fn layer_dir(&self, layer: &LayerId) -> Result<PathBuf, StoreError> {
        let id = layer.as_str();
        let valid = !id.is_empty()
            && id != "."
            && !id.contains("..")
            && !id.contains('/')
            && !id.contains('\\');
        if !valid {
            return Err(StoreError::InvalidLayerId(layer.clone()));
        }
        Ok(self.root.join(id))
    }

    fn load_attributes(&self, layer: &LayerId) -> Result<Option<LayerAttributes>, StoreError> {
        let path = self.attributes_path(layer)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(layer = %layer, path = %path.display(), "No attributes file");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(layer, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::decode(layer, "attributes", e))
    }

    fn zoom_attributes(&self, layer: &LayerId, zoom: u8) -> Result<ZoomAttributes, StoreError> {
        self.load_attributes(layer)?
            .and_then(|mut attrs| attrs.zooms.remove(&zoom))
            .ok_or_else(|| StoreError::MissingZoom {
                layer: layer.clone(),
                zoom,
            })
    }

    fn load_tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<Option<Tile>, StoreError> {
        let path = self.tile_path(layer, zoom, key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(layer, e)),
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::decode(layer, "tile", e))
    }
}

fn create_parent(layer: &LayerId, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(layer, e))?;
    }
    Ok(())
}

impl AttributeStore for FsLayerStore {
    fn max_zoom(&self, layer: &LayerId) -> Result<Option<u8>, StoreError> {
        Ok(self
            .load_attributes(layer)?
            .and_then(|attrs| attrs.zooms.keys().next_back().copied()))
    }

    fn metadata(&self, layer: &LayerId, zoom: u8) -> Result<LayerMetadata, StoreError> {
        Ok(self.zoom_attributes(layer, zoom)?.metadata)
    }

    fn histogram(&self, layer: &LayerId, zoom: u8) -> Result<Vec<Histogram>, StoreError> {
        Ok(self.zoom_attributes(layer, zoom)?.histograms)
    }
}

impl TileStore for FsLayerStore {
    fn read_tile(&self, layer: &LayerId, zoom: u8, key: SpatialKey) -> Result<Option<Tile>, StoreError> {
        self.load_tile(layer, zoom, key)
    }

    fn read_tile_for_extent(&self, layer: &LayerId, zoom: u8, extent: &Extent) -> Result<Tile, StoreError> {
        let metadata = self.zoom_attributes(layer, zoom)?.metadata;
        stitch_extent(layer, &metadata, extent, |key| self.load_tile(layer, zoom, key))
    }
}
