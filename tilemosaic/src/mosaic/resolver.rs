//! Zoom clamping and metadata lookup.

use std::sync::Arc;

use tracing::debug;

use crate::cache::CachedLayerReader;
use crate::store::{LayerId, LayerMetadata};

use super::FetchResult;

/// A layer resolved at the zoom it can actually serve.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    /// Requested zoom clamped to the highest indexed zoom.
    pub zoom: u8,
    pub metadata: LayerMetadata,
}

/// Resolves a requested zoom to the layer's effective zoom and metadata.
#[derive(Clone)]
pub struct MetadataResolver {
    reader: Arc<CachedLayerReader>,
}

impl MetadataResolver {
    pub fn new(reader: Arc<CachedLayerReader>) -> Self {
        Self { reader }
    }

    /// Clamp `zoom` to the layer's max indexed zoom and load that zoom's
    /// metadata. A layer with no indexed zooms resolves to `None`.
    pub async fn resolve(&self, layer: &LayerId, zoom: u8) -> FetchResult<ResolvedLayer> {
        let Some(max_zoom) = self.reader.max_zoom(layer).await? else {
            debug!(layer = %layer, "Layer has no indexed zooms");
            return Ok(None);
        };

        let effective = zoom.min(max_zoom);
        let metadata = self.reader.metadata(layer, effective).await?;
        Ok(Some(ResolvedLayer {
            zoom: effective,
            metadata,
        }))
    }
}
