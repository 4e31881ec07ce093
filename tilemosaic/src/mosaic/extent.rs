//! Extent fetch: a layer's raster and histograms for a map rectangle.

use std::sync::Arc;

use futures::try_join;
use tracing::debug;

use crate::cache::CachedLayerReader;
use crate::coord::{CrsExtent, Extent};
use crate::raster::{Histogram, Tile};
use crate::store::{LayerId, StoreError, MAX_EXTENT_PIXELS};

use super::resolver::{MetadataResolver, ResolvedLayer};
use super::{FetchResult, MosaicError};

/// Fetches a layer's raster for an extent together with its histograms.
#[derive(Clone)]
pub struct ExtentFetcher {
    reader: Arc<CachedLayerReader>,
    resolver: MetadataResolver,
    output_size: u32,
}

impl ExtentFetcher {
    pub fn new(reader: Arc<CachedLayerReader>, output_size: u32) -> Self {
        Self {
            resolver: MetadataResolver::new(Arc::clone(&reader)),
            reader,
            output_size: output_size.max(1),
        }
    }

    /// Read `layer` for `extent`, starting from the effective zoom.
    ///
    /// The extent is reprojected into the layer CRS. Without an extent the
    /// full layout is read. When the window at the effective zoom exceeds
    /// [`MAX_EXTENT_PIXELS`] the next lower indexed zoom whose window fits
    /// is read instead, together with that zoom's histograms. The raster is
    /// resampled to `output_size` square so results from different scenes
    /// line up pixel for pixel. Returns `None` only for a layer with no
    /// indexed zooms.
    pub async fn fetch_for_extent(
        &self,
        layer: &LayerId,
        zoom: u8,
        extent: Option<CrsExtent>,
    ) -> FetchResult<(Tile, Vec<Histogram>)> {
        let Some(resolved) = self.resolver.resolve(layer, zoom).await? else {
            return Ok(None);
        };

        let (source_zoom, target) = self.source_level(layer, resolved, extent).await?;

        let (histograms, tile) = try_join!(
            self.reader.histogram(layer, source_zoom),
            self.reader.tile_for_extent(layer, source_zoom, target),
        )?;

        let size = self.output_size;
        let tile = if tile.dimensions() == (size, size) {
            tile
        } else {
            tile.resample(size, size)
        };
        Ok(Some((tile, histograms)))
    }

    /// Pick the highest indexed zoom at or below the effective zoom whose
    /// pixel window for the target extent fits the stitching limit.
    async fn source_level(
        &self,
        layer: &LayerId,
        resolved: ResolvedLayer,
        extent: Option<CrsExtent>,
    ) -> Result<(u8, Extent), MosaicError> {
        let mut zoom = resolved.zoom;
        let mut metadata = resolved.metadata;

        loop {
            let target = match extent {
                Some(requested) => requested.reproject(metadata.crs)?.extent,
                None => metadata.layout_extent,
            };
            let window = metadata.pixel_window(&target);
            if window.fits(MAX_EXTENT_PIXELS) {
                debug!(layer = %layer, zoom, crs = metadata.crs, ?target, "Fetching extent");
                return Ok((zoom, target));
            }

            metadata = loop {
                if zoom == 0 {
                    return Err(StoreError::ExtentTooLarge {
                        cols: window.cols,
                        rows: window.rows,
                        limit: MAX_EXTENT_PIXELS,
                    }
                    .into());
                }
                zoom -= 1;
                match self.reader.metadata(layer, zoom).await {
                    Ok(metadata) => break metadata,
                    Err(MosaicError::Store(StoreError::MissingZoom { .. })) => continue,
                    Err(e) => return Err(e),
                }
            };
            debug!(
                layer = %layer,
                zoom,
                cols = window.cols,
                rows = window.rows,
                "Extent window too large, reading coarser zoom"
            );
        }
    }
}
