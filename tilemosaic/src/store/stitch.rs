//! Assemble an extent raster from the tiles that overlap it.

use crate::coord::{Extent, SpatialKey};
use crate::raster::Tile;

use super::{LayerId, LayerMetadata, StoreError};

/// Largest extent read, in pixels per side.
pub const MAX_EXTENT_PIXELS: u32 = 4096;

/// Stitch the tiles overlapping `extent` into one native-resolution raster.
///
/// Pixels outside the layout, outside the key bounds, or inside keys that
/// `read` reports as absent are NoData.
pub(crate) fn stitch_extent<F>(
    layer: &LayerId,
    metadata: &LayerMetadata,
    extent: &Extent,
    mut read: F,
) -> Result<Tile, StoreError>
where
    F: FnMut(SpatialKey) -> Result<Option<Tile>, StoreError>,
{
    let window = metadata.pixel_window(extent);
    if !window.fits(MAX_EXTENT_PIXELS) {
        return Err(StoreError::ExtentTooLarge {
            cols: window.cols,
            rows: window.rows,
            limit: MAX_EXTENT_PIXELS,
        });
    }

    let out_cols = window.cols as usize;
    let out_rows = window.rows as usize;
    let mut bands = vec![vec![f32::NAN; out_cols * out_rows]; metadata.band_count];

    for key in metadata.keys_in_window(&window) {
        let Some(tile) = read(key)? else {
            continue;
        };

        let origin_col = key.col as i64 * metadata.tile_cols as i64;
        let origin_row = key.row as i64 * metadata.tile_rows as i64;

        let col_start = window.col_min.max(origin_col);
        let col_end = (window.col_min + window.cols as i64).min(origin_col + tile.cols() as i64);
        let row_start = window.row_min.max(origin_row);
        let row_end = (window.row_min + window.rows as i64).min(origin_row + tile.rows() as i64);
        if col_start >= col_end || row_start >= row_end {
            continue;
        }

        let tile_cols = tile.cols() as usize;
        for (band, out) in bands.iter_mut().enumerate() {
            let Some(src) = tile.band_data(band) else {
                continue;
            };
            for row in row_start..row_end {
                let src_base = (row - origin_row) as usize * tile_cols;
                let dst_base = (row - window.row_min) as usize * out_cols;
                for col in col_start..col_end {
                    out[dst_base + (col - window.col_min) as usize] =
                        src[src_base + (col - origin_col) as usize];
                }
            }
        }
    }

    Tile::new(window.cols as u32, window.rows as u32, bands)
        .map_err(|e| StoreError::decode(layer, "extent raster", e))
}
