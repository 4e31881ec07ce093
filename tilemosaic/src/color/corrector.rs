//! Colour ramp correction across scenes.

use tracing::debug;

use crate::mosaic::MosaicError;
use crate::raster::{Histogram, Tile, TILE_SIZE};

use super::options::{BandDataType, SingleBandOptions};
use super::ramp::{interpolate_colors, parse_hex_color, ColorMap, Rgba};
use super::ColorError;

/// Render scene tiles to one RGBA tile with a shared colour ramp.
///
/// The selected band is extracted from every tile and the extracted bands
/// are combined per pixel (data over NoData, larger value where several
/// scenes have data). Break points come from the sum of the scenes' band
/// histograms. Both steps are commutative, so the output does not depend
/// on input order.
///
/// An empty input yields a fully transparent tile of canonical size.
pub fn colorize(tiles: &[(Tile, Vec<Histogram>)], options: &SingleBandOptions) -> Result<Tile, MosaicError> {
    let anchors = options
        .color_scheme
        .iter()
        .map(|c| parse_hex_color(c))
        .collect::<Result<Vec<Rgba>, _>>()?;
    if anchors.is_empty() {
        return Err(ColorError::EmptyScheme.into());
    }

    let mut combined: Option<Tile> = None;
    let mut histograms = Vec::with_capacity(tiles.len());
    for (tile, hists) in tiles {
        let band = tile.band(options.band)?;
        combined = Some(match combined {
            None => band,
            Some(acc) => acc.combine_max(&band)?,
        });
        match hists.get(options.band) {
            Some(hist) => histograms.push(hist),
            None => debug!(band = options.band, "Scene has no histogram for band"),
        }
    }

    let Some(combined) = combined else {
        return Ok(Tile::no_data(TILE_SIZE, TILE_SIZE, 4));
    };

    let merged = Histogram::merge_all(histograms);
    let map = color_map(&merged, &anchors, options);
    render_rgba(&combined, &map)
}

fn color_map(hist: &Histogram, anchors: &[Rgba], options: &SingleBandOptions) -> ColorMap {
    let map = match options.data_type {
        BandDataType::Sequential => {
            let breaks = hist.quantile_breaks(options.class_count());
            let colors = interpolate_colors(anchors, breaks.len());
            ColorMap::classified(breaks, colors)
        }
        BandDataType::Diverging => {
            let breaks = hist.equal_interval_breaks(options.class_count());
            let colors = interpolate_colors(anchors, breaks.len());
            ColorMap::classified(breaks, colors)
        }
        BandDataType::Categorical => {
            let breaks: Vec<f64> = hist.values().collect();
            let colors = interpolate_colors(anchors, breaks.len());
            ColorMap::exact(breaks, colors)
        }
    };
    map.with_no_data(options.extra_no_data.clone())
}

fn render_rgba(band: &Tile, map: &ColorMap) -> Result<Tile, MosaicError> {
    let (cols, rows) = band.dimensions();
    let mut channels = vec![Vec::with_capacity(cols as usize * rows as usize); 4];
    for row in 0..rows {
        for col in 0..cols {
            let rgba = map.color_of(band.get(0, col, row));
            for (channel, &value) in channels.iter_mut().zip(rgba.iter()) {
                channel.push(value as f32);
            }
        }
    }
    Ok(Tile::new(cols, rows, channels)?)
}
