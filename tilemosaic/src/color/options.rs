//! Render options attached to projects and scenes.

use serde::{Deserialize, Serialize};

use crate::raster::{Histogram, Tile};

/// How a band's values are classified into colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandDataType {
    /// Continuous values; breaks at equal-count quantiles.
    #[default]
    Sequential,
    /// Values diverging around a midpoint; breaks at equal intervals.
    Diverging,
    /// Discrete classes; one colour per distinct value.
    Categorical,
}

/// Project-wide options for single-band ramp rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleBandOptions {
    /// Zero-based band to render.
    pub band: usize,
    #[serde(default)]
    pub data_type: BandDataType,
    /// Number of colour classes. Zero uses one class per scheme colour.
    #[serde(default)]
    pub color_bins: usize,
    /// Ramp anchor colours as `#RRGGBB` or `#RRGGBBAA`.
    pub color_scheme: Vec<String>,
    /// Sample values rendered as transparent in addition to NaN.
    #[serde(default)]
    pub extra_no_data: Vec<f64>,
}

impl SingleBandOptions {
    pub fn new(band: usize, color_scheme: Vec<String>) -> Self {
        Self {
            band,
            data_type: BandDataType::default(),
            color_bins: 0,
            color_scheme,
            extra_no_data: Vec::new(),
        }
    }

    pub fn with_data_type(mut self, data_type: BandDataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_color_bins(mut self, bins: usize) -> Self {
        self.color_bins = bins;
        self
    }

    pub fn with_extra_no_data(mut self, values: Vec<f64>) -> Self {
        self.extra_no_data = values;
        self
    }

    /// Number of classes for sequential and diverging ramps.
    pub fn class_count(&self) -> usize {
        if self.color_bins > 0 {
            self.color_bins
        } else {
            self.color_scheme.len()
        }
    }
}

/// Per-scene colour correction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorCorrectParams {
    /// Lower clip bound applied to samples before ramp mapping.
    #[serde(default)]
    pub clip_min: Option<f64>,
    /// Upper clip bound applied to samples before ramp mapping.
    #[serde(default)]
    pub clip_max: Option<f64>,
}

impl ColorCorrectParams {
    pub fn clipped(min: f64, max: f64) -> Self {
        Self {
            clip_min: Some(min),
            clip_max: Some(max),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.clip_min.is_none() && self.clip_max.is_none()
    }

    /// Clamp every sample into the clip range. NoData is untouched.
    pub fn apply(&self, tile: Tile) -> Tile {
        if self.is_identity() {
            return tile;
        }
        let lo = self.clip_min.unwrap_or(f64::NEG_INFINITY) as f32;
        let hi = self.clip_max.unwrap_or(f64::INFINITY) as f32;
        tile.map(|v| if v.is_nan() { v } else { v.max(lo).min(hi) })
    }

    /// Clamp a histogram to the clip range so ramp breaks derived from it
    /// stay inside the values [`apply`](Self::apply) can produce.
    pub fn apply_histogram(&self, hist: &Histogram) -> Histogram {
        if self.is_identity() {
            return hist.clone();
        }
        hist.clamped(
            self.clip_min.unwrap_or(f64::NEG_INFINITY),
            self.clip_max.unwrap_or(f64::INFINITY),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_json_defaults() {
        let opts: SingleBandOptions =
            serde_json::from_str(r##"{"band": 2, "color_scheme": ["#000000", "#ffffff"]}"##).unwrap();
        assert_eq!(opts.band, 2);
        assert_eq!(opts.data_type, BandDataType::Sequential);
        assert_eq!(opts.class_count(), 2);
        assert!(opts.extra_no_data.is_empty());
    }

    #[test]
    fn test_data_type_names() {
        let t: BandDataType = serde_json::from_str("\"categorical\"").unwrap();
        assert_eq!(t, BandDataType::Categorical);
    }

    #[test]
    fn test_class_count_prefers_bins() {
        let opts = SingleBandOptions::new(0, vec!["#000000".into()]).with_color_bins(9);
        assert_eq!(opts.class_count(), 9);
    }

    #[test]
    fn test_clip_leaves_nodata() {
        let tile = Tile::new(3, 1, vec![vec![-5.0, f32::NAN, 50.0]]).unwrap();
        let clipped = ColorCorrectParams::clipped(0.0, 10.0).apply(tile);

        assert_eq!(clipped.get(0, 0, 0), 0.0);
        assert!(clipped.get(0, 1, 0).is_nan());
        assert_eq!(clipped.get(0, 2, 0), 10.0);
    }

    #[test]
    fn test_clip_histogram_matches_clipped_samples() {
        let samples = [-5.0, 1.0, 4.0, 50.0];
        let params = ColorCorrectParams::clipped(0.0, 10.0);

        let clipped_tile = params.apply(Tile::new(4, 1, vec![samples.to_vec()]).unwrap());
        let expected = Histogram::from_samples(clipped_tile.band_data(0).unwrap());

        assert_eq!(params.apply_histogram(&Histogram::from_samples(&samples)), expected);
    }

    #[test]
    fn test_identity_params_keep_tile() {
        let tile = Tile::filled(2, 2, 1, 99.0);
        assert_eq!(ColorCorrectParams::default().apply(tile.clone()), tile);
    }
}
