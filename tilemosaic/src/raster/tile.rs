//! Multi-band raster tiles.
//!
//! A `Tile` is a row-major grid of `f32` samples per band. `NaN` marks
//! NoData. Tiles are immutable values once fetched; every operation here
//! returns a new tile.

use std::io::Cursor;

use image::{imageops, GrayAlphaImage, ImageBuffer, ImageFormat, Luma, LumaA, RgbaImage};
use serde::{Deserialize, Serialize};

use super::RasterError;

/// Canonical output tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Single-band buffer used for `image` crate operations.
type BandImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A multi-band raster grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTile")]
pub struct Tile {
    cols: u32,
    rows: u32,
    bands: Vec<Vec<f32>>,
}

/// Unchecked wire form; every decoded tile goes through `Tile::new`.
#[derive(Deserialize)]
struct RawTile {
    cols: u32,
    rows: u32,
    bands: Vec<Vec<f32>>,
}

impl TryFrom<RawTile> for Tile {
    type Error = RasterError;

    fn try_from(raw: RawTile) -> Result<Self, Self::Error> {
        Tile::new(raw.cols, raw.rows, raw.bands)
    }
}

impl Tile {
    /// Create a tile from per-band sample vectors.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::DimensionMismatch` if any band does not hold
    /// exactly `cols * rows` samples.
    pub fn new(cols: u32, rows: u32, bands: Vec<Vec<f32>>) -> Result<Self, RasterError> {
        let expected = cols as usize * rows as usize;
        if let Some(bad) = bands.iter().find(|b| b.len() != expected) {
            return Err(RasterError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(Self { cols, rows, bands })
    }

    /// A tile with every sample of every band set to `value`.
    pub fn filled(cols: u32, rows: u32, band_count: usize, value: f32) -> Self {
        let len = cols as usize * rows as usize;
        Self {
            cols,
            rows,
            bands: vec![vec![value; len]; band_count],
        }
    }

    /// A tile with every sample set to NoData.
    pub fn no_data(cols: u32, rows: u32, band_count: usize) -> Self {
        Self::filled(cols, rows, band_count, f32::NAN)
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Raw samples for one band.
    pub fn band_data(&self, band: usize) -> Option<&[f32]> {
        self.bands.get(band).map(Vec::as_slice)
    }

    /// Sample at (col, row) of the given band.
    ///
    /// Panics if the band or position is out of range.
    pub fn get(&self, band: usize, col: u32, row: u32) -> f32 {
        self.bands[band][self.index(col, row)]
    }

    /// Returns a copy with one sample replaced.
    pub fn with_sample(mut self, band: usize, col: u32, row: u32, value: f32) -> Self {
        let idx = self.index(col, row);
        self.bands[band][idx] = value;
        self
    }

    /// Extract one band as a single-band tile.
    pub fn band(&self, band: usize) -> Result<Tile, RasterError> {
        let data = self.bands.get(band).ok_or(RasterError::BandOutOfRange {
            band,
            band_count: self.bands.len(),
        })?;
        Ok(Tile {
            cols: self.cols,
            rows: self.rows,
            bands: vec![data.clone()],
        })
    }

    /// Apply `f` to every sample of every band.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tile {
        Tile {
            cols: self.cols,
            rows: self.rows,
            bands: self
                .bands
                .iter()
                .map(|b| b.iter().map(|&v| f(v)).collect())
                .collect(),
        }
    }

    /// True if every sample in every band is NoData.
    pub fn is_no_data(&self) -> bool {
        self.bands.iter().flatten().all(|v| v.is_nan())
    }

    /// Crop a pixel window. The window is clamped to the tile.
    pub fn crop(&self, col: u32, row: u32, cols: u32, rows: u32) -> Tile {
        if self.cols == 0 || self.rows == 0 {
            return self.clone();
        }
        let col = col.min(self.cols.saturating_sub(1));
        let row = row.min(self.rows.saturating_sub(1));
        let cols = cols.min(self.cols - col).max(1);
        let rows = rows.min(self.rows - row).max(1);

        let bands = self
            .bands
            .iter()
            .map(|data| {
                // band length is checked at construction, so from_raw succeeds
                BandImage::from_raw(self.cols, self.rows, data.clone())
                    .map(|img| imageops::crop_imm(&img, col, row, cols, rows).to_image().into_raw())
                    .unwrap_or_else(|| vec![f32::NAN; cols as usize * rows as usize])
            })
            .collect();

        Tile { cols, rows, bands }
    }

    /// Nearest-neighbour resample to new dimensions.
    ///
    /// Each output pixel takes the source pixel whose area contains the
    /// output pixel's centre, so integer upscales replicate pixels exactly
    /// and NoData never bleeds into neighbouring cells.
    pub fn resample(&self, cols: u32, rows: u32) -> Tile {
        if (cols, rows) == (self.cols, self.rows) {
            return self.clone();
        }
        if self.cols == 0 || self.rows == 0 {
            return Tile::no_data(cols, rows, self.band_count());
        }

        let col_map: Vec<usize> = (0..cols)
            .map(|c| nearest_source(c, cols, self.cols))
            .collect();
        let row_map: Vec<usize> = (0..rows)
            .map(|r| nearest_source(r, rows, self.rows))
            .collect();

        let src_cols = self.cols as usize;
        let bands = self
            .bands
            .iter()
            .map(|data| {
                let mut out = Vec::with_capacity(cols as usize * rows as usize);
                for &sr in &row_map {
                    let base = sr * src_cols;
                    out.extend(col_map.iter().map(|&sc| data[base + sc]));
                }
                out
            })
            .collect();

        Tile { cols, rows, bands }
    }

    /// Overlay `other` onto this tile: wherever `other` has data it replaces
    /// the sample here. Both tiles must have identical dimensions and band
    /// counts.
    pub fn overlay(&self, other: &Tile) -> Result<Tile, RasterError> {
        self.zip_with(other, |under, over| if over.is_nan() { under } else { over })
    }

    /// Combine two tiles sample-wise, keeping data over NoData and the
    /// larger value where both have data. The operation is commutative.
    pub fn combine_max(&self, other: &Tile) -> Result<Tile, RasterError> {
        self.zip_with(other, |a, b| match (a.is_nan(), b.is_nan()) {
            (true, _) => b,
            (_, true) => a,
            _ => a.max(b),
        })
    }

    /// Render a 4-band tile (RGBA samples in 0..=255) to an image.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, RasterError> {
        if self.bands.len() != 4 {
            return Err(RasterError::NotRgba(self.bands.len()));
        }
        Ok(RgbaImage::from_fn(self.cols, self.rows, |c, r| {
            let idx = self.index(c, r);
            let channel = |b: usize| {
                let v = self.bands[b][idx];
                if v.is_nan() {
                    0
                } else {
                    v.clamp(0.0, 255.0) as u8
                }
            };
            image::Rgba([channel(0), channel(1), channel(2), channel(3)])
        }))
    }

    /// Encode a 4-band tile as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let img = self.to_rgba_image()?;
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Encode one band as an 8-bit grey PNG for quick looks.
    ///
    /// Samples are stretched linearly between the band's minimum and
    /// maximum; NoData is transparent.
    pub fn encode_gray_png(&self, band: usize) -> Result<Vec<u8>, RasterError> {
        let data = self.band_data(band).ok_or(RasterError::BandOutOfRange {
            band,
            band_count: self.bands.len(),
        })?;

        let (min, max) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = if max > min { max - min } else { 1.0 };

        let img = GrayAlphaImage::from_fn(self.cols, self.rows, |c, r| {
            let v = data[self.index(c, r)];
            if v.is_finite() {
                LumaA([(((v - min) / span) * 255.0).round().clamp(0.0, 255.0) as u8, 255])
            } else {
                LumaA([0, 0])
            }
        });

        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn zip_with(&self, other: &Tile, f: impl Fn(f32, f32) -> f32) -> Result<Tile, RasterError> {
        if self.dimensions() != other.dimensions() || self.band_count() != other.band_count() {
            return Err(RasterError::ShapeMismatch {
                left: (self.cols, self.rows, self.band_count()),
                right: (other.cols, other.rows, other.band_count()),
            });
        }
        let bands = self
            .bands
            .iter()
            .zip(&other.bands)
            .map(|(a, b)| a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
            .collect();
        Ok(Tile {
            cols: self.cols,
            rows: self.rows,
            bands,
        })
    }

    #[inline]
    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }
}

/// Tiles compare sample bit patterns, so NoData equals NoData and two tiles
/// are equal exactly when they are byte-identical.
impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.cols == other.cols
            && self.rows == other.rows
            && self.bands.len() == other.bands.len()
            && self.bands.iter().zip(&other.bands).all(|(a, b)| {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            })
    }
}

impl Eq for Tile {}

#[inline]
fn nearest_source(out: u32, out_len: u32, src_len: u32) -> usize {
    // (out + 0.5) * src / out_len, in integer arithmetic
    let idx = ((2 * out as u64 + 1) * src_len as u64) / (2 * out_len as u64);
    idx.min(src_len as u64 - 1) as usize
}
