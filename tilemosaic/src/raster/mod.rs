//! Raster primitives: tiles and histograms.

mod histogram;
mod tile;

pub use histogram::Histogram;
pub use tile::{Tile, TILE_SIZE};

use thiserror::Error;

/// Errors from raster operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RasterError {
    /// Band sample count does not match the tile dimensions.
    #[error("Band holds {actual} samples, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Requested band does not exist.
    #[error("Band {band} out of range (tile has {band_count} bands)")]
    BandOutOfRange { band: usize, band_count: usize },

    /// Two tiles could not be combined because their shapes differ.
    #[error("Tile shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (u32, u32, usize),
        right: (u32, u32, usize),
    },

    /// Image output requires exactly four bands.
    #[error("Expected 4 RGBA bands, tile has {0}")]
    NotRgba(usize),

    /// Image encoding failed.
    #[error("Image encoding failed: {0}")]
    Encode(String),
}
