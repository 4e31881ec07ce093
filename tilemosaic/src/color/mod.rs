//! Histogram-driven colour ramps for single-band rendering.
//!
//! [`colorize`] turns one or more single-band scene tiles into an RGBA
//! tile. Break points come from the merged histogram of every input, so
//! overlapping scenes share one consistent colour scale.

mod corrector;
mod options;
mod ramp;

pub use corrector::colorize;
pub use options::{BandDataType, ColorCorrectParams, SingleBandOptions};
pub use ramp::{interpolate_colors, parse_hex_color, ColorMap, Rgba, TRANSPARENT};

use thiserror::Error;

/// Invalid colour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid colour '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("Colour scheme is empty")]
    EmptyScheme,
}
