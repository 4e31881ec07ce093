//! Mosaic error types.

use thiserror::Error;

use crate::color::ColorError;
use crate::coord::ProjectionError;
use crate::executor::PoolError;
use crate::project::ProjectError;
use crate::raster::RasterError;
use crate::store::StoreError;

/// Outcome of a lookup that may legitimately find nothing.
///
/// `Ok(None)` is "no content" and is never an error.
pub type FetchResult<T> = Result<Option<T>, MosaicError>;

/// Malformed `xmin,ymin,xmax,ymax` bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BboxParseError {
    #[error("expected 4 comma-separated values, got {0}")]
    WrongArity(usize),

    #[error("'{0}' is not a finite number")]
    InvalidNumber(String),

    #[error("minimum corner must lie below and left of maximum corner")]
    Inverted,
}

/// Errors raised while composing mosaic tiles.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// The project has no single-band render options.
    #[error("Project {project} has no single-band render options")]
    MissingRenderOptions { project: String },

    #[error("Invalid bbox: {0}")]
    InvalidBbox(#[from] BboxParseError),

    #[error("Invalid colour scheme: {0}")]
    Color(#[from] ColorError),

    #[error("Band {band} out of range (tile has {band_count} bands)")]
    BandOutOfRange { band: usize, band_count: usize },

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Raster operation failed: {0}")]
    Raster(RasterError),

    #[error("Failed to encode output: {0}")]
    Encode(String),
}

impl MosaicError {
    /// True for errors caused by the request or project configuration
    /// rather than by the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MosaicError::MissingRenderOptions { .. }
                | MosaicError::InvalidBbox(_)
                | MosaicError::Color(_)
                | MosaicError::BandOutOfRange { .. }
                | MosaicError::ProjectNotFound(_)
                | MosaicError::Store(StoreError::ExtentTooLarge { .. })
        )
    }
}

impl From<RasterError> for MosaicError {
    fn from(e: RasterError) -> Self {
        match e {
            RasterError::BandOutOfRange { band, band_count } => {
                MosaicError::BandOutOfRange { band, band_count }
            }
            RasterError::Encode(reason) => MosaicError::Encode(reason),
            other => MosaicError::Raster(other),
        }
    }
}
