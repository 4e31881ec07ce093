//! Store error types.

use thiserror::Error;

use super::LayerId;

/// Errors raised by attribute and tile stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("I/O error reading layer {layer}: {source}")]
    Io {
        layer: LayerId,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes could not be decoded.
    #[error("Failed to decode {what} for layer {layer}: {reason}")]
    Decode {
        layer: LayerId,
        what: String,
        reason: String,
    },

    /// The zoom level is not indexed for this layer.
    #[error("Layer {layer} has no zoom level {zoom}")]
    MissingZoom { layer: LayerId, zoom: u8 },

    /// The layer id cannot be used as a storage path.
    #[error("Invalid layer id: {0}")]
    InvalidLayerId(LayerId),

    /// Extent read would allocate an unreasonably large raster.
    #[error("Extent read of {cols}x{rows} pixels exceeds limit of {limit} per side")]
    ExtentTooLarge { cols: u64, rows: u64, limit: u32 },

    /// Backend-specific failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(layer: &LayerId, source: std::io::Error) -> Self {
        StoreError::Io {
            layer: layer.clone(),
            source,
        }
    }

    pub(crate) fn decode(layer: &LayerId, what: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Decode {
            layer: layer.clone(),
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}
