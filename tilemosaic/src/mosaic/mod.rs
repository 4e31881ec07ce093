//! Mosaic tile composition.
//!
//! ```text
//! Compositor ──► TileFetcher / ExtentFetcher ──► MetadataResolver
//!     │                   │                            │
//!     ▼                   └────────► CachedLayerReader ◄┘
//! colorize                                │
//!                                   BlockingPool ──► stores
//! ```
//!
//! Every lookup that can legitimately find nothing returns
//! [`FetchResult`]: `Ok(None)` is "no content", errors are
//! [`MosaicError`].

mod bbox;
mod compositor;
mod error;
mod extent;
mod fetch;
mod resolver;

pub use bbox::parse_bbox;
pub use compositor::Compositor;
pub use error::{BboxParseError, FetchResult, MosaicError};
pub use extent::ExtentFetcher;
pub use fetch::TileFetcher;
pub use resolver::{MetadataResolver, ResolvedLayer};
