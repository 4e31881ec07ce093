//! TileMosaic - composited raster mosaics from tiled scene pyramids
//!
//! A project is an ordered list of scenes, each a tiled multi-zoom raster
//! pyramid held in a layer store. This library renders a project either as
//! one XYZ web-map tile or over an arbitrary bounding box, merging the
//! scenes and optionally applying a shared colour ramp derived from the
//! scenes' band histograms.
//!
//! # Layout
//!
//! - [`store`]: layer metadata and tile storage (in-memory and filesystem)
//! - [`cache`]: cache-aside reads over the stores, backed by moka
//! - [`executor`]: the blocking pool store reads run on
//! - [`mosaic`]: metadata resolution, zoom fallback, extent reads, compositing
//! - [`color`]: colour ramp construction and rendering
//! - [`app`]: service wiring for embedding in a server or CLI
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilemosaic::app::{MosaicConfig, MosaicService};
//! use tilemosaic::project::MemoryProjectStore;
//! use tilemosaic::store::FsLayerStore;
//!
//! let store = Arc::new(FsLayerStore::new("/data/layers"));
//! let projects = Arc::new(MemoryProjectStore::new());
//! let service = MosaicService::with_layer_store(&MosaicConfig::default(), store, projects)?;
//!
//! if let Some(tile) = service.render_pixel("project-1", 10, 512, 384).await? {
//!     std::fs::write("tile.png", tile.encode_png()?)?;
//! }
//! ```

pub mod app;
pub mod cache;
pub mod color;
pub mod config;
pub mod coord;
pub mod executor;
pub mod logging;
pub mod mosaic;
pub mod project;
pub mod raster;
pub mod store;

pub use app::{MosaicConfig, MosaicService};
pub use mosaic::{FetchResult, MosaicError};
pub use raster::Tile;
