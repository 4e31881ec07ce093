//! Service assembly.
//!
//! [`MosaicService`] builds the shared pieces once (moka cache, blocking
//! pool, cached reader, compositor) and serves renders by project id.
//!
//! ```text
//! ┌──────────────────────────── MosaicService ───────────────────────────┐
//! │                                                                      │
//! │  ProjectProvider ──► Project ──► Compositor                          │
//! │                                     │                                │
//! │                                     ▼                                │
//! │  MemoryCacheProvider ◄──── CachedLayerReader ────► BlockingPool      │
//! │                                                        │             │
//! │                                              AttributeStore/TileStore│
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{MemoryCacheAppConfig, MosaicConfig};
pub use error::AppError;
pub use service::MosaicService;
