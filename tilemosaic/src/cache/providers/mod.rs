//! Cache provider implementations.
//!
//! - [`MemoryCacheProvider`]: in-memory, size-bounded cache backed by moka

mod memory;

pub use memory::MemoryCacheProvider;
