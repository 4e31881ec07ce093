//! Execution of blocking work off the async runtime.
//!
//! Store reads are synchronous. They run on a [`BlockingPool`] (a dedicated
//! rayon thread pool) and hand their results back to async callers over a
//! oneshot channel, so a slow disk never stalls the tokio workers that
//! drive request fan-out.

mod pool;

pub use pool::{BlockingPool, PoolError};
