//! Bounded thread pool for blocking store reads.

use std::any::Any;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Errors raised by the blocking pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The rayon pool could not be built.
    #[error("Failed to build blocking pool '{label}': {reason}")]
    Build { label: String, reason: String },

    /// A job ended without producing a result (it panicked).
    #[error("Blocking pool '{label}' dropped a job before it completed")]
    JobDropped { label: String },
}

/// Dedicated rayon pool whose results are awaited from async code.
///
/// The pool is sized once at construction and is independent of the tokio
/// runtime. Share it by wrapping in an `Arc`.
pub struct BlockingPool {
    pool: rayon::ThreadPool,
    threads: usize,
    label: String,
}

impl BlockingPool {
    /// Build a pool with `threads` worker threads.
    pub fn new(threads: usize, label: impl Into<String>) -> Result<Self, PoolError> {
        let label = label.into();
        let threads = threads.max(1);

        let name_prefix = label.clone();
        let panic_label = label.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{}-{}", name_prefix, i))
            .panic_handler(move |payload| {
                error!(
                    label = %panic_label,
                    panic = %panic_message(payload.as_ref()),
                    "Blocking job panicked"
                );
            })
            .build()
            .map_err(|e| PoolError::Build {
                label: label.clone(),
                reason: e.to_string(),
            })?;

        info!(threads, label = %label, "Created blocking pool");

        Ok(Self {
            pool,
            threads,
            label,
        })
    }

    /// Build a pool sized from the available CPUs.
    pub fn with_defaults(label: impl Into<String>) -> Result<Self, PoolError> {
        Self::new(Self::default_threads(), label)
    }

    /// Default thread count: CPUs with modest over-subscription, since
    /// store reads spend part of their time waiting on I/O.
    pub fn default_threads() -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        ((cpus as f64 * 1.25).ceil() as usize).max(cpus + 2)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run `job` on the pool and await its result.
    ///
    /// A job that panics is reported as [`PoolError::JobDropped`].
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            // Receiver gone means the caller stopped waiting
            let _ = tx.send(job());
        });
        rx.await.map_err(|_| PoolError::JobDropped {
            label: self.label.clone(),
        })
    }
}

impl std::fmt::Debug for BlockingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingPool")
            .field("threads", &self.threads)
            .field("label", &self.label)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_returns_result() {
        let pool = BlockingPool::new(2, "test").unwrap();
        let value = pool.run(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_zero_threads_rounds_up() {
        let pool = BlockingPool::new(0, "test").unwrap();
        assert_eq!(pool.threads(), 1);
        assert_eq!(pool.run(|| "ok").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_jobs_run_off_runtime_thread() {
        let pool = BlockingPool::new(1, "named").unwrap();
        let name = pool
            .run(|| std::thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("named-0"));
    }

    #[tokio::test]
    async fn test_panicking_job_is_dropped() {
        let pool = BlockingPool::new(1, "panicky").unwrap();
        let result: Result<(), _> = pool.run(|| panic!("boom")).await;
        assert_eq!(
            result,
            Err(PoolError::JobDropped {
                label: "panicky".to_string()
            })
        );

        // Pool survives the panic
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_jobs() {
        let pool = Arc::new(BlockingPool::new(4, "fanout").unwrap());
        let handles: Vec<_> = (0..16u64)
            .map(|i| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move { pool.run(move || i * i).await })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap();
        }
        assert_eq!(total, (0..16u64).map(|i| i * i).sum::<u64>());
    }

    #[test]
    fn test_default_threads_oversubscribes() {
        assert!(BlockingPool::default_threads() >= 3);
    }
}
