//! Pool sizing configuration.

use serde::{Deserialize, Serialize};

use crate::core::error::BenchError;

/// The three capacities that fully determine a [`crate::core::Pool`]'s
/// resource usage, fixed at construction time (spec: no dynamic
/// reconfiguration).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of worker threads the dispatcher will start.
    pub max_workers: usize,
    /// Capacity of each worker's private (claimed-key) queue.
    pub worker_queue_size: usize,
    /// Capacity of the pool's wait queue (the producer-facing buffer).
    pub wait_queue_size: usize,
}

impl PoolConfig {
    /// Validate that every capacity is at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.max_workers == 0 {
            return Err(BenchError::Config("max_workers must be at least 1".into()));
        }
        if self.worker_queue_size == 0 {
            return Err(BenchError::Config("worker_queue_size must be at least 1".into()));
        }
        if self.wait_queue_size == 0 {
            return Err(BenchError::Config("wait_queue_size must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Mirrors `original_source/cmd/main.go`'s defaults: a single worker
    /// with generously sized queues.
    fn default() -> Self {
        Self {
            max_workers: 1,
            worker_queue_size: 1000,
            wait_queue_size: 1000,
        }
    }
}
