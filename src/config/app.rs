//! Command-line configuration surface.

use std::path::PathBuf;

use clap::Parser;

use crate::core::error::BenchError;

use super::PoolConfig;

/// `tsbench` benchmarks read-query latency/throughput against a
/// time-series database by replaying a workload described in a CSV file.
///
/// Mirrors the flags of `original_source/cmd/main.go` plus the additional
/// knobs `internal/config/config.go` validates (`reader_buffer_size`,
/// `database_connection_string`).
#[derive(Debug, Parser)]
#[command(name = "tsbench", about = "Benchmark time-series read queries against a routed worker pool")]
pub struct AppConfig {
    /// Path to the CSV workload file (header row, then `host,start,end` columns).
    pub input_file: PathBuf,

    /// Max number of concurrent worker threads.
    #[arg(short = 'm', long, default_value_t = 1)]
    pub max_workers: usize,

    /// Size of each worker's private task queue.
    #[arg(long, default_value_t = 1000)]
    pub worker_queue_size: usize,

    /// Size of the pool's wait queue.
    #[arg(long, default_value_t = 1000)]
    pub wait_queue_size: usize,

    /// Size of the row reader's buffered channel.
    #[arg(long, default_value_t = 1000)]
    pub reader_buffer_size: usize,

    /// Database connection string (also read from `DATABASE_URL` via `.env`).
    #[arg(long, env = "DATABASE_URL")]
    pub database_connection_string: String,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl AppConfig {
    /// Validate CLI-level invariants not already enforced by `clap`:
    /// positive capacities and a non-empty connection string.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), BenchError> {
        self.pool_config().validate()?;
        if self.reader_buffer_size == 0 {
            return Err(BenchError::Config("reader_buffer_size must be at least 1".into()));
        }
        if self.database_connection_string.trim().is_empty() {
            return Err(BenchError::Config("database_connection_string must not be empty".into()));
        }
        Ok(())
    }

    /// Extract the pool-sizing subset of this configuration.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_workers: self.max_workers,
            worker_queue_size: self.worker_queue_size,
            wait_queue_size: self.wait_queue_size,
        }
    }
}
