//! # tsbench
//!
//! A latency/throughput benchmarking tool for time-series database read
//! queries, replaying a workload described in a tabular input file.
//!
//! The interesting part of this crate is [`core::Pool`]: a bounded,
//! back-pressured, key-affinity task scheduler. Tasks that share a *route
//! key* (a hostname, in the benchmarking workload this crate drives) are
//! always executed by the same worker, while tasks with distinct keys run
//! concurrently across a lazily-grown pool of worker threads.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tsbench::config::PoolConfig;
//! use tsbench::core::{Pool, Task};
//!
//! let config = PoolConfig {
//!     max_workers: 4,
//!     worker_queue_size: 100,
//!     wait_queue_size: 100,
//! };
//! let pool = Pool::new(config).expect("valid config");
//! pool.dispatch();
//!
//! pool.submit(Task::new("host-1", || {
//!     std::thread::sleep(Duration::from_millis(1));
//!     Ok(())
//! }));
//!
//! let results = pool.wait();
//! assert_eq!(results.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Core scheduling abstractions: tasks, workers, the dispatcher, and the
/// statistics aggregator.
pub mod core;
/// Configuration models for the pool and the command-line surface.
pub mod config;
/// Database client contract and a Postgres/TimescaleDB implementation.
pub mod db;
/// Tabular (CSV) row reader feeding the ingest loop.
pub mod reader;
/// Benchmark report rendering.
pub mod report;
/// Shared utilities (logging setup).
pub mod util;
