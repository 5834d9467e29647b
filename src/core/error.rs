//! Error types for the pool, ingest, and CLI layers.

use thiserror::Error;

/// Top-level errors produced by `tsbench` components.
///
/// Startup errors (`Config`, `DatabaseOpen`) are fatal: the CLI fails fast
/// and exits non-zero. `Io` covers both opening the input file and a
/// mid-stream reader failure; ingest aborts submission but the pool is
/// still drained so already-submitted work is reported. `Render` only
/// ever comes from the report stage.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid pool or CLI configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Input file could not be opened, or the reader failed mid-stream.
    #[error("I/O error: {0}")]
    Io(String),
    /// The database could not be opened or failed its health check.
    #[error("database open error: {0}")]
    DatabaseOpen(String),
    /// The report formatter failed.
    #[error("render error: {0}")]
    Render(String),
}

/// An error produced by a single task's query, collected into the owning
/// worker's [`crate::core::WorkerResult`] rather than propagated.
///
/// Never fatal to the worker or the pool: a failed task is counted and
/// reported, not a crash.
#[derive(Debug, Error, Clone)]
#[error("query for host {host} [{start}, {end}) failed: {cause}")]
pub struct TaskError {
    /// The host the failing query targeted.
    pub host: String,
    /// The window start forwarded to the database client.
    pub start: String,
    /// The window end forwarded to the database client.
    pub end: String,
    /// The underlying failure, as text (kept `Clone` + `Send + Sync`
    /// independent of whatever error type the database client raised).
    pub cause: String,
}

impl TaskError {
    /// Build a `TaskError` from a host/window and any displayable cause.
    pub fn new(
        host: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        Self {
            host: host.into(),
            start: start.into(),
            end: end.into(),
            cause: cause.to_string(),
        }
    }
}
