//! Database client contract and a Postgres/TimescaleDB implementation.

mod postgres_client;

pub use postgres_client::PostgresQueryClient;

/// One bucketed row of the min/max-usage-per-minute query.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    /// The start of the one-minute bucket, as returned by the database.
    pub interval: String,
    /// Minimum `usage` observed in the bucket.
    pub min: f64,
    /// Maximum `usage` observed in the bucket.
    pub max: f64,
    /// The host the bucket belongs to.
    pub host: String,
    /// Number of samples in the bucket.
    pub count: i64,
}

/// A synchronous, thread-safe client for the benchmark's read query.
///
/// Synchronous because every task closure submitted to
/// [`crate::core::Pool`] runs on a plain OS thread with no async runtime;
/// implementors must tolerate concurrent calls from every worker thread
/// (spec.md's "Database client" module: "Synchronous. Thread-safe.").
pub trait QueryClient: Send + Sync {
    /// Run the min/max-usage-per-minute query for `host` over
    /// `[start, end)` and return one row per one-minute bucket.
    ///
    /// # Errors
    ///
    /// Returns a boxed error on any query or connection failure; the
    /// caller wraps it into a [`crate::core::TaskError`] rather than
    /// treating it as pool-fatal.
    fn query_usage(
        &self,
        host: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<UsageRow>, Box<dyn std::error::Error + Send + Sync>>;
}
