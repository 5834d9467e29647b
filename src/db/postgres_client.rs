//! A [`QueryClient`] backed by the synchronous `postgres` crate.

use std::thread;
use std::time::Duration;

use postgres::{Client, NoTls};
use tracing::warn;

use super::{QueryClient, UsageRow};

const QUERY: &str = "\
    SELECT time_bucket('1 minutes', ts) AS bucket, \
           MIN(usage) AS min_usage, MAX(usage) AS max_usage, host, COUNT(*) \
    FROM cpu_usage \
    WHERE host = $1 AND ts >= $2 AND ts <= $3 \
    GROUP BY bucket, host";

const HEALTH_CHECK_RETRIES: u32 = 10;
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// A TimescaleDB client. Each call takes its own lock over a shared
/// connection, since `postgres::Client` is not internally synchronized.
///
/// Mirrors `original_source/internal/db/connection.go`'s `Open`: connect,
/// then retry a ping up to [`HEALTH_CHECK_RETRIES`] times before giving
/// up, rather than failing on the first transient connection error.
pub struct PostgresQueryClient {
    client: parking_lot::Mutex<Client>,
}

impl PostgresQueryClient {
    /// Connect to `conn` and wait for the connection to become healthy.
    ///
    /// # Errors
    ///
    /// Returns the last connection error if the server never becomes
    /// reachable within the retry budget.
    pub fn connect(conn: &str) -> Result<Self, postgres::Error> {
        let mut client = Client::connect(conn, NoTls)?;
        check_health(&mut client)?;
        Ok(Self { client: parking_lot::Mutex::new(client) })
    }
}

impl QueryClient for PostgresQueryClient {
    fn query_usage(
        &self,
        host: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<UsageRow>, Box<dyn std::error::Error + Send + Sync>> {
        let mut client = self.client.lock();
        let rows = client.query(QUERY, &[&host, &start, &end])?;
        Ok(rows
            .iter()
            .map(|row| {
                let bucket: std::time::SystemTime = row.get(0);
                UsageRow {
                    interval: format!("{bucket:?}"),
                    min: row.get(1),
                    max: row.get(2),
                    host: row.get(3),
                    count: row.get(4),
                }
            })
            .collect())
    }
}

fn check_health(client: &mut Client) -> Result<(), postgres::Error> {
    let mut last_err = None;
    for attempt in 0..HEALTH_CHECK_RETRIES {
        match client.simple_query("SELECT 1") {
            Ok(_) => return Ok(()),
            Err(err) => {
                warn!(attempt, "database health check failed, retrying");
                last_err = Some(err);
                thread::sleep(HEALTH_CHECK_INTERVAL);
            }
        }
    }
    Err(last_err.expect("loop runs at least once since HEALTH_CHECK_RETRIES > 0"))
}
