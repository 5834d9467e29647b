//! CLI entry point: parse args, run the benchmark, print the report.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::select;
use tracing::{error, info, warn};

use tsbench::config::AppConfig;
use tsbench::core::{summarize, Pool, Task, TaskError};
use tsbench::db::{PostgresQueryClient, QueryClient};
use tsbench::reader::{read_file, WorkloadRow};
use tsbench::report;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = AppConfig::parse();
    tsbench::util::init_tracing(config.debug);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "tsbench exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let client: Arc<dyn QueryClient> = Arc::new(
        PostgresQueryClient::connect(&config.database_connection_string)
            .context("failed to connect to the database")?,
    );

    let pool = Pool::new(config.pool_config()).context("failed to construct worker pool")?;
    let clock = std::time::Instant::now();
    pool.dispatch();

    let (rows, parse_errors) = read_file(&config.input_file, config.reader_buffer_size)
        .with_context(|| format!("failed to open input file {}", config.input_file.display()))?;

    let mut submitted = 0usize;
    let mut watch_errors = true;
    loop {
        if watch_errors {
            select! {
                recv(rows) -> msg => match msg {
                    Ok(row) => submit_row(&pool, &client, row, &mut submitted),
                    Err(_) => break,
                },
                recv(parse_errors) -> msg => match msg {
                    Ok(err) => {
                        warn!(error = %err, submitted, "aborting ingest after a malformed workload row");
                        break;
                    }
                    Err(_) => watch_errors = false,
                },
            }
        } else {
            match rows.recv() {
                Ok(row) => submit_row(&pool, &client, row, &mut submitted),
                Err(_) => break,
            }
        }
    }

    info!(submitted, "ingest finished, draining pool");
    let results = pool.wait();
    let runtime = clock.elapsed();
    let summary = summarize(&results, runtime);
    println!("{}", report::render(&summary));

    Ok(())
}

fn submit_row(pool: &Pool, client: &Arc<dyn QueryClient>, row: WorkloadRow, submitted: &mut usize) {
    let host = row.host.clone();
    let client = Arc::clone(client);
    let start = row.start.clone();
    let end = row.end.clone();
    pool.submit(Task::new(row.host, move || {
        client
            .query_usage(&host, &start, &end)
            .map(|_rows| ())
            .map_err(|err| TaskError::new(host.clone(), start.clone(), end.clone(), err))
    }));
    *submitted += 1;
}
