//! Tabular (CSV) row reader feeding the ingest loop.

use std::fs::File;
use std::io::Read as _;
use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use crate::core::error::BenchError;

/// One workload row: a host and the `[start, end)` query window to
/// benchmark for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRow {
    /// Route key / host column.
    pub host: String,
    /// Inclusive window start, as the raw column text.
    pub start: String,
    /// Exclusive window end, as the raw column text.
    pub end: String,
}

/// Spawn a producer thread that streams `host,start,end` rows from
/// `source`, skipping the header, onto a bounded channel of size
/// `buffer_size`. A second channel carries row-level failures — both a
/// malformed CSV record and a structurally short row (missing one of
/// `host`/`start`/`end`) are reported as a [`BenchError::Io`] — so the
/// ingest loop has a single signal to abort submission on, mirroring
/// `original_source/internal/csv/reader.go`'s two-channel shape.
///
/// The row channel closes when the source is exhausted or a read fails
/// fatally (e.g. malformed UTF-8 partway through the file).
#[must_use]
pub fn read<R: std::io::Read + Send + 'static>(
    source: R,
    buffer_size: usize,
) -> (Receiver<WorkloadRow>, Receiver<BenchError>) {
    let (row_tx, row_rx) = bounded(buffer_size);
    let (err_tx, err_rx) = bounded(buffer_size);

    thread::Builder::new()
        .name("tsbench-reader".to_string())
        .spawn(move || {
            let mut csv_reader =
                csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(source);
            for record in csv_reader.records() {
                match record {
                    Ok(record) => match parse_row(&record) {
                        Some(row) => {
                            if row_tx.send(row).is_err() {
                                break;
                            }
                        }
                        None => {
                            let err = BenchError::Io(format!("workload row missing a required column: {record:?}"));
                            if err_tx.send(err).is_err() {
                                break;
                            }
                        }
                    },
                    Err(err) => {
                        if err_tx.send(BenchError::Io(err.to_string())).is_err() {
                            break;
                        }
                    }
                }
            }
        })
        .expect("failed to spawn reader thread");

    (row_rx, err_rx)
}

/// Open `path` and stream its rows the same way as [`read`].
///
/// # Errors
///
/// Returns an I/O error if `path` cannot be opened.
pub fn read_file(path: &Path, buffer_size: usize) -> std::io::Result<(Receiver<WorkloadRow>, Receiver<BenchError>)> {
    let file = File::open(path)?;
    Ok(read(file, buffer_size))
}

fn parse_row(record: &csv::StringRecord) -> Option<WorkloadRow> {
    Some(WorkloadRow {
        host: record.get(0)?.to_string(),
        start: record.get(1)?.to_string(),
        end: record.get(2)?.to_string(),
    })
}
