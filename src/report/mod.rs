//! Benchmark report rendering.

use std::fmt::Write as _;

use crate::core::BenchmarkSummary;

/// Render a [`BenchmarkSummary`] as a human-readable report, in the
/// spirit of `original_source/cmd/main.go`'s `printPoolResult`.
#[must_use]
pub fn render(summary: &BenchmarkSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "workers started: {}", summary.workers_started);
    let _ = writeln!(out, "runtime:         {:?}", summary.runtime);
    let _ = writeln!(out, "tasks completed: {}", summary.completed);
    let _ = writeln!(out, "tasks failed:    {}", summary.errored);
    let _ = writeln!(out, "total query time: {:?}", summary.total_query_time);
    let _ = writeln!(out, "min query time:  {:?}", summary.min_query_time);
    let _ = writeln!(out, "max query time:  {:?}", summary.max_query_time);
    let _ = writeln!(out, "median query time: {:?}", summary.median_query_time);
    let _ = writeln!(out, "avg query time:  {:?}", summary.avg_query_time);
    if !summary.errors.is_empty() {
        let _ = writeln!(out, "\nerrors:");
        for err in &summary.errors {
            let _ = writeln!(out, "  - {err}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{summarize, WorkerResult};
    use std::time::Duration;

    #[test]
    fn renders_counts_and_timings() {
        let mut result = WorkerResult::new(1);
        result.record(Duration::from_millis(5), Ok(()));
        let summary = summarize(&[result], Duration::from_millis(10));
        let report = render(&summary);
        assert!(report.contains("workers started: 1"));
        assert!(report.contains("tasks completed: 1"));
        assert!(report.contains("tasks failed:    0"));
        assert!(report.contains("runtime:         10ms"));
    }

    #[test]
    fn renders_zero_durations_when_nothing_completed() {
        let summary = summarize(&[], Duration::ZERO);
        let report = render(&summary);
        assert!(report.contains("min query time:  0ns"));
    }

    #[test]
    fn renders_errors_when_present() {
        let mut result = WorkerResult::new(1);
        result.record(
            Duration::from_millis(1),
            Err(crate::core::TaskError::new("h1", "a", "b", "boom")),
        );
        let summary = summarize(&[result], Duration::ZERO);
        let report = render(&summary);
        assert!(report.contains("tasks failed:    1"));
        assert!(report.contains("errors:"));
        assert!(report.contains("boom"));
    }
}
