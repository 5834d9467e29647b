//! Aggregate per-worker results into a single benchmark summary.

use std::time::Duration;

use crate::core::error::TaskError;
use crate::core::worker_result::WorkerResult;

/// The aggregated outcome of a full benchmark run (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct BenchmarkSummary {
    /// Number of workers the pool started for this run.
    pub workers_started: u32,
    /// Wall-clock time from dispatch to drain, as measured by the caller.
    pub runtime: Duration,
    /// Total tasks completed (successful and failed) across all workers.
    pub completed: u64,
    /// Number of completed tasks whose thunk returned an error.
    pub errored: u64,
    /// Sum of every worker's `total_duration`.
    pub total_query_time: Duration,
    /// Fastest single task duration observed, or zero if none completed.
    pub min_query_time: Duration,
    /// Slowest single task duration observed, or zero if none completed.
    pub max_query_time: Duration,
    /// Median task duration, or zero if none completed.
    pub median_query_time: Duration,
    /// Mean task duration, or zero if none completed.
    pub avg_query_time: Duration,
    /// Every per-task error collected from every worker, in no particular
    /// cross-worker order.
    pub errors: Vec<TaskError>,
}

/// Combine every worker's [`WorkerResult`] into one [`BenchmarkSummary`],
/// given the wall-clock `runtime` the caller measured around
/// `dispatch()`/`submit`/`wait()`.
///
/// The median is computed from the pooled list of every individual task
/// duration across all workers, sorted once. `original_source`'s
/// aggregator only ever tracked running min/max; the median formula here
/// branches on the sorted sequence's length parity (even: average the two
/// middle values; odd: take the middle value) rather than on the parity
/// of an index into the unsorted sequence, which was a bug in the source
/// (spec.md §9). An empty `durations` list yields the zero duration for
/// all four statistics (spec.md §4.5/§8 invariant 7), not an absent value.
#[must_use]
pub fn summarize(results: &[WorkerResult], runtime: Duration) -> BenchmarkSummary {
    let workers_started = u32::try_from(results.len()).unwrap_or(u32::MAX);
    let completed: u64 = results.iter().map(|r| r.completed).sum();
    let errors: Vec<TaskError> = results.iter().flat_map(|r| r.errors.iter().cloned()).collect();
    let errored = errors.len() as u64;
    let total_query_time: Duration = results.iter().map(|r| r.total_duration).sum();

    let mut durations: Vec<Duration> = results.iter().flat_map(|r| r.task_durations.iter().copied()).collect();
    durations.sort_unstable();

    let min_query_time = durations.first().copied().unwrap_or(Duration::ZERO);
    let max_query_time = durations.last().copied().unwrap_or(Duration::ZERO);
    let median_query_time = median(&durations);
    let avg_query_time = mean(&durations);

    BenchmarkSummary {
        workers_started,
        runtime,
        completed,
        errored,
        total_query_time,
        min_query_time,
        max_query_time,
        median_query_time,
        avg_query_time,
        errors,
    }
}

/// `sorted` must already be sorted ascending. Zero for an empty input.
fn median(sorted: &[Duration]) -> Duration {
    let len = sorted.len();
    if len == 0 {
        return Duration::ZERO;
    }
    if len % 2 == 1 {
        sorted[len / 2]
    } else {
        let lo = sorted[len / 2 - 1];
        let hi = sorted[len / 2];
        (lo + hi) / 2
    }
}

/// Zero for an empty input.
fn mean(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    let total: Duration = durations.iter().sum();
    total / u32::try_from(durations.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(worker_id: u64, millis: &[u64]) -> WorkerResult {
        let mut result = WorkerResult::new(worker_id);
        for &m in millis {
            result.record(Duration::from_millis(m), Ok(()));
        }
        result
    }

    #[test]
    fn empty_input_yields_zero_durations() {
        let summary = summarize(&[], Duration::ZERO);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.workers_started, 0);
        assert_eq!(summary.min_query_time, Duration::ZERO);
        assert_eq!(summary.max_query_time, Duration::ZERO);
        assert_eq!(summary.median_query_time, Duration::ZERO);
        assert_eq!(summary.avg_query_time, Duration::ZERO);
    }

    #[test]
    fn odd_count_median_is_the_middle_value() {
        let results = vec![result_with(1, &[1, 5, 3])];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.median_query_time, Duration::from_millis(3));
        assert_eq!(summary.min_query_time, Duration::from_millis(1));
        assert_eq!(summary.max_query_time, Duration::from_millis(5));
    }

    #[test]
    fn even_count_median_averages_the_two_middle_values() {
        let results = vec![result_with(1, &[1, 2]), result_with(2, &[3, 4])];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(
            summary.median_query_time,
            Duration::from_millis(2) + Duration::from_millis(1) / 2
        );
        assert_eq!(summary.completed, 4);
        assert_eq!(summary.workers_started, 2);
    }

    #[test]
    fn mean_is_sum_over_count() {
        let results = vec![result_with(1, &[2, 4, 6])];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.avg_query_time, Duration::from_millis(4));
    }

    #[test]
    fn total_query_time_sums_every_worker() {
        let results = vec![result_with(1, &[2, 4]), result_with(2, &[6])];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.total_query_time, Duration::from_millis(12));
    }

    #[test]
    fn errors_are_pooled_across_workers() {
        let mut r1 = result_with(1, &[1]);
        r1.record(Duration::from_millis(1), Err(TaskError::new("h1", "a", "b", "boom")));
        let r2 = result_with(2, &[2]);
        let summary = summarize(&[r1, r2], Duration::ZERO);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.completed, 3);
    }

    #[test]
    fn workers_started_counts_every_worker_regardless_of_activity() {
        let results = vec![WorkerResult::new(1), result_with(2, &[1])];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.workers_started, 2);
    }

    #[test]
    fn runtime_is_passed_through_unchanged() {
        let summary = summarize(&[], Duration::from_secs(3));
        assert_eq!(summary.runtime, Duration::from_secs(3));
    }
}
