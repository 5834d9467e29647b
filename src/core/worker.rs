//! A single worker thread: private + shared queues, key claims, results.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::task::Task;
use crate::core::worker_result::WorkerResult;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next worker id.
///
/// A monotonic counter rather than a clock read: `original_source`'s
/// `time.Now().Nanosecond()` can collide for workers started in the same
/// tick (spec.md §9, "Worker identity").
fn next_worker_id() -> u64 {
    NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A handle to a running worker thread, held by the dispatcher.
///
/// The worker's claimed-key set is reachable (and safe to query
/// concurrently) via [`WorkerHandle::has_key`] without perturbing the
/// worker thread itself; [`WorkerHandle::claim`] and
/// [`WorkerHandle::enqueue`] are the dispatcher's means of routing a task
/// here.
pub(crate) struct WorkerHandle {
    id: u64,
    claimed: Arc<Mutex<HashSet<String>>>,
    private_tx: Sender<Task>,
    join: Mutex<Option<JoinHandle<WorkerResult>>>,
}

impl WorkerHandle {
    /// Spawn a new worker thread, cloning `shared_rx` so it can observe
    /// both the pool-wide shutdown signal and (structurally) the shared
    /// queue.
    pub(crate) fn spawn(worker_queue_size: usize, shared_rx: Receiver<Task>) -> Self {
        let id = next_worker_id();
        let claimed = Arc::new(Mutex::new(HashSet::new()));
        let claimed_for_thread = Arc::clone(&claimed);
        let (private_tx, private_rx) = bounded(worker_queue_size);

        let join = thread::Builder::new()
            .name(format!("tsbench-worker-{id}"))
            .spawn(move || worker_loop(id, private_rx, shared_rx, claimed_for_thread))
            .expect("failed to spawn worker thread");

        debug!(worker_id = id, "worker started");

        Self {
            id,
            claimed,
            private_tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// This worker's id.
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Whether this worker has already claimed `key`.
    ///
    /// Safe to call concurrently with the worker thread's own mutation of
    /// its claimed-key set (guarded by the same mutex).
    pub(crate) fn has_key(&self, key: &str) -> bool {
        self.claimed.lock().contains(key)
    }

    /// Claim `key` on this worker's behalf, without waiting for the
    /// worker to observe a task for it. Used by the dispatcher to close
    /// the claim-visibility race described in spec.md §9 (mitigation a).
    pub(crate) fn claim(&self, key: &str) {
        self.claimed.lock().insert(key.to_string());
    }

    /// Enqueue a task onto this worker's private queue. Blocks if full.
    pub(crate) fn enqueue(&self, task: Task) {
        // The receiver only disappears if the worker thread panicked and
        // unwound, dropping `private_rx`; there is nothing further to do
        // with the task in that case other than drop it with the sender.
        let _ = self.private_tx.send(task);
    }

    /// Block until this worker is terminal and return its final result.
    ///
    /// Idempotent: calling `wait` more than once after the first join
    /// returns a fresh empty result rather than panicking, since the
    /// `JoinHandle` can only be consumed once.
    pub(crate) fn wait(&self) -> WorkerResult {
        let handle = self.join.lock().take();
        match handle {
            Some(h) => h.join().unwrap_or_else(|_| {
                warn!(worker_id = self.id, "worker thread panicked");
                WorkerResult::new(self.id)
            }),
            None => WorkerResult::new(self.id),
        }
    }
}

/// The priority-select execution loop (spec.md §4.3).
///
/// 1. Non-blocking attempt on the private queue first, so a claimed-key
///    task is never starved by the shared queue.
/// 2. Otherwise, block on either queue, whichever arrives first.
/// 3. On shared-queue disconnect (pool shutdown), drain whatever is left
///    in the private queue and stop — by construction (the dispatcher
///    only closes the shared queue after the wait queue has fully
///    drained) nothing more will ever be privately enqueued here.
fn worker_loop(
    id: u64,
    private_rx: Receiver<Task>,
    shared_rx: Receiver<Task>,
    claimed: Arc<Mutex<HashSet<String>>>,
) -> WorkerResult {
    let mut result = WorkerResult::new(id);

    loop {
        match private_rx.try_recv() {
            Ok(task) => {
                run_task(id, &mut result, task);
                continue;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        select! {
            recv(private_rx) -> msg => match msg {
                Ok(task) => run_task(id, &mut result, task),
                Err(_) => break,
            },
            recv(shared_rx) -> msg => match msg {
                Ok(task) => {
                    // Reached only if some future caller routes a task
                    // through the shared queue; claim before executing so
                    // the claim is visible the moment this worker resumes
                    // polling (spec.md §4.3).
                    claimed.lock().insert(task.route_key().to_string());
                    run_task(id, &mut result, task);
                }
                Err(_) => {
                    while let Ok(task) = private_rx.try_recv() {
                        run_task(id, &mut result, task);
                    }
                    break;
                }
            },
        }
    }

    debug!(worker_id = id, completed = result.completed, "worker terminated");
    // Take the snapshot here, at the moment of publication, rather than
    // handing the live accumulator to the pool (spec.md §4.2).
    result.snapshot()
}

fn run_task(id: u64, result: &mut WorkerResult, task: Task) {
    let t0 = Instant::now();
    let outcome = task.execute();
    let duration = t0.elapsed();
    if let Err(ref err) = outcome {
        warn!(worker_id = id, host = %err.host, cause = %err.cause, "task failed");
    }
    result.record(duration, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TaskError;
    use std::time::Duration;

    #[test]
    fn claim_and_has_key_round_trip() {
        let (_tx, rx) = bounded::<Task>(0);
        let handle = WorkerHandle::spawn(4, rx);
        assert!(!handle.has_key("h1"));
        handle.claim("h1");
        assert!(handle.has_key("h1"));
        drop(handle);
    }

    #[test]
    fn enqueue_and_wait_runs_the_task() {
        let (_shared_tx, shared_rx) = bounded::<Task>(0);
        let handle = WorkerHandle::spawn(4, shared_rx);
        handle.claim("h1");
        handle.enqueue(Task::new("h1", || {
            std::thread::sleep(Duration::from_millis(1));
            Ok(())
        }));
        drop(_shared_tx);
        let result = handle.wait();
        assert_eq!(result.completed, 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn failed_task_is_collected_not_fatal() {
        let (_shared_tx, shared_rx) = bounded::<Task>(0);
        let handle = WorkerHandle::spawn(4, shared_rx);
        handle.claim("h1");
        handle.enqueue(Task::new("h1", || Err(TaskError::new("h1", "a", "b", "boom"))));
        handle.enqueue(Task::new("h1", || Ok(())));
        drop(_shared_tx);
        let result = handle.wait();
        assert_eq!(result.completed, 2);
        assert_eq!(result.errors.len(), 1);
    }
}
