//! The unit of work submitted to the pool.

use crate::core::error::TaskError;

/// A single query submission, tagged with the host it targets.
///
/// `Task` is immutable once built and has no identity of its own —
/// duplicate tasks (same route key, same closure) are perfectly legal and
/// common (a workload replaying many windows for one host submits many
/// `Task`s with the same `route_key`).
///
/// The `run` closure is invoked exactly once, on whichever worker thread
/// claims `route_key`. It must not share mutable state with closures
/// belonging to a different route key without its own synchronization —
/// the pool only guarantees serialization *within* a route key, never
/// across workers.
pub struct Task {
    route_key: String,
    run: Box<dyn FnOnce() -> Result<(), TaskError> + Send>,
}

impl Task {
    /// Build a task for `route_key` from a closure returning success or a
    /// [`TaskError`].
    ///
    /// # Panics
    ///
    /// Does not panic itself, but an empty `route_key` violates the pool's
    /// data model (spec: "non-empty") and callers should not construct one;
    /// the pool does not validate this at submission time since the
    /// dispatcher treats the key as an opaque string.
    pub fn new(
        route_key: impl Into<String>,
        run: impl FnOnce() -> Result<(), TaskError> + Send + 'static,
    ) -> Self {
        Self {
            route_key: route_key.into(),
            run: Box::new(run),
        }
    }

    /// The route key this task will be dispatched under.
    #[must_use]
    pub fn route_key(&self) -> &str {
        &self.route_key
    }

    /// Consume the task, running its closure and returning the outcome.
    pub(crate) fn execute(self) -> Result<(), TaskError> {
        (self.run)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("route_key", &self.route_key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_runs_the_closure_exactly_once() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls2 = calls.clone();
        let task = Task::new("h1", move || {
            calls2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(task.route_key(), "h1");
        task.execute().unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn execute_propagates_task_error() {
        let task = Task::new("h1", || Err(TaskError::new("h1", "a", "b", "boom")));
        let err = task.execute().unwrap_err();
        assert_eq!(err.host, "h1");
        assert_eq!(err.cause, "boom");
    }
}
