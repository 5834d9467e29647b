//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Install a default env-based subscriber if none is set.
///
/// `debug` lowers the default filter to `debug` level when `RUST_LOG` is
/// unset; an explicit `RUST_LOG` always wins. A subscriber already
/// installed by the caller (or by a test harness) is left untouched.
pub fn init_tracing(debug: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
