//! Configuration models for the pool and the command-line surface.

pub mod app;
pub mod pool;

pub use app::AppConfig;
pub use pool::PoolConfig;
