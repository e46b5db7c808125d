//! Application orchestration.
//!
//! Runtime wiring and lifecycle management.

pub mod health;
pub mod runtime;

pub use health::{health_check, HealthCheck, HealthReport, HealthStatus};
pub use runtime::{run, run_with_shutdown, Administrator, Services};
