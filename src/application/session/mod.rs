//! Session state machine and lifecycle entry points.
//!
//! - [`machine`]: monitor-driven transitions (`ready`/`active`/`paused`)
//! - [`lifecycle`]: launches and client close / network-failure signals

pub mod lifecycle;
pub mod machine;

pub use lifecycle::{CloseOutcome, SessionLifecycle};
pub use machine::{Decision, MachineConfig, SessionMachine, StepOutcome};
