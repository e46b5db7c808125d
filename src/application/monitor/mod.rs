//! Leader-only scheduled driver of the session state machine.

pub mod service;

pub use service::{MonitorHandle, PassReport, SessionMonitor};
