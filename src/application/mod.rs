//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the session lifecycle.

pub mod election;
pub mod monitor;
pub mod reconcile;
pub mod session;
