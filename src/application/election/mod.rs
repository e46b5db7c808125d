//! Presence-based leader election.
//!
//! Every connected administrator process watches the same membership
//! broadcast and independently computes the same leader: the
//! lexicographically smallest admin id. There is no lock or lease; the
//! store-level compare-and-swap on session status covers the short window in
//! which two processes may both believe they lead.
//!
//! - [`coordinator`]: leadership state of one process

pub mod coordinator;

pub use coordinator::{is_leader, ElectionHandle, LeaderElection};
