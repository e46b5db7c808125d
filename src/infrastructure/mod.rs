//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Adapter construction for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`orchestration`] - Composition root, runtime lifecycle and health

pub mod bootstrap;
pub mod config;
pub mod orchestration;
