//! PhotoGlow Common Utilities
//!
//! Shared infrastructure for all PhotoGlow crates:
//! - Error types, error taxonomy, and result aliases
//! - Clock helpers for export file naming
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
