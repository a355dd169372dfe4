//! PhotoGlow Background Removal
//!
//! Cuts the subject out of a photo by running an external segmentation
//! tool. The tool runs on a dedicated worker thread; callers talk to it
//! only through request/reply messages, so a slow or crashing model never
//! blocks the editor.

pub mod bridge;
pub mod remover;

pub use bridge::*;
pub use remover::*;
