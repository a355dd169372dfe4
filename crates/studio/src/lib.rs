//! PhotoGlow Studio
//!
//! The controller front ends talk to. It owns the session store, drives the
//! playback sink, guards long-running work, and turns every outcome into a
//! user-facing [`Notice`].

pub mod busy;
pub mod notice;
pub mod studio;

pub use busy::*;
pub use notice::*;
pub use studio::*;
