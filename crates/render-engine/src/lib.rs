//! PhotoGlow Render Engine
//!
//! Turns an edit session into a shareable clip: the filtered still is
//! rasterized at native size, the selected track is downloaded, and an
//! encoding engine loops the still over the audio.
//!
//! # Pipeline Architecture
//!
//! ```text
//! current image ──┐
//!                 ├── Rasterize (brightness/contrast/saturate/blur)
//! filters ────────┘         │
//!                           ├── Encode (H.264, yuv420p, even size, ≤15s)
//! track url ── Fetch ───────┘         │
//!                                     ▼
//!                          <output_dir>/Status_<millis>.mp4
//! ```
//!
//! The engine is loaded once in the background; [`EngineGate`] tells the
//! pipeline whether it may start.

pub mod engine;
pub mod export;
pub mod fetch;
pub mod raster;

pub use engine::*;
pub use export::*;
pub use fetch::*;
pub use raster::*;
