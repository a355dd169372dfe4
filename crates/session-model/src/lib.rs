//! PhotoGlow Session Model
//!
//! Defines the state an editing session works on:
//! - **Image:** decoded uploads, kept as an immutable original and a
//!   replaceable current version
//! - **Filters:** bounded brightness/contrast/saturation/blur adjustments
//! - **Catalog:** the fixed background-music library and its search
//! - **Playback:** which track is selected and whether it is playing
//! - **Store:** the owned session container that publishes every change
//!
//! Filter edits never touch pixels; they are applied at render time.

pub mod asset;
pub mod catalog;
pub mod filters;
pub mod playback;
pub mod session;
pub mod store;

pub use asset::*;
pub use catalog::*;
pub use filters::*;
pub use playback::*;
pub use session::*;
pub use store::*;
