//! Decoded image assets.
//!
//! An [`ImageAsset`] keeps the exact bytes that were uploaded next to the
//! decoded pixels. Both halves sit behind `Arc`s, so cloning an asset (and
//! therefore a whole session snapshot) never copies image data.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// An uploaded or generated image together with its display handle.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    pixels: Arc<DynamicImage>,
}

impl ImageAsset {
    /// Decode raw file bytes (JPEG or PNG).
    pub fn decode(bytes: impl Into<Vec<u8>>) -> PhotoglowResult<Self> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(PhotoglowError::image_decode("empty input"));
        }

        let pixels = image::load_from_memory(&bytes)
            .map_err(|e| PhotoglowError::image_decode(e.to_string()))?;

        Ok(Self {
            bytes: Arc::from(bytes),
            pixels: Arc::new(pixels),
        })
    }

    /// Read and decode an image file from disk.
    pub fn open(path: &std::path::Path) -> PhotoglowResult<Self> {
        if !path.exists() {
            return Err(PhotoglowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::decode(std::fs::read(path)?)
    }

    /// The bytes exactly as they were received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decoded pixels, ready to display or render.
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether two assets decode to the same pixels.
    pub fn same_pixels(&self, other: &ImageAsset) -> bool {
        if Arc::ptr_eq(&self.pixels, &other.pixels) {
            return true;
        }
        self.width() == other.width()
            && self.height() == other.height()
            && self.pixels.to_rgba8().as_raw() == other.pixels.to_rgba8().as_raw()
    }

    /// Whether both assets share the same decoded buffer.
    pub fn shares_handle(&self, other: &ImageAsset) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

/// Serialize an image to PNG bytes.
pub fn encode_png(image: &DynamicImage) -> PhotoglowResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| PhotoglowError::render(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}
