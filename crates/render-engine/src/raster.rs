//! Still-image rasterizer: bakes filter parameters into pixels.
//!
//! The math follows the CSS filter functions so an exported frame matches
//! what a `filter:` preview shows:
//!
//! - `brightness(b)`: `c * b`
//! - `contrast(k)`: `(c - 0.5) * k + 0.5`
//! - `saturate(s)`: the Filter Effects saturate matrix
//! - `blur(r)`: gaussian blur with standard deviation `r` pixels
//!
//! Each stage clamps to `[0, 1]`. Alpha passes through untouched.

use image::{DynamicImage, RgbaImage};

use photoglow_common::error::{PhotoglowError, PhotoglowResult};
use photoglow_session_model::{encode_png, FilterParams, ImageAsset};

/// A rendered still ready to hand to the encoder.
#[derive(Debug, Clone)]
pub struct RasterizedImage {
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
    /// Native width of the source image.
    pub width: u32,
    /// Native height of the source image.
    pub height: u32,
}

impl RasterizedImage {
    /// Output dimensions after rounding down to even numbers.
    pub fn even_dimensions(&self) -> (u32, u32) {
        even_dimensions(self.width, self.height)
    }
}

/// Round each dimension down to the nearest multiple of two (H.264 4:2:0
/// needs even sizes).
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width & !1, height & !1)
}

/// Render `asset` at its native size with `filters` applied and encode it as PNG.
pub fn rasterize(asset: &ImageAsset, filters: &FilterParams) -> PhotoglowResult<RasterizedImage> {
    let (width, height) = (asset.width(), asset.height());
    let (even_w, even_h) = even_dimensions(width, height);
    if even_w == 0 || even_h == 0 {
        return Err(PhotoglowError::render(format!(
            "Image {width}x{height} is too small to encode as video"
        )));
    }

    let pixels = apply_filters(asset.pixels(), filters);
    let png = encode_png(&DynamicImage::ImageRgba8(pixels))?;

    tracing::debug!(
        width,
        height,
        png_bytes = png.len(),
        filters = %filters.css(),
        "Rasterized still image"
    );

    Ok(RasterizedImage { png, width, height })
}

/// Apply all filters to a copy of `image`.
pub fn apply_filters(image: &DynamicImage, filters: &FilterParams) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    if filters.is_neutral() {
        return rgba;
    }

    let transfer = ColorTransfer::from_filters(filters);
    if !transfer.is_identity() {
        for pixel in rgba.pixels_mut() {
            pixel.0 = transfer.apply(pixel.0);
        }
    }

    if filters.blur > 0 {
        rgba = image::imageops::blur(&rgba, filters.blur as f32);
    }

    rgba
}

/// Per-pixel color stages, pre-computed from the filter record.
#[derive(Debug, Clone, Copy)]
struct ColorTransfer {
    brightness: f32,
    contrast: f32,
    saturate: [[f32; 3]; 3],
    identity_saturate: bool,
}

impl ColorTransfer {
    fn from_filters(filters: &FilterParams) -> Self {
        let s = filters.saturation as f32 / 100.0;
        Self {
            brightness: filters.brightness as f32 / 100.0,
            contrast: filters.contrast as f32 / 100.0,
            saturate: saturate_matrix(s),
            identity_saturate: filters.saturation == 100,
        }
    }

    fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.identity_saturate
    }

    fn apply(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        let mut rgb = [r, g, b].map(|c| {
            let c = c as f32 / 255.0;
            let c = (c * self.brightness).clamp(0.0, 1.0);
            ((c - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0)
        });

        if !self.identity_saturate {
            let m = &self.saturate;
            let [r, g, b] = rgb;
            rgb = [
                (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 1.0),
                (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 1.0),
                (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 1.0),
            ];
        }

        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        [r, g, b, a]
    }
}

fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}
