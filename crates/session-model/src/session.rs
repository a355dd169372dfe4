//! The edit session: one image, its filters, and the selected track.

use crate::asset::ImageAsset;
use crate::catalog::Track;
use crate::filters::{FilterParam, FilterParams};
use crate::playback::{Deck, PlaybackCommand};

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// Everything the user is currently editing.
///
/// `original` is only ever replaced by a new upload. Background removal
/// swaps `current`; filters are parameters, never baked into either asset.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    original: Option<ImageAsset>,
    current: Option<ImageAsset>,
    filters: FilterParams,
    deck: Deck,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and install a new upload. On failure nothing changes.
    pub fn load_image(&mut self, bytes: impl Into<Vec<u8>>) -> PhotoglowResult<()> {
        let asset = ImageAsset::decode(bytes)?;
        self.install(asset);
        Ok(())
    }

    /// Install an already decoded upload as both original and current.
    pub fn install(&mut self, asset: ImageAsset) {
        tracing::debug!(width = asset.width(), height = asset.height(), "Image loaded");
        self.current = Some(asset.clone());
        self.original = Some(asset);
        self.filters = FilterParams::NEUTRAL;
    }

    /// Swap the working image, keeping the original.
    pub fn replace_current(&mut self, asset: ImageAsset) -> PhotoglowResult<()> {
        if self.original.is_none() {
            return Err(PhotoglowError::NoImage);
        }
        self.current = Some(asset);
        Ok(())
    }

    /// Change a single filter value.
    pub fn set_filter(&mut self, param: FilterParam, value: i64) -> PhotoglowResult<()> {
        self.filters.set(param, value)
    }

    pub fn apply_preset(&mut self) {
        self.filters = FilterParams::ENHANCED;
    }

    /// Pick a track; see [`Deck::select`].
    pub fn select_track(&mut self, track: Track) -> Vec<PlaybackCommand> {
        self.deck.select(track)
    }

    /// Discard image, filters, and track selection together.
    pub fn reset(&mut self) -> Vec<PlaybackCommand> {
        self.original = None;
        self.current = None;
        self.filters = FilterParams::NEUTRAL;
        self.deck.clear()
    }

    pub fn original(&self) -> Option<&ImageAsset> {
        self.original.as_ref()
    }

    pub fn current(&self) -> Option<&ImageAsset> {
        self.current.as_ref()
    }

    pub fn filters(&self) -> FilterParams {
        self.filters
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub fn selected_track(&self) -> Option<Track> {
        self.deck.selected_track()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the working image differs from the upload (e.g. background removed).
    pub fn is_modified(&self) -> bool {
        match (&self.original, &self.current) {
            (Some(original), Some(current)) => !original.shares_handle(current),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::encode_png;
    use crate::catalog::SONG_LIBRARY;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255]));
        encode_png(&DynamicImage::ImageRgba8(img)).unwrap()
    }

    #[test]
    fn test_load_sets_original_and_current() {
        let mut session = EditSession::new();
        session.load_image(png(4, 2, 10)).unwrap();

        let original = session.original().unwrap();
        let current = session.current().unwrap();
        assert!(original.same_pixels(current));
        assert!(!session.is_modified());
        assert_eq!(session.filters(), FilterParams::NEUTRAL);
    }

    #[test]
    fn test_load_resets_filters() {
        let mut session = EditSession::new();
        session.load_image(png(2, 2, 10)).unwrap();
        session.apply_preset();
        session.set_filter(FilterParam::Blur, 5).unwrap();

        session.load_image(png(3, 3, 20)).unwrap();
        assert_eq!(session.filters(), FilterParams::NEUTRAL);
        assert_eq!(session.current().unwrap().width(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut session = EditSession::new();
        session.load_image(png(2, 2, 10)).unwrap();
        session.apply_preset();

        assert!(session.load_image(b"junk".to_vec()).is_err());
        assert_eq!(session.current().unwrap().width(), 2);
        assert_eq!(session.filters(), FilterParams::ENHANCED);
    }

    #[test]
    fn test_replace_current_keeps_original() {
        let mut session = EditSession::new();
        session.load_image(png(2, 2, 10)).unwrap();
        let cutout = ImageAsset::decode(png(2, 2, 200)).unwrap();

        session.replace_current(cutout).unwrap();
        assert!(session.is_modified());
        let original = session.original().unwrap();
        assert_eq!(original.pixels().to_rgba8().get_pixel(0, 0)[0], 10);
        assert_eq!(session.current().unwrap().pixels().to_rgba8().get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn test_replace_current_requires_image() {
        let mut session = EditSession::new();
        let asset = ImageAsset::decode(png(1, 1, 0)).unwrap();
        assert!(matches!(
            session.replace_current(asset),
            Err(PhotoglowError::NoImage)
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = EditSession::new();
        session.load_image(png(2, 2, 10)).unwrap();
        session.apply_preset();
        session.select_track(SONG_LIBRARY[1]);

        let commands = session.reset();
        assert_eq!(commands.len(), 1);
        assert!(session.original().is_none());
        assert!(session.current().is_none());
        assert!(session.selected_track().is_none());
        assert_eq!(session.filters(), FilterParams::NEUTRAL);
    }
}
