use image::{DynamicImage, Rgba, RgbaImage};
use photoglow_session_model::{
    encode_png, EditSession, FilterParam, FilterParams, SessionStore, SONG_LIBRARY,
};
use proptest::prelude::*;

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    encode_png(&DynamicImage::ImageRgba8(img)).expect("fixture should encode")
}

fn param_strategy() -> impl Strategy<Value = FilterParam> {
    prop_oneof![
        Just(FilterParam::Brightness),
        Just(FilterParam::Contrast),
        Just(FilterParam::Saturation),
        Just(FilterParam::Blur),
    ]
}

proptest! {
    #[test]
    fn load_yields_identical_original_and_current(width in 1u32..24, height in 1u32..24) {
        let mut session = EditSession::new();
        session.apply_preset();
        session.load_image(gradient_png(width, height)).unwrap();

        let original = session.original().unwrap();
        let current = session.current().unwrap();
        prop_assert!(original.same_pixels(current));
        prop_assert_eq!(session.filters(), FilterParams::NEUTRAL);
    }

    #[test]
    fn in_range_filter_edits_never_touch_the_original(
        edits in proptest::collection::vec((param_strategy(), 0i64..=200), 1..12)
    ) {
        let bytes = gradient_png(6, 5);
        let mut session = EditSession::new();
        session.load_image(bytes.clone()).unwrap();
        let before = session.original().unwrap().pixels().to_rgba8();

        for (param, value) in edits {
            let (_, max) = param.range();
            let value = value.min(max as i64);
            session.set_filter(param, value).unwrap();
            prop_assert_eq!(session.filters().get(param) as i64, value);
        }

        let original = session.original().unwrap();
        prop_assert_eq!(original.bytes(), bytes.as_slice());
        prop_assert_eq!(original.pixels().to_rgba8(), before);
        prop_assert!(original.same_pixels(session.current().unwrap()));
    }

    #[test]
    fn out_of_range_values_are_rejected(param in param_strategy(), excess in 1i64..1000) {
        let (min, max) = param.range();
        let mut filters = FilterParams::ENHANCED;
        prop_assert!(filters.set(param, max as i64 + excess).is_err());
        prop_assert!(filters.set(param, min as i64 - excess).is_err());
        prop_assert_eq!(filters, FilterParams::ENHANCED);
    }
}

#[test]
fn store_commits_are_isolated_from_held_snapshots() {
    let store = SessionStore::new();
    store
        .update(|s| s.load_image(gradient_png(4, 4)))
        .expect("load should succeed");
    let held = store.snapshot();

    store
        .update(|s| {
            s.select_track(SONG_LIBRARY[0]);
            s.set_filter(FilterParam::Contrast, 40)
        })
        .expect("edit should succeed");

    assert_eq!(held.session.filters(), FilterParams::NEUTRAL);
    assert!(held.session.selected_track().is_none());

    let now = store.snapshot();
    assert_eq!(now.session.filters().contrast, 40);
    assert_eq!(now.session.selected_track().map(|t| t.id), Some(1));
    assert!(now
        .session
        .original()
        .unwrap()
        .shares_handle(held.session.original().unwrap()));
}
