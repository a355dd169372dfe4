//! Cosmetic filter parameters.
//!
//! Values are stored as integers, the way slider controls produce them.
//! Percent-based parameters use `100` as neutral; blur is a radius in pixels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// One adjustable filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterParam {
    Brightness,
    Contrast,
    Saturation,
    Blur,
}

impl FilterParam {
    pub const ALL: [FilterParam; 4] = [
        FilterParam::Brightness,
        FilterParam::Contrast,
        FilterParam::Saturation,
        FilterParam::Blur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterParam::Brightness => "brightness",
            FilterParam::Contrast => "contrast",
            FilterParam::Saturation => "saturation",
            FilterParam::Blur => "blur",
        }
    }

    /// Inclusive value range.
    pub fn range(&self) -> (u32, u32) {
        match self {
            FilterParam::Brightness | FilterParam::Contrast | FilterParam::Saturation => (0, 200),
            FilterParam::Blur => (0, 20),
        }
    }

    /// Value that leaves the image untouched.
    pub fn neutral(&self) -> u32 {
        match self {
            FilterParam::Blur => 0,
            _ => 100,
        }
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterParam {
    type Err = PhotoglowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brightness" => Ok(FilterParam::Brightness),
            "contrast" => Ok(FilterParam::Contrast),
            "saturation" | "saturate" => Ok(FilterParam::Saturation),
            "blur" => Ok(FilterParam::Blur),
            _ => Err(PhotoglowError::UnknownFilter {
                name: s.to_string(),
            }),
        }
    }
}

/// The full set of filter values applied when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterParams {
    /// Brightness in percent.
    pub brightness: u32,
    /// Contrast in percent.
    pub contrast: u32,
    /// Saturation in percent.
    pub saturation: u32,
    /// Gaussian blur radius in pixels.
    pub blur: u32,
}

impl FilterParams {
    /// No adjustment.
    pub const NEUTRAL: FilterParams = FilterParams {
        brightness: 100,
        contrast: 100,
        saturation: 100,
        blur: 0,
    };

    /// The one-click "Auto Enhance" look.
    pub const ENHANCED: FilterParams = FilterParams {
        brightness: 110,
        contrast: 115,
        saturation: 120,
        blur: 0,
    };

    pub fn get(&self, param: FilterParam) -> u32 {
        match param {
            FilterParam::Brightness => self.brightness,
            FilterParam::Contrast => self.contrast,
            FilterParam::Saturation => self.saturation,
            FilterParam::Blur => self.blur,
        }
    }

    /// Replace one field. Out-of-range values are rejected and leave `self` unchanged.
    pub fn set(&mut self, param: FilterParam, value: i64) -> PhotoglowResult<()> {
        let (min, max) = param.range();
        if value < min as i64 || value > max as i64 {
            return Err(PhotoglowError::FilterOutOfRange {
                name: param.name().to_string(),
                value,
                min,
                max,
            });
        }

        let value = value as u32;
        match param {
            FilterParam::Brightness => self.brightness = value,
            FilterParam::Contrast => self.contrast = value,
            FilterParam::Saturation => self.saturation = value,
            FilterParam::Blur => self.blur = value,
        }
        Ok(())
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// CSS `filter` property value, for preview front ends.
    pub fn css(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) blur({}px)",
            self.brightness, self.contrast, self.saturation, self.blur
        )
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let params = FilterParams::default();
        assert_eq!(
            (params.brightness, params.contrast, params.saturation, params.blur),
            (100, 100, 100, 0)
        );
        assert!(params.is_neutral());
        for param in FilterParam::ALL {
            assert_eq!(params.get(param), param.neutral());
        }
    }

    #[test]
    fn test_set_replaces_single_field() {
        let mut params = FilterParams::default();
        params.set(FilterParam::Contrast, 150).unwrap();
        assert_eq!(params.contrast, 150);
        assert_eq!(params.brightness, 100);
        assert_eq!(params.saturation, 100);
        assert_eq!(params.blur, 0);
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut params = FilterParams::ENHANCED;
        let err = params.set(FilterParam::Brightness, 201).unwrap_err();
        assert!(matches!(err, PhotoglowError::FilterOutOfRange { .. }));
        assert!(params.set(FilterParam::Blur, -1).is_err());
        assert!(params.set(FilterParam::Blur, 21).is_err());
        assert_eq!(params, FilterParams::ENHANCED);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut params = FilterParams::default();
        params.set(FilterParam::Saturation, 0).unwrap();
        params.set(FilterParam::Saturation, 200).unwrap();
        params.set(FilterParam::Blur, 20).unwrap();
        assert_eq!(params.saturation, 200);
        assert_eq!(params.blur, 20);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Brightness".parse::<FilterParam>().unwrap(), FilterParam::Brightness);
        assert_eq!("saturate".parse::<FilterParam>().unwrap(), FilterParam::Saturation);
        assert_eq!(" blur ".parse::<FilterParam>().unwrap(), FilterParam::Blur);
        assert!(matches!(
            "hue".parse::<FilterParam>(),
            Err(PhotoglowError::UnknownFilter { .. })
        ));
    }

    #[test]
    fn test_css_string() {
        assert_eq!(
            FilterParams::ENHANCED.css(),
            "brightness(110%) contrast(115%) saturate(120%) blur(0px)"
        );
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&FilterParams::NEUTRAL).unwrap();
        assert_eq!(
            json,
            r#"{"brightness":100,"contrast":100,"saturation":100,"blur":0}"#
        );
    }
}
