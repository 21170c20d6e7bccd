//! Rectangles and the display-space to native-space mapping.
//!
//! A photo is usually rendered smaller than its native resolution. The user
//! draws the region of interest over the rendered photo, so before cropping
//! the rectangle has to be scaled back into native pixels.

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// A 2D point, e.g. a pointer position in page coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle.
///
/// The type does not know whether it is in display or native space; callers
/// keep track of that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// X position of the top-left corner
    pub x: f64,
    /// Y position of the top-left corner
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when every component is finite, the origin is non-negative and
    /// both spans are strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Ratio of native pixels to displayed pixels on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    scale_x: f64,
    scale_y: f64,
}

impl ScaleFactors {
    /// Builds scale factors from explicit ratios.
    ///
    /// Both ratios must be finite and strictly positive.
    pub fn new(scale_x: f64, scale_y: f64) -> Result<Self, ScanError> {
        if !(scale_x.is_finite() && scale_x > 0.0 && scale_y.is_finite() && scale_y > 0.0) {
            return Err(ScanError::InvalidRatio { scale_x, scale_y });
        }
        Ok(Self { scale_x, scale_y })
    }

    /// Derives scale factors from the native size of an image and the size it
    /// was actually rendered at.
    ///
    /// The displayed size must be measured from the rendered photo at the time
    /// the rectangle was drawn. A stale or assumed width yields a wrong crop.
    pub fn from_dimensions(
        native_width: f64,
        native_height: f64,
        display_width: f64,
        display_height: f64,
    ) -> Result<Self, ScanError> {
        let invalid = || ScanError::InvalidScale {
            native_width,
            native_height,
            display_width,
            display_height,
        };

        let scale_x = native_width / display_width;
        let scale_y = native_height / display_height;
        if !(scale_x.is_finite() && scale_x > 0.0 && scale_y.is_finite() && scale_y > 0.0) {
            return Err(invalid());
        }
        Ok(Self { scale_x, scale_y })
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }
}

/// Maps a display-space rectangle into native image pixels.
pub fn to_native_rect(display_rect: &Rectangle, scale: &ScaleFactors) -> Rectangle {
    Rectangle {
        x: display_rect.x * scale.scale_x,
        y: display_rect.y * scale.scale_y,
        width: display_rect.width * scale.scale_x,
        height: display_rect.height * scale.scale_y,
    }
}
