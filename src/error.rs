use thiserror::Error;

use crate::geometry::Rectangle;

/// Failures raised along the capture-to-match pipeline.
///
/// Every variant is recoverable: the session converts them into a state
/// transition or a notice for the user, never into a crash.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("No active video frame, try again in a moment")]
    NoActiveFrame,

    #[error(
        "Region ({:.1}, {:.1}, {:.1}x{:.1}) exceeds image bounds {image_width}x{image_height}",
        .rect.x, .rect.y, .rect.width, .rect.height
    )]
    OutOfBounds {
        rect: Rectangle,
        image_width: u32,
        image_height: u32,
    },

    #[error(
        "Region ({:.1}, {:.1}, {:.1}x{:.1}) has no usable area",
        .0.x, .0.y, .0.width, .0.height
    )]
    DegenerateRegion(Rectangle),

    #[error("Invalid scale: native {native_width}x{native_height}, displayed {display_width}x{display_height}")]
    InvalidScale {
        native_width: f64,
        native_height: f64,
        display_width: f64,
        display_height: f64,
    },

    #[error("Invalid scale ratio {scale_x}x{scale_y}, both must be finite and positive")]
    InvalidRatio { scale_x: f64, scale_y: f64 },

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Recognition cancelled: {0}")]
    Cancelled(String),

    #[error("'{command}' is not permitted while {state}")]
    NotPermitted {
        command: &'static str,
        state: &'static str,
    },
}
