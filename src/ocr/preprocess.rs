use image::{DynamicImage, GrayImage, RgbaImage};

use crate::error::ScanError;
use crate::geometry::Rectangle;

/// How far (in native pixels) a region may overshoot the image edge and still
/// be clamped instead of rejected. Covers float noise from scaling.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Crops a native-space region out of a photo.
///
/// The origin is rounded down and the far edges rounded up, so the output
/// always covers the whole requested area. The source image is untouched.
///
/// Fails with `DegenerateRegion` for non-finite or empty rectangles and with
/// `OutOfBounds` when the rectangle reaches outside the image (typically
/// because the scale factors did not match the rendered photo).
pub fn crop_region(img: &RgbaImage, region: &Rectangle) -> Result<RgbaImage, ScanError> {
    if !region.is_valid() {
        return Err(ScanError::DegenerateRegion(*region));
    }

    let (w, h) = img.dimensions();
    let out_of_bounds = || ScanError::OutOfBounds {
        rect: *region,
        image_width: w,
        image_height: h,
    };

    let x1 = clamp_edge(region.right(), w).ok_or_else(out_of_bounds)?;
    let y1 = clamp_edge(region.bottom(), h).ok_or_else(out_of_bounds)?;
    let x0 = region.x.floor() as u32;
    let y0 = region.y.floor() as u32;

    if x0 >= x1 || y0 >= y1 {
        return Err(ScanError::DegenerateRegion(*region));
    }

    Ok(image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// Rounds a far edge up, tolerating float noise past the image edge.
fn clamp_edge(edge: f64, limit: u32) -> Option<u32> {
    let limit_f = limit as f64;
    if edge > limit_f + EDGE_TOLERANCE {
        return None;
    }
    Some((edge.ceil().min(limit_f)) as u32)
}

/// Converts a crop to 8-bit grayscale before recognition.
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    DynamicImage::ImageRgba8(img.clone()).to_luma8()
}
