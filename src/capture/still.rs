//! Camera backed by a photo on disk.
//!
//! Lets saved photos go through the same capture flow as a live camera.

use image::RgbaImage;
use std::path::{Path, PathBuf};

use super::camera::{Camera, CameraConstraints, VideoSource};
use crate::error::ScanError;

/// A "camera" whose only frame is an image file.
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Camera for ImageFileCamera {
    fn acquire(&mut self, constraints: &CameraConstraints) -> Result<Box<dyn VideoSource>, ScanError> {
        let frame = image::open(&self.path)
            .map_err(|e| {
                ScanError::CameraUnavailable(format!("cannot open {}: {}", self.path.display(), e))
            })?
            .to_rgba8();

        log::info!(
            "Opened {} ({}x{}, requested {}x{} {:?})",
            self.path.display(),
            frame.width(),
            frame.height(),
            constraints.ideal_width,
            constraints.ideal_height,
            constraints.facing
        );

        Ok(Box::new(StillSource { frame: Some(frame) }))
    }
}

struct StillSource {
    frame: Option<RgbaImage>,
}

impl VideoSource for StillSource {
    fn current_frame(&mut self) -> Option<RgbaImage> {
        self.frame.clone()
    }

    fn release(&mut self) {
        self.frame = None;
    }
}
