//! Camera collaborator interface and the guard that keeps it released.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Which camera to prefer on devices with more than one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Back camera, pointed at the page
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Parameters for acquiring a video source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// A camera device that can be opened for streaming.
pub trait Camera {
    /// Opens the device. Fails with `CameraUnavailable` when access is denied
    /// or no device matches.
    fn acquire(&mut self, constraints: &CameraConstraints) -> Result<Box<dyn VideoSource>, ScanError>;
}

/// An open video stream.
pub trait VideoSource {
    /// The most recent frame, or `None` if the stream has not produced one yet.
    fn current_frame(&mut self) -> Option<RgbaImage>;

    /// Stops all tracks. Must be safe to call more than once.
    fn release(&mut self);
}

/// Exclusive hold on an open video source; releases it when dropped.
pub struct CameraGuard {
    source: Box<dyn VideoSource>,
}

impl CameraGuard {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        Self { source }
    }

    pub fn current_frame(&mut self) -> Option<RgbaImage> {
        self.source.current_frame()
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        log::debug!("Releasing camera");
        self.source.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource(Arc<AtomicUsize>);

    impl VideoSource for CountingSource {
        fn current_frame(&mut self) -> Option<RgbaImage> {
            None
        }

        fn release(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let mut guard = CameraGuard::new(Box::new(CountingSource(releases.clone())));
            assert!(guard.current_frame().is_none());
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
