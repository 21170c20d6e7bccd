//! Camera access.
//!
//! This module provides:
//! - The camera collaborator traits (`Camera`, `VideoSource`)
//! - A release-on-drop guard for an open stream (`CameraGuard`)
//! - A camera backed by an image file (`ImageFileCamera`)

pub mod camera;
pub mod still;

pub use camera::{Camera, CameraConstraints, CameraGuard, FacingMode, VideoSource};
pub use still::ImageFileCamera;
