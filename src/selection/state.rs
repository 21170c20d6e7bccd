//! Selector state types: drag kind, container bounds and size limits.

use serde::{Deserialize, Serialize};

/// Which gesture, if any, currently owns the pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragKind {
    #[default]
    None,
    /// Dragging the whole region.
    Moving,
    /// Dragging the resize handle at the bottom edge.
    Resizing,
}

/// Where the photo is rendered, in the same coordinates pointer events use.
///
/// `left`/`top` is the origin of the rendered photo; `width`/`height` its
/// rendered size. The selector rectangle is relative to this origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds for a photo drawn at the page origin with the given size.
    pub fn at_origin(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Height limits for the resize handle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_height: 40.0,
            max_height: 200.0,
        }
    }
}
