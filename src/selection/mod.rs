//! Region-of-interest selection over a captured photo.
//!
//! Replaces pointer/touch callbacks with explicit events applied to a
//! selector value, so any front end can drive it.

pub mod selector;
pub mod state;

pub use selector::{RegionSelector, SelectorEvent};
pub use state::{ContainerBounds, DragKind, SizeLimits};
