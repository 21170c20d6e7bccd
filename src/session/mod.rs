//! Capture session state machine.
//!
//! This module provides:
//! - Session states and per-state command permissions
//! - The `CaptureSession` that drives camera, selection and recognition
//! - An optional CSV history of scan results

pub mod history;
pub mod machine;
pub mod state;

pub use history::{ScanHistory, ScanRecord};
pub use machine::{CaptureSession, SessionSettings, SessionView};
pub use state::{CaptureState, Photo, SessionCommand, StateTag};
