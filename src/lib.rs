//! Question scanner
//!
//! Photograph a printed question, frame it with a movable region, OCR the
//! crop and look the text up in a question bank to show the correct answers.
//!
//! # Modules
//!
//! - [`capture`]: camera traits and an image-file camera
//! - [`selection`]: the region selector driven by pointer gestures
//! - [`geometry`]: display-to-native coordinate mapping
//! - [`ocr`]: cropping, the OCR engine and background recognition
//! - [`questions`]: the question bank, normalization and matching
//! - [`session`]: the capture session state machine

pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod ocr;
pub mod paths;
pub mod questions;
pub mod selection;
pub mod session;

pub use error::ScanError;
