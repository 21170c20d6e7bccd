//! Cropping, recognition and the background task that runs them.

pub mod engine;
pub mod preprocess;
pub mod setup;
pub mod task;

pub use engine::{OcrEngine, TesseractEngine};
pub use preprocess::crop_region;
pub use setup::ensure_language_data;
pub use task::{CancelToken, OcrProgress, RecognitionTask, TaskOutcome, TaskPoll};
