//! Scanner configuration.
//!
//! Loaded from config.json at startup. Every field has a default, so a
//! partial file only overrides what it mentions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::{CameraConstraints, FacingMode};
use crate::geometry::Rectangle;
use crate::selection::SizeLimits;

/// Default region of interest and the resize handle limits, in display pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub default_x: f64,
    pub default_y: f64,
    /// Width of the region; fixed, only the height can be dragged
    pub default_width: f64,
    pub default_height: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            default_x: 0.0,
            default_y: 0.0,
            default_width: 400.0,
            default_height: 120.0,
            min_height: 40.0,
            max_height: 200.0,
        }
    }
}

impl RegionConfig {
    pub fn default_rect(&self) -> Rectangle {
        Rectangle::new(
            self.default_x,
            self.default_y,
            self.default_width,
            self.default_height,
        )
    }

    pub fn limits(&self) -> SizeLimits {
        SizeLimits {
            min_height: self.min_height,
            max_height: self.max_height,
        }
    }
}

/// Camera request parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

impl CameraConfig {
    pub fn constraints(&self) -> CameraConstraints {
        CameraConstraints {
            facing: self.facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}

/// Tesseract settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract page segmentation mode (6 = single uniform block of text)
    pub page_seg_mode: u8,
    /// Convert the crop to grayscale before recognition
    pub grayscale: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            tessdata_dir: None,
            page_seg_mode: 6,
            grayscale: true,
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Recognition language, fixed per deployment
    pub language: String,
    /// Text shown in place of the OCR output when recognition fails
    pub recognition_failure_text: String,
    pub region: RegionConfig,
    pub camera: CameraConfig,
    pub ocr: OcrConfig,
    /// Question bank location: a file path or an http(s) URL
    pub questions_source: String,
    /// Append every result to this CSV file
    pub history_csv: Option<PathBuf>,
    /// Give up on recognition after this long (applied by the caller)
    pub recognition_timeout_ms: Option<u64>,
    /// Write logs to `<exe_dir>/logs/` instead of stderr
    pub log_to_file: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            language: "rus".to_string(),
            recognition_failure_text: "Ошибка распознавания текста. Попробуйте ещё раз.".to_string(),
            region: RegionConfig::default(),
            camera: CameraConfig::default(),
            ocr: OcrConfig::default(),
            questions_source: "questions.json".to_string(),
            history_csv: None,
            recognition_timeout_ms: None,
            log_to_file: false,
        }
    }
}

/// Reads configuration from `path` without logging.
///
/// Returns the config and, when it fell back to defaults, the reason. Lets
/// callers read the config before the logger (whose setup depends on it)
/// exists, then report the fallback once it does.
pub fn read_config(path: &Path) -> (ScannerConfig, Option<String>) {
    if !path.exists() {
        let reason = format!("{} not found. Using default config.", path.display());
        return (ScannerConfig::default(), Some(reason));
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => (config, None),
            Err(e) => {
                let reason = format!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                (ScannerConfig::default(), Some(reason))
            }
        },
        Err(e) => {
            let reason = format!("Failed to read {}: {}. Using defaults.", path.display(), e);
            (ScannerConfig::default(), Some(reason))
        }
    }
}

/// Logs the outcome of [`read_config`].
pub fn report_config_load(path: &Path, fallback: Option<&str>) {
    match fallback {
        Some(reason) => log::warn!("{}", reason),
        None => log::info!("Config loaded from {}", path.display()),
    }
}

/// Loads configuration from `path`, or returns defaults if it is missing or
/// cannot be parsed.
pub fn load_config(path: &Path) -> ScannerConfig {
    log::info!("Looking for config at: {}", path.display());
    let (config, fallback) = read_config(path);
    report_config_load(path, fallback.as_deref());
    config
}
