use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use super::preprocess::to_grayscale;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use super::task::{CancelToken, OcrProgress};
use crate::config::OcrConfig;
use crate::error::ScanError;

/// How often a running Tesseract process is checked for exit or cancellation.
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Text recognition backend.
///
/// Implementations must be shareable with the worker thread that runs the
/// recognition task.
pub trait OcrEngine: Send + Sync {
    /// Recognizes the text in `image` using `language` (a Tesseract language
    /// code such as "rus" or "eng").
    ///
    /// Reports progress through `on_progress` and should give up promptly once
    /// `cancel` is set.
    fn recognize(
        &self,
        image: &RgbaImage,
        language: &str,
        on_progress: &dyn Fn(OcrProgress),
        cancel: &CancelToken,
    ) -> Result<String, ScanError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

/// Runs the Tesseract command-line tool on each crop.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    page_seg_mode: u8,
    grayscale: bool,
}

impl TesseractEngine {
    pub fn new(executable: PathBuf, tessdata: Option<PathBuf>, page_seg_mode: u8, grayscale: bool) -> Self {
        Self {
            executable,
            tessdata,
            page_seg_mode,
            grayscale,
        }
    }

    /// Locates Tesseract and its language data according to `config`.
    pub fn locate(config: &OcrConfig, language: &str) -> Result<Self> {
        let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
        let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), language);
        log::info!(
            "Using Tesseract at {} (tessdata: {})",
            executable.display(),
            tessdata
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "engine default".to_string())
        );
        Ok(Self::new(executable, tessdata, config.page_seg_mode, config.grayscale))
    }

    fn run(
        &self,
        image: &RgbaImage,
        language: &str,
        on_progress: &dyn Fn(OcrProgress),
        cancel: &CancelToken,
    ) -> Result<String> {
        on_progress(OcrProgress::new("preparing image", 0.1));

        let work_dir = TempDir::new().context("Failed to create temporary directory")?;
        let input_path = work_dir.path().join("region.png");
        if self.grayscale {
            to_grayscale(image).save(&input_path)?;
        } else {
            image.save(&input_path)?;
        }

        // Tesseract appends .txt to the output base
        let output_base = work_dir.path().join("region");
        // Diagnostics go to a file, read only after the process exits
        let stderr_path = work_dir.path().join("stderr.txt");
        let stderr_file = File::create(&stderr_path).context("Failed to create stderr capture file")?;

        let mut command = Command::new(&self.executable);
        command
            .arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file));
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }

        on_progress(OcrProgress::new("recognizing text", 0.3));
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", self.executable.display()))?;

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!("cancelled"));
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            thread::sleep(CHILD_POLL_INTERVAL);
        };

        if !status.success() {
            let stderr = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(anyhow!("Tesseract failed ({}): {}", status, stderr.trim()));
        }

        let txt_path = output_base.with_extension("txt");
        let text = std::fs::read_to_string(&txt_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;

        on_progress(OcrProgress::new("done", 1.0));
        Ok(text)
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &RgbaImage,
        language: &str,
        on_progress: &dyn Fn(OcrProgress),
        cancel: &CancelToken,
    ) -> Result<String, ScanError> {
        self.run(image, language, on_progress, cancel).map_err(|e| {
            if cancel.is_cancelled() {
                ScanError::Cancelled(format!("{:#}", e))
            } else {
                ScanError::RecognitionFailed(format!("{:#}", e))
            }
        })
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
