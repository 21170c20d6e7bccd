//! CSV log of scan results.
//!
//! Append-only for crash safety. Each row: timestamp, outcome, matched
//! question id, native crop region and the recognized text.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::geometry::Rectangle;

/// CSV header row.
const CSV_HEADER: [&str; 8] = [
    "timestamp",
    "outcome",
    "question_id",
    "region_x",
    "region_y",
    "region_width",
    "region_height",
    "ocr_text",
];

/// One finished scan.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub scanned_at: DateTime<Local>,
    /// "matched", "no_match", "recognition_failed" or "error"
    pub outcome: &'static str,
    pub question_id: Option<u64>,
    /// Native-space crop region
    pub region: Option<Rectangle>,
    pub ocr_text: String,
}

impl ScanRecord {
    fn to_row(&self) -> [String; 8] {
        let coord = |value: Option<f64>| value.map(|v| format!("{:.1}", v)).unwrap_or_default();
        [
            self.scanned_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.outcome.to_string(),
            self.question_id.map(|id| id.to_string()).unwrap_or_default(),
            coord(self.region.map(|r| r.x)),
            coord(self.region.map(|r| r.y)),
            coord(self.region.map(|r| r.width)),
            coord(self.region.map(|r| r.height)),
            self.ocr_text.clone(),
        ]
    }
}

/// Scan history file.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    path: PathBuf,
}

impl ScanHistory {
    /// Opens (creating if needed) the history file and writes the header once.
    pub fn open(path: &Path) -> Result<Self> {
        init_csv(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ScanRecord) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open history CSV for append")?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(record.to_row())
            .context("Failed to write history row")?;
        writer.flush().context("Failed to flush history CSV")?;
        Ok(())
    }
}

/// Initializes CSV file with header if it doesn't exist or is empty.
fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing history CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            // File has content, don't overwrite
            return Ok(());
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create history directory")?;
    }
    let mut writer = csv::Writer::from_path(path).context("Failed to create history CSV")?;
    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;
    writer.flush().context("Failed to flush history CSV")?;
    Ok(())
}
