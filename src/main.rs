//! Question scanner command-line front end.
//!
//! Drives a capture session from a photo file instead of a live camera.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use question_scanner::capture::ImageFileCamera;
use question_scanner::config::{ScannerConfig, read_config, report_config_load};
use question_scanner::geometry::Point;
use question_scanner::ocr::setup::{ensure_language_data, find_tesseract_executable};
use question_scanner::ocr::TesseractEngine;
use question_scanner::questions::{Question, QuestionBank, find_match};
use question_scanner::selection::{ContainerBounds, SelectorEvent};
use question_scanner::session::{CaptureSession, CaptureState, ScanHistory, SessionSettings};
use question_scanner::{logging, paths};

#[derive(Parser)]
#[command(name = "question-scanner")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to config.json next to the executable).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a photo: select a region, recognize it and look up the question.
    Scan(ScanArgs),
    /// Look up a piece of text in the question bank.
    Match(MatchArgs),
    /// Locate Tesseract and download language data if missing.
    Setup(SetupArgs),
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Photo of the question.
    image: PathBuf,

    /// Width the photo is shown at; height follows the aspect ratio.
    #[arg(long)]
    display_width: Option<f64>,

    /// Top-left corner of the region in display pixels, as X,Y.
    #[arg(long, value_parser = parse_point)]
    at: Option<Point>,

    /// Region height in display pixels.
    #[arg(long)]
    height: Option<f64>,

    /// Question bank file or URL.
    #[arg(long)]
    questions: Option<String>,

    /// Recognition language, e.g. 'rus' or 'eng'.
    #[arg(long)]
    lang: Option<String>,

    /// Give up on recognition after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Append the result to this CSV file.
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Text to look up, as the OCR engine would return it.
    text: String,

    /// Question bank file or URL.
    #[arg(long)]
    questions: Option<String>,
}

#[derive(clap::Args)]
struct SetupArgs {
    /// Language data to install.
    #[arg(long)]
    lang: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(paths::get_default_config_path);
    // The logger's target comes from the config, so report the load afterwards
    let (config, fallback) = read_config(&config_path);

    if config.log_to_file {
        paths::ensure_directories()?;
    }
    logging::init(config.log_to_file, cli.verbose)?;
    logging::install_panic_hook();
    report_config_load(&config_path, fallback.as_deref());

    match cli.command {
        Commands::Scan(args) => run_scan(config, args),
        Commands::Match(args) => run_match(config, args),
        Commands::Setup(args) => run_setup(config, args),
    }
}

fn run_scan(mut config: ScannerConfig, args: ScanArgs) -> Result<()> {
    if let Some(lang) = args.lang {
        config.language = lang;
    }
    if let Some(source) = args.questions {
        config.questions_source = source;
    }
    if let Some(ms) = args.timeout_ms {
        config.recognition_timeout_ms = Some(ms);
    }
    if let Some(path) = args.history {
        config.history_csv = Some(path);
    }

    let bank = Arc::new(QuestionBank::load_or_empty(&config.questions_source));
    let engine = TesseractEngine::locate(&config.ocr, &config.language)?;
    let camera = ImageFileCamera::new(&args.image);

    let mut session = CaptureSession::new(
        Box::new(camera),
        Arc::new(engine),
        bank,
        SessionSettings::from_config(&config),
    );
    if let Some(path) = &config.history_csv {
        session = session.with_history(ScanHistory::open(path)?);
    }
    session.on_progress(|p| log::info!("OCR: {} ({:.0}%)", p.status, p.progress * 100.0));

    session.start_camera()?;
    session.take_photo()?;

    let (native_width, native_height) = session
        .view()
        .photo_size
        .ok_or_else(|| anyhow!("No photo captured"))?;
    let display_width = args.display_width.unwrap_or(native_width as f64);
    let display_height = display_width * native_height as f64 / native_width as f64;
    session.layout(ContainerBounds::at_origin(display_width, display_height));

    if let Some(at) = args.at {
        // The selector centers the region on the pointer
        let rect = session.view().region.context("No region to move")?;
        let pointer = Point::new(at.x + rect.width / 2.0, at.y + rect.height / 2.0);
        session.gesture(SelectorEvent::BeginMove);
        session.gesture(SelectorEvent::PointerMoved(pointer));
        session.gesture(SelectorEvent::End);
    }
    if let Some(height) = args.height {
        let rect = session.view().region.context("No region to resize")?;
        session.gesture(SelectorEvent::BeginResize);
        session.gesture(SelectorEvent::PointerMoved(Point::new(rect.x, rect.y + height)));
        session.gesture(SelectorEvent::End);
    }

    if let Some(rect) = session.view().region {
        log::info!(
            "Region ({:.1}, {:.1}, {:.1}x{:.1}) on {:.0}x{:.0} display",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            display_width,
            display_height
        );
    }

    session.process()?;
    match config.recognition_timeout_ms {
        Some(ms) => {
            if !session.wait_timeout(Duration::from_millis(ms)) {
                session.cancel_processing(&format!("no result after {} ms", ms))?;
            }
        }
        None => session.wait(),
    }

    match session.state() {
        CaptureState::Result {
            ocr_text, matched, ..
        } => {
            println!("Recognized text:");
            println!("{}", ocr_text.trim());
            println!();
            print_match(matched.as_ref());
            Ok(())
        }
        CaptureState::Error { reason } => Err(anyhow!("Scan failed: {}", reason)),
        other => Err(anyhow!("Unexpected session state: {}", other)),
    }
}

fn run_match(config: ScannerConfig, args: MatchArgs) -> Result<()> {
    let source = args.questions.unwrap_or(config.questions_source);
    let bank = QuestionBank::load(&source)?;
    print_match(find_match(&args.text, &bank));
    Ok(())
}

fn run_setup(config: ScannerConfig, args: SetupArgs) -> Result<()> {
    let language = args.lang.unwrap_or(config.language);

    let executable = find_tesseract_executable(config.ocr.tesseract_path.as_deref())?;
    println!("Tesseract: {}", executable.display());

    let tessdata = ensure_language_data(config.ocr.tessdata_dir.as_deref(), &language)?;
    println!("Language data '{}': {}", language, tessdata.display());
    Ok(())
}

fn print_match(matched: Option<&Question>) {
    match matched {
        Some(question) => {
            println!("Question #{}: {}", question.id, question.question_text);
            for answer in &question.answers {
                let mark = if answer.is_correct { "[x]" } else { "[ ]" };
                println!("  {} {}", mark, answer.text);
            }
        }
        None => println!("Question not found in the bank."),
    }
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", value))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid X in '{}'", value))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid Y in '{}'", value))?;
    let point = Point::new(x, y);
    if !point.is_finite() {
        return Err(format!("coordinates must be finite, got '{}'", value));
    }
    Ok(point)
}
