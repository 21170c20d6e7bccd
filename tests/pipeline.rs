//! End-to-end scans over a photo file with a stand-in OCR engine.

use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use question_scanner::ScanError;
use question_scanner::capture::ImageFileCamera;
use question_scanner::geometry::Point;
use question_scanner::ocr::{CancelToken, OcrEngine, OcrProgress};
use question_scanner::questions::QuestionBank;
use question_scanner::selection::{ContainerBounds, SelectorEvent};
use question_scanner::session::{CaptureSession, SessionSettings, StateTag};

const CORPUS: &str = r#"{
    "questions": [
        {
            "id": 7,
            "questionText": "Столица России",
            "answers": [
                { "id": 1, "text": "Москва", "isCorrect": true },
                { "id": 2, "text": "Казань", "isCorrect": false }
            ]
        }
    ]
}"#;

/// Returns fixed text and remembers the top-left pixel of every crop.
struct ScriptedEngine {
    text: String,
    crops: Mutex<Vec<(u32, u32, Rgba<u8>)>>,
}

impl OcrEngine for ScriptedEngine {
    fn recognize(
        &self,
        image: &RgbaImage,
        _language: &str,
        _on_progress: &dyn Fn(OcrProgress),
        _cancel: &CancelToken,
    ) -> Result<String, ScanError> {
        self.crops
            .lock()
            .unwrap()
            .push((image.width(), image.height(), *image.get_pixel(0, 0)));
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 800x600 photo; each 100px horizontal band has a distinct red value.
fn banded_photo() -> RgbaImage {
    RgbaImage::from_fn(800, 600, |_, y| Rgba([(y / 100) as u8 * 40, 0, 0, 255]))
}

fn session_for(path: &std::path::Path, engine: Arc<ScriptedEngine>) -> CaptureSession {
    let bank = Arc::new(QuestionBank::from_json_str(CORPUS).unwrap());
    CaptureSession::new(
        Box::new(ImageFileCamera::new(path)),
        engine,
        bank,
        SessionSettings::default(),
    )
}

#[test]
fn scan_photo_file_and_find_answer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.png");
    banded_photo().save(&path).unwrap();

    let engine = Arc::new(ScriptedEngine {
        text: "2. СТОЛИЦА\nроссии?\nа) Москва".to_string(),
        crops: Mutex::new(Vec::new()),
    });
    let mut session = session_for(&path, engine.clone());

    session.start_camera().unwrap();
    session.take_photo().unwrap();
    // Shown at half size
    session.layout(ContainerBounds::at_origin(400.0, 300.0));

    // Drag the region so its top edge sits at y=100 on screen (y=200 native)
    session.gesture(SelectorEvent::BeginMove);
    session.gesture(SelectorEvent::PointerMoved(Point::new(200.0, 160.0)));
    session.gesture(SelectorEvent::End);
    assert_eq!(session.view().region.unwrap().y, 100.0);

    assert!(session.process().unwrap());
    session.wait();

    let view = session.view();
    assert_eq!(view.state, StateTag::Result);
    let question = view.matched.expect("question should match");
    assert_eq!(question.id, 7);
    let correct: Vec<&str> = question.correct_answers().map(|a| a.text.as_str()).collect();
    assert_eq!(correct, vec!["Москва"]);

    let crops = engine.crops.lock().unwrap();
    assert_eq!(crops.len(), 1);
    let (width, height, top_left) = crops[0];
    assert_eq!((width, height), (800, 240));
    // Band starting at native y=200
    assert_eq!(top_left, Rgba([80, 0, 0, 255]));
}

#[test]
fn unreadable_photo_keeps_session_idle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not-an-image.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let engine = Arc::new(ScriptedEngine {
        text: String::new(),
        crops: Mutex::new(Vec::new()),
    });
    let mut session = session_for(&path, engine);

    assert!(matches!(session.start_camera(), Err(ScanError::CameraUnavailable(_))));
    assert_eq!(session.tag(), StateTag::Idle);
    assert!(session.view().notice.is_some());
}
