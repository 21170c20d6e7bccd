//! Capture session: camera, photo, region selection and recognition tied
//! together as one state machine.
//!
//! The session is driven from a single thread. Recognition runs on a worker
//! (see [`RecognitionTask`]); the owner calls [`CaptureSession::poll`] from its
//! event loop, or one of the blocking waits, to pick up the outcome.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{Camera, CameraConstraints, CameraGuard};
use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::geometry::{Rectangle, ScaleFactors, to_native_rect};
use crate::ocr::{OcrEngine, OcrProgress, RecognitionTask, TaskOutcome, TaskPoll, crop_region};
use crate::questions::{Question, QuestionBank, find_match};
use crate::selection::{ContainerBounds, DragKind, RegionSelector, SelectorEvent, SizeLimits};
use crate::session::history::{ScanHistory, ScanRecord};
use crate::session::state::{CaptureState, Photo, SessionCommand, StateTag};

/// Per-session settings, fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    pub language: String,
    /// Shown in place of OCR output when the engine fails
    pub failure_text: String,
    /// Initial region, in display pixels
    pub default_region: Rectangle,
    pub limits: SizeLimits,
    pub constraints: CameraConstraints,
}

impl SessionSettings {
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            language: config.language.clone(),
            failure_text: config.recognition_failure_text.clone(),
            default_region: config.region.default_rect(),
            limits: config.region.limits(),
            constraints: config.camera.constraints(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

/// Read-only snapshot for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    pub state: StateTag,
    /// Selection rectangle in display space, while a photo is being framed
    pub region: Option<Rectangle>,
    pub drag: DragKind,
    /// Native size of the photo on screen
    pub photo_size: Option<(u32, u32)>,
    pub ocr_text: Option<&'a str>,
    pub matched: Option<&'a Question>,
    pub progress: Option<&'a OcrProgress>,
    pub error: Option<&'a str>,
    /// Last non-fatal problem, e.g. camera denied
    pub notice: Option<&'a str>,
    pub available: Vec<SessionCommand>,
}

/// One capture-to-match session.
pub struct CaptureSession {
    state: CaptureState,
    camera: Box<dyn Camera>,
    stream: Option<CameraGuard>,
    selector: Option<RegionSelector>,
    /// Selection handed to the last recognition, restored on dismiss
    parked: Option<RegionSelector>,
    engine: Arc<dyn OcrEngine>,
    bank: Arc<QuestionBank>,
    settings: SessionSettings,
    task: Option<RecognitionTask>,
    /// Native crop region of the running or last recognition
    native_region: Option<Rectangle>,
    progress: Option<OcrProgress>,
    notice: Option<String>,
    history: Option<ScanHistory>,
    progress_listener: Option<Box<dyn FnMut(&OcrProgress)>>,
}

impl CaptureSession {
    pub fn new(
        camera: Box<dyn Camera>,
        engine: Arc<dyn OcrEngine>,
        bank: Arc<QuestionBank>,
        settings: SessionSettings,
    ) -> Self {
        log::info!(
            "Session created (engine: {}, language: {}, {} questions)",
            engine.name(),
            settings.language,
            bank.len()
        );
        Self {
            state: CaptureState::Idle,
            camera,
            stream: None,
            selector: None,
            parked: None,
            engine,
            bank,
            settings,
            task: None,
            native_region: None,
            progress: None,
            notice: None,
            history: None,
            progress_listener: None,
        }
    }

    /// Appends every finished scan to `history`.
    pub fn with_history(mut self, history: ScanHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Calls `listener` for every progress event picked up by [`Self::poll`].
    pub fn on_progress(&mut self, listener: impl FnMut(&OcrProgress) + 'static) {
        self.progress_listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn tag(&self) -> StateTag {
        self.state.tag()
    }

    pub fn selector(&self) -> Option<&RegionSelector> {
        self.selector.as_ref()
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn view(&self) -> SessionView<'_> {
        let (ocr_text, matched) = match &self.state {
            CaptureState::Result {
                ocr_text, matched, ..
            } => (Some(ocr_text.as_str()), matched.as_ref()),
            _ => (None, None),
        };
        let error = match &self.state {
            CaptureState::Error { reason } => Some(reason.as_str()),
            _ => None,
        };

        SessionView {
            state: self.tag(),
            region: self.selector.map(|s| s.rect()),
            drag: self.selector.map(|s| s.drag()).unwrap_or_default(),
            photo_size: self.state.photo().map(|p| (p.width(), p.height())),
            ocr_text,
            matched,
            progress: self.progress.as_ref(),
            error,
            notice: self.notice.as_deref(),
            available: self.tag().available_commands(),
        }
    }

    /// Turns the camera on.
    ///
    /// On failure the session stays idle and the reason is kept as a notice.
    pub fn start_camera(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::StartCamera)?;
        self.open_stream()?;
        self.transition(CaptureState::Streaming);
        Ok(())
    }

    /// Turns the camera off without capturing.
    pub fn stop_camera(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::StopCamera)?;
        self.stream = None;
        self.transition(CaptureState::Idle);
        Ok(())
    }

    /// Freezes the current frame and releases the camera.
    pub fn take_photo(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::TakePhoto)?;

        let frame = self
            .stream
            .as_mut()
            .and_then(|s| s.current_frame())
            .filter(|f| f.width() > 0 && f.height() > 0);
        let Some(frame) = frame else {
            let err = ScanError::NoActiveFrame;
            log::warn!("Capture failed: {}", err);
            self.notice = Some(err.to_string());
            return Err(err);
        };

        // Release before the photo goes on screen; a still needs no stream.
        self.stream = None;
        log::info!("Captured {}x{} photo", frame.width(), frame.height());

        let photo: Photo = Arc::new(frame);
        self.parked = None;
        self.selector = Some(self.new_selector(&photo));
        self.notice = None;
        self.transition(CaptureState::Captured { photo });
        Ok(())
    }

    /// Discards the photo (and any result) and turns the camera back on.
    ///
    /// If the camera cannot be reopened the session falls back to idle.
    pub fn retake(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::Retake)?;
        self.selector = None;
        self.parked = None;
        self.progress = None;

        match self.open_stream() {
            Ok(()) => {
                self.transition(CaptureState::Streaming);
                Ok(())
            }
            Err(e) => {
                self.transition(CaptureState::Idle);
                Err(e)
            }
        }
    }

    /// Starts cropping and recognizing the selected region.
    ///
    /// Returns `Ok(false)` when a recognition is already running; at most one
    /// runs per session. Crop and scaling problems are reported through the
    /// `Error` state, not as an `Err`.
    pub fn process(&mut self) -> Result<bool, ScanError> {
        if matches!(self.state, CaptureState::Processing { .. }) {
            log::debug!("Process ignored: recognition already running");
            return Ok(false);
        }
        self.ensure_permitted(SessionCommand::Process)?;

        let CaptureState::Captured { photo } = &self.state else {
            return Err(self.not_permitted(SessionCommand::Process));
        };
        let photo = photo.clone();
        let Some(selector) = self.selector.take() else {
            return Err(self.not_permitted(SessionCommand::Process));
        };

        let region = selector.rect();
        let container = selector.container();
        self.parked = Some(selector);

        let scale = match ScaleFactors::from_dimensions(
            photo.width() as f64,
            photo.height() as f64,
            container.width,
            container.height,
        ) {
            Ok(scale) => scale,
            Err(e) => {
                self.fail(e, None);
                return Ok(true);
            }
        };
        let native = to_native_rect(&region, &scale);
        log::info!(
            "Processing region ({:.1}, {:.1}, {:.1}x{:.1}) -> native ({:.1}, {:.1}, {:.1}x{:.1})",
            region.x,
            region.y,
            region.width,
            region.height,
            native.x,
            native.y,
            native.width,
            native.height
        );

        let engine = Arc::clone(&self.engine);
        let language = self.settings.language.clone();
        let task_photo = photo.clone();
        let task = RecognitionTask::spawn(move |report, cancel| {
            report(OcrProgress::new("cropping", 0.0));
            let cropped = crop_region(&task_photo, &native)?;
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled("cancelled after crop".to_string()));
            }
            engine.recognize(&cropped, &language, report, cancel)
        });

        self.task = Some(task);
        self.native_region = Some(native);
        self.progress = None;
        self.transition(CaptureState::Processing { photo, region });
        Ok(true)
    }

    /// Closes the result and returns to the photo, keeping the region the
    /// user had framed.
    pub fn dismiss(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::Dismiss)?;
        let CaptureState::Result { photo, .. } = &self.state else {
            return Err(self.not_permitted(SessionCommand::Dismiss));
        };
        let photo = photo.clone();

        let mut selector = match self.parked.take() {
            Some(parked) => parked,
            None => self.new_selector(&photo),
        };
        selector.end();
        self.selector = Some(selector);
        self.progress = None;
        self.transition(CaptureState::Captured { photo });
        Ok(())
    }

    /// Abandons the running recognition. Its result, if any, is discarded.
    pub fn cancel_processing(&mut self, reason: &str) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::Cancel)?;
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.fail(ScanError::Cancelled(reason.to_string()), self.native_region);
        Ok(())
    }

    /// Drops the photo, stops the camera and any recognition, and goes idle.
    pub fn reset(&mut self) -> Result<(), ScanError> {
        self.ensure_permitted(SessionCommand::Reset)?;
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.stream = None;
        self.selector = None;
        self.parked = None;
        self.progress = None;
        self.native_region = None;
        self.notice = None;
        self.transition(CaptureState::Idle);
        Ok(())
    }

    /// Reports where and how large the photo is rendered.
    ///
    /// Must be called whenever the photo is (re)laid out; the region is
    /// re-fitted and the crop scale is derived from this size.
    pub fn layout(&mut self, bounds: ContainerBounds) {
        if !bounds.is_finite() {
            log::warn!("Ignoring non-finite layout {:?}", bounds);
            return;
        }
        if let Some(selector) = self.selector.as_mut().or(self.parked.as_mut()) {
            selector.set_container(bounds);
        }
    }

    /// Feeds a pointer gesture to the region selector.
    ///
    /// Returns `false` when no photo is being framed.
    pub fn gesture(&mut self, event: SelectorEvent) -> bool {
        if !matches!(self.state, CaptureState::Captured { .. }) {
            return false;
        }
        match self.selector.as_mut() {
            Some(selector) => {
                *selector = selector.apply(event);
                true
            }
            None => false,
        }
    }

    /// Picks up progress and the outcome of a running recognition without
    /// blocking. Returns `true` if the session left `Processing`.
    pub fn poll(&mut self) -> bool {
        let Self {
            task,
            progress,
            progress_listener,
            ..
        } = self;
        let Some(running) = task.as_mut() else {
            return false;
        };

        let polled = running.poll_with(|p| {
            *progress = Some(p.clone());
            if let Some(listener) = progress_listener.as_mut() {
                listener(p);
            }
        });

        match polled {
            TaskPoll::Pending => false,
            TaskPoll::Finished(outcome) => {
                self.task = None;
                self.complete(outcome);
                true
            }
        }
    }

    /// Blocks until the running recognition finishes.
    pub fn wait(&mut self) {
        if let Some(mut task) = self.task.take() {
            let outcome = task.wait();
            self.progress = task.progress().cloned();
            self.complete(outcome);
        }
    }

    /// Blocks for at most `timeout`. Returns `true` if the session left
    /// `Processing`; on timeout the recognition keeps running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        let Some(task) = self.task.as_mut() else {
            return false;
        };
        match task.wait_timeout(timeout) {
            Some(outcome) => {
                self.progress = task.progress().cloned();
                self.task = None;
                self.complete(outcome);
                true
            }
            None => {
                self.progress = task.progress().cloned();
                false
            }
        }
    }

    fn complete(&mut self, outcome: TaskOutcome) {
        let CaptureState::Processing { photo, .. } = &self.state else {
            log::debug!("Dropping recognition outcome; session is {}", self.state);
            return;
        };
        let photo = photo.clone();
        let region = self.native_region;

        match outcome {
            Ok(text) => {
                let matched = find_match(&text, &self.bank).cloned();
                match &matched {
                    Some(q) => log::info!("Matched question {}", q.id),
                    None => log::info!("No question matched the recognized text"),
                }
                self.record(
                    if matched.is_some() { "matched" } else { "no_match" },
                    matched.as_ref().map(|q| q.id),
                    region,
                    &text,
                );
                self.transition(CaptureState::Result {
                    photo,
                    ocr_text: text,
                    matched,
                });
            }
            Err(ScanError::RecognitionFailed(reason)) => {
                log::warn!("Recognition failed: {}", reason);
                self.record("recognition_failed", None, region, &reason);
                self.notice = Some(reason);
                let ocr_text = self.settings.failure_text.clone();
                self.transition(CaptureState::Result {
                    photo,
                    ocr_text,
                    matched: None,
                });
            }
            Err(e) => self.fail(e, region),
        }
    }

    fn fail(&mut self, err: ScanError, region: Option<Rectangle>) {
        log::error!("Scan failed: {}", err);
        let reason = err.to_string();
        self.record("error", None, region, &reason);
        self.transition(CaptureState::Error { reason });
    }

    fn record(&self, outcome: &'static str, question_id: Option<u64>, region: Option<Rectangle>, text: &str) {
        let Some(history) = &self.history else {
            return;
        };
        let record = ScanRecord {
            scanned_at: Local::now(),
            outcome,
            question_id,
            region,
            ocr_text: text.to_string(),
        };
        if let Err(e) = history.append(&record) {
            log::warn!("Failed to append to {}: {:#}", history.path().display(), e);
        }
    }

    fn open_stream(&mut self) -> Result<(), ScanError> {
        match self.camera.acquire(&self.settings.constraints) {
            Ok(source) => {
                self.stream = Some(CameraGuard::new(source));
                self.notice = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Camera unavailable: {}", e);
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn new_selector(&self, photo: &Photo) -> RegionSelector {
        // Until the front end reports a layout, assume the photo is shown 1:1.
        let container = ContainerBounds::at_origin(photo.width() as f64, photo.height() as f64);
        RegionSelector::new(self.settings.default_region, container, self.settings.limits)
    }

    fn ensure_permitted(&self, command: SessionCommand) -> Result<(), ScanError> {
        if self.tag().permits(command) {
            Ok(())
        } else {
            Err(self.not_permitted(command))
        }
    }

    fn not_permitted(&self, command: SessionCommand) -> ScanError {
        let err = ScanError::NotPermitted {
            command: command.name(),
            state: self.tag().name(),
        };
        log::debug!("{}", err);
        err
    }

    fn transition(&mut self, next: CaptureState) {
        log::info!("Session: {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        if self.stream.take().is_some() {
            log::debug!("Session closed with camera open");
        }
    }
}
