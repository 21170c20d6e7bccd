//! Background recognition task.
//!
//! Runs one recognition job on its own thread and hands progress events and
//! the final outcome back over a channel. The owner polls (or waits) from its
//! own thread, so gestures and camera controls never block on OCR.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::ScanError;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Shared cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A progress report from a running recognition.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrProgress {
    /// Short stage label, e.g. "recognizing text"
    pub status: String,
    /// Fraction complete, 0.0 to 1.0
    pub progress: f32,
}

impl OcrProgress {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

/// Result of a recognition job: recognized text or the reason it failed.
pub type TaskOutcome = Result<String, ScanError>;

enum TaskMessage {
    Progress(OcrProgress),
    Finished(TaskOutcome),
}

/// State of a task as seen by its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPoll {
    Pending,
    Finished(TaskOutcome),
}

/// Handle to a recognition job running on a worker thread.
pub struct RecognitionTask {
    id: u64,
    receiver: Receiver<TaskMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
    latest_progress: Option<OcrProgress>,
    outcome: Option<TaskOutcome>,
}

impl RecognitionTask {
    /// Spawns `job` on a worker thread.
    ///
    /// The job receives a progress reporter and the task's cancel token. It
    /// should check the token between expensive steps.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce(&dyn Fn(OcrProgress), &CancelToken) -> TaskOutcome + Send + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let handle = thread::spawn(move || {
            log::debug!("Recognition task {} started", id);
            let progress_sender: Sender<TaskMessage> = sender.clone();
            let report = move |progress: OcrProgress| {
                // Owner may already be gone; progress is best-effort.
                let _ = progress_sender.send(TaskMessage::Progress(progress));
            };

            let outcome = if worker_cancel.is_cancelled() {
                Err(ScanError::Cancelled("cancelled before start".to_string()))
            } else {
                job(&report, &worker_cancel)
            };

            log::debug!("Recognition task {} finished (ok = {})", id, outcome.is_ok());
            let _ = sender.send(TaskMessage::Finished(outcome));
        });

        Self {
            id,
            receiver,
            cancel,
            handle: Some(handle),
            latest_progress: None,
            outcome: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Most recent progress report, if any arrived.
    pub fn progress(&self) -> Option<&OcrProgress> {
        self.latest_progress.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drains pending messages without blocking.
    ///
    /// `on_progress` is called for every progress event drained.
    pub fn poll_with(&mut self, mut on_progress: impl FnMut(&OcrProgress)) -> TaskPoll {
        if let Some(outcome) = &self.outcome {
            return TaskPoll::Finished(outcome.clone());
        }

        loop {
            match self.receiver.try_recv() {
                Ok(TaskMessage::Progress(progress)) => {
                    on_progress(&progress);
                    self.latest_progress = Some(progress);
                }
                Ok(TaskMessage::Finished(outcome)) => return self.finish(outcome),
                Err(TryRecvError::Empty) => return TaskPoll::Pending,
                Err(TryRecvError::Disconnected) => return self.finish(lost_worker()),
            }
        }
    }

    pub fn poll(&mut self) -> TaskPoll {
        self.poll_with(|_| {})
    }

    /// Blocks until the job finishes.
    pub fn wait(&mut self) -> TaskOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        loop {
            match self.receiver.recv() {
                Ok(TaskMessage::Progress(progress)) => self.latest_progress = Some(progress),
                Ok(TaskMessage::Finished(outcome)) => {
                    self.finish(outcome.clone());
                    return outcome;
                }
                Err(_) => {
                    self.finish(lost_worker());
                    return lost_worker();
                }
            }
        }
    }

    /// Blocks until the job finishes or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the task keeps running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<TaskOutcome> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(TaskMessage::Progress(progress)) => self.latest_progress = Some(progress),
                Ok(TaskMessage::Finished(outcome)) => {
                    self.finish(outcome.clone());
                    return Some(outcome);
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.finish(lost_worker());
                    return Some(lost_worker());
                }
            }
        }
    }

    /// Asks the job to stop. Its result, if it still produces one, is dropped
    /// by the owner.
    pub fn cancel(&mut self) {
        if self.outcome.is_none() {
            log::info!("Cancelling recognition task {}", self.id);
        }
        self.cancel.cancel();
    }

    fn finish(&mut self, outcome: TaskOutcome) -> TaskPoll {
        self.outcome = Some(outcome.clone());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Recognition task {} panicked", self.id);
            }
        }
        TaskPoll::Finished(outcome)
    }
}

impl Drop for RecognitionTask {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            // Detach: the worker notices the token and exits on its own.
            self.cancel.cancel();
        }
    }
}

fn lost_worker() -> TaskOutcome {
    Err(ScanError::RecognitionFailed(
        "recognition worker exited without a result".to_string(),
    ))
}
