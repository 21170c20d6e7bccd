//! Capture session states and the commands each one accepts.

use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

use crate::geometry::Rectangle;
use crate::questions::Question;

/// A captured still, shared between states without copying pixels.
pub type Photo = Arc<RgbaImage>;

/// Capture session state.
#[derive(Clone, Debug)]
pub enum CaptureState {
    /// Camera off, nothing captured
    Idle,
    /// Camera on, showing the live stream
    Streaming,
    /// Still photo on screen, region selection active
    Captured { photo: Photo },
    /// Crop and recognition running in the background
    Processing { photo: Photo, region: Rectangle },
    /// Recognition finished; `matched` is `None` when no question matched
    Result {
        photo: Photo,
        ocr_text: String,
        matched: Option<Question>,
    },
    /// Pipeline failed before producing a result
    Error { reason: String },
}

impl CaptureState {
    pub fn tag(&self) -> StateTag {
        match self {
            Self::Idle => StateTag::Idle,
            Self::Streaming => StateTag::Streaming,
            Self::Captured { .. } => StateTag::Captured,
            Self::Processing { .. } => StateTag::Processing,
            Self::Result { .. } => StateTag::Result,
            Self::Error { .. } => StateTag::Error,
        }
    }

    /// The photo held by this state, if any.
    pub fn photo(&self) -> Option<&Photo> {
        match self {
            Self::Captured { photo } | Self::Processing { photo, .. } | Self::Result { photo, .. } => {
                Some(photo)
            }
            _ => None,
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Captured { photo } => write!(f, "Captured ({}x{})", photo.width(), photo.height()),
            Self::Processing { .. } => write!(f, "Processing"),
            Self::Result { matched: Some(q), .. } => write!(f, "Result: question {}", q.id),
            Self::Result { matched: None, .. } => write!(f, "Result: no match"),
            Self::Error { reason } => write!(f, "Error: {}", reason),
        }
    }
}

/// Fieldless view of a state, for permission checks and presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateTag {
    Idle,
    Streaming,
    Captured,
    Processing,
    Result,
    Error,
}

impl StateTag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Captured => "captured",
            Self::Processing => "processing",
            Self::Result => "showing a result",
            Self::Error => "in error",
        }
    }

    /// Whether `command` is a valid user action in this state.
    ///
    /// `Process` is not offered while already processing; invoking it anyway
    /// is a harmless no-op rather than an error.
    pub fn permits(&self, command: SessionCommand) -> bool {
        use SessionCommand as C;
        match self {
            Self::Idle => matches!(command, C::StartCamera),
            Self::Streaming => matches!(command, C::StopCamera | C::TakePhoto | C::Reset),
            Self::Captured => matches!(command, C::Retake | C::Process | C::Reset),
            Self::Processing => matches!(command, C::Cancel | C::Reset),
            Self::Result => matches!(command, C::Retake | C::Dismiss | C::Reset),
            Self::Error => matches!(command, C::Retake | C::Reset),
        }
    }

    /// All commands valid in this state, in a stable order.
    pub fn available_commands(&self) -> Vec<SessionCommand> {
        SessionCommand::ALL
            .iter()
            .copied()
            .filter(|c| self.permits(*c))
            .collect()
    }
}

/// User commands accepted by a capture session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionCommand {
    StartCamera,
    StopCamera,
    TakePhoto,
    Retake,
    Process,
    /// Close the result without discarding the photo
    Dismiss,
    /// Abandon a running recognition
    Cancel,
    /// Drop everything and go back to idle
    Reset,
}

impl SessionCommand {
    pub const ALL: [SessionCommand; 8] = [
        Self::StartCamera,
        Self::StopCamera,
        Self::TakePhoto,
        Self::Retake,
        Self::Process,
        Self::Dismiss,
        Self::Cancel,
        Self::Reset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartCamera => "start camera",
            Self::StopCamera => "stop camera",
            Self::TakePhoto => "take photo",
            Self::Retake => "retake",
            Self::Process => "process",
            Self::Dismiss => "dismiss",
            Self::Cancel => "cancel",
            Self::Reset => "reset",
        }
    }
}
