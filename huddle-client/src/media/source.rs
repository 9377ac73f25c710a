use crate::media::track::{CaptureStream, MediaKind};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const BOTH: Self = Self {
        audio: true,
        video: true,
    };
    pub const AUDIO_ONLY: Self = Self {
        audio: true,
        video: false,
    };
    pub const VIDEO_ONLY: Self = Self {
        audio: false,
        video: true,
    };

    /// Order in which capture is attempted before falling back to viewer mode.
    pub const FALLBACK_CHAIN: [Self; 3] = [Self::BOTH, Self::AUDIO_ONLY, Self::VIDEO_ONLY];

    pub fn wants(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to capture was denied")]
    PermissionDenied,
    #[error("no {0} device available")]
    NoDevice(MediaKind),
    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

/// Provider of local capture streams.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<CaptureStream, MediaError>;
}

/// Source for headless participants. Every request fails, so the session
/// always lands in viewer mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCaptureSource;

#[async_trait]
impl MediaSource for NoCaptureSource {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<CaptureStream, MediaError> {
        let kind = if constraints.video {
            MediaKind::Video
        } else {
            MediaKind::Audio
        };
        Err(MediaError::NoDevice(kind))
    }
}
