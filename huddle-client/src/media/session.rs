use crate::media::source::{MediaConstraints, MediaError, MediaSource};
use crate::media::track::{CaptureStream, LocalTrack, MediaKind};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaSnapshot {
    pub viewer: bool,
    pub audio: Option<bool>,
    pub video: Option<bool>,
}

/// The local capture handle and its per-kind enabled state.
///
/// With no stream the session is in viewer mode: links are opened
/// receive-only and toggles report `None`.
#[derive(Debug, Default)]
pub struct LocalMediaSession {
    stream: Option<CaptureStream>,
}

impl LocalMediaSession {
    pub fn viewer() -> Self {
        Self { stream: None }
    }

    pub fn with_stream(stream: CaptureStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Try each entry of [`MediaConstraints::FALLBACK_CHAIN`] in turn. Never fails.
    pub async fn acquire(source: &dyn MediaSource) -> Self {
        match try_chain(source).await {
            Ok(stream) => Self::with_stream(stream),
            Err(e) => {
                warn!("No local capture available ({}), entering viewer mode", e);
                Self::viewer()
            }
        }
    }

    pub fn is_viewer(&self) -> bool {
        self.stream.as_ref().is_none_or(|s| s.tracks.is_empty())
    }

    pub fn tracks(&self) -> Vec<LocalTrack> {
        self.stream
            .as_ref()
            .map(|s| s.tracks.clone())
            .unwrap_or_default()
    }

    pub fn track(&self, kind: MediaKind) -> Option<&LocalTrack> {
        self.stream.as_ref().and_then(|s| s.track(kind))
    }

    pub fn is_enabled(&self, kind: MediaKind) -> Option<bool> {
        self.track(kind).map(LocalTrack::is_enabled)
    }

    /// Flip the enabled flag of the `kind` track. Returns the new value, or
    /// `None` when no such track is held.
    pub fn toggle(&self, kind: MediaKind) -> Option<bool> {
        let track = self.track(kind)?;
        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        Some(enabled)
    }

    pub fn toggle_audio(&self) -> Option<bool> {
        self.toggle(MediaKind::Audio)
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.toggle(MediaKind::Video)
    }

    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) -> Option<bool> {
        let track = self.track(kind)?;
        track.set_enabled(enabled);
        Some(enabled)
    }

    /// Request capture again and replace the held stream wholesale.
    ///
    /// On failure the current stream is kept untouched. On success the new
    /// tracks are returned so the caller can push them into live links.
    pub async fn reacquire(
        &mut self,
        source: &dyn MediaSource,
    ) -> Result<Vec<LocalTrack>, MediaError> {
        let stream = try_chain(source).await?;
        let tracks = stream.tracks.clone();
        info!(
            "Capture replaced: stream {} with {} track(s)",
            stream.id,
            tracks.len()
        );
        self.stream = Some(stream);
        Ok(tracks)
    }

    pub fn snapshot(&self) -> MediaSnapshot {
        MediaSnapshot {
            viewer: self.is_viewer(),
            audio: self.is_enabled(MediaKind::Audio),
            video: self.is_enabled(MediaKind::Video),
        }
    }
}

async fn try_chain(source: &dyn MediaSource) -> Result<CaptureStream, MediaError> {
    let mut last_error = MediaError::Unavailable("no capture attempted".into());

    for constraints in MediaConstraints::FALLBACK_CHAIN {
        match source.acquire(constraints).await {
            Ok(stream) if !stream.tracks.is_empty() => {
                info!(
                    "Capture acquired (audio: {}, video: {})",
                    constraints.audio, constraints.video
                );
                return Ok(stream);
            }
            Ok(_) => {
                last_error = MediaError::Unavailable("capture returned no tracks".into());
            }
            Err(e) => {
                warn!(
                    "Capture failed (audio: {}, video: {}): {}",
                    constraints.audio, constraints.video, e
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}
