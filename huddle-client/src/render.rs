use crate::media::MediaKind;
use huddle_core::PeerId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Incoming media track of one remote participant.
pub trait RemoteTrack: Send + Sync {
    fn id(&self) -> String;
    fn stream_id(&self) -> String;
    fn kind(&self) -> Option<MediaKind>;

    /// Access to the concrete track, e.g. to start reading RTP from it.
    fn as_any(&self) -> &dyn Any;
}

/// Everything received from one remote participant so far.
#[derive(Clone, Default)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<Arc<dyn RemoteTrack>>,
}

impl RemoteStream {
    /// Add `track`, replacing any earlier track of the same kind.
    pub fn upsert(&mut self, track: Arc<dyn RemoteTrack>) {
        if self.id.is_empty() {
            self.id = track.stream_id();
        }
        let kind = track.kind();
        self.tracks.retain(|existing| kind.is_none() || existing.kind() != kind);
        self.tracks.push(track);
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == Some(kind))
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("RemoteStream")
            .field("id", &self.id)
            .field("tracks", &ids)
            .finish()
    }
}

/// Receives remote media for display. Calls must return promptly.
pub trait RenderSink: Send + Sync {
    /// First negotiated media of `peer`, and every later replacement.
    fn on_stream(&self, peer: PeerId, stream: RemoteStream);

    fn on_removed(&self, peer: PeerId);
}

/// Render sink for headless participants.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRenderSink;

impl RenderSink for LoggingRenderSink {
    fn on_stream(&self, peer: PeerId, stream: RemoteStream) {
        info!(
            "Media from {}: stream {} ({} track(s))",
            peer,
            stream.id,
            stream.tracks.len()
        );
    }

    fn on_removed(&self, peer: PeerId) {
        info!("Media from {} removed", peer);
    }
}
