use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn codec_type(self) -> RTPCodecType {
        match self {
            MediaKind::Audio => RTPCodecType::Audio,
            MediaKind::Video => RTPCodecType::Video,
        }
    }

    pub fn from_codec_type(kind: RTPCodecType) -> Option<Self> {
        match kind {
            RTPCodecType::Audio => Some(MediaKind::Audio),
            RTPCodecType::Video => Some(MediaKind::Video),
            _ => None,
        }
    }

    fn codec(self) -> RTCRtpCodecCapability {
        match self {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One outgoing capture track.
///
/// Clones share the enabled flag and the underlying sample track, so every
/// link sending this track observes a toggle immediately.
#[derive(Clone)]
pub struct LocalTrack {
    id: String,
    kind: MediaKind,
    enabled: Arc<AtomicBool>,
    source: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        let id = id.into();
        let source = Arc::new(TrackLocalStaticSample::new(
            kind.codec(),
            id.clone(),
            stream_id.into(),
        ));

        Self {
            id,
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
            source,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn source(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.source)
    }

    /// Push one encoded frame to every connection carrying this track.
    /// Frames written while the track is disabled are dropped.
    pub async fn write_sample(&self, sample: &Sample) -> Result<(), webrtc::Error> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.source.write_sample(sample).await
    }

    pub async fn write_frame(&self, data: Bytes, duration: Duration) -> Result<(), webrtc::Error> {
        self.write_sample(&Sample {
            data,
            duration,
            ..Default::default()
        })
        .await
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// A capture handle as returned by a [`MediaSource`](super::MediaSource).
#[derive(Debug, Clone)]
pub struct CaptureStream {
    pub id: String,
    pub tracks: Vec<LocalTrack>,
}

impl CaptureStream {
    pub fn track(&self, kind: MediaKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|track| track.kind() == kind)
    }
}
