use crate::link::ConnectivityStatus;
use crate::media::LocalTrack;
use crate::transport::events::LinkEvents;
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{ConnectivityProfile, IceCandidate, PeerId, SessionDescription};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub status: ConnectivityStatus,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub round_trip_time: Option<Duration>,
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self {
            status: ConnectivityStatus::New,
            bytes_sent: 0,
            bytes_received: 0,
            round_trip_time: None,
        }
    }
}

/// One negotiated media connection to a remote participant.
///
/// Status changes, local candidates and incoming tracks are reported through
/// the [`LinkEvents`] the connection was opened with.
#[async_trait]
pub trait MediaConnection: Send + Sync {
    /// Create an offer and set it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Apply a remote offer and return the answer, already set locally.
    async fn accept_offer(&self, offer: SessionDescription) -> Result<SessionDescription>;

    async fn apply_answer(&self, answer: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Swap the outgoing track of the same kind without renegotiating.
    /// Returns `false` when the connection sends nothing of that kind.
    async fn replace_track(&self, track: &LocalTrack) -> Result<bool>;

    async fn stats(&self) -> Result<ConnectionStats>;

    async fn close(&self) -> Result<()>;
}

/// Everything needed to open a connection for one attempt of one link.
#[derive(Clone)]
pub struct ConnectionRequest {
    pub peer: PeerId,
    pub generation: u64,
    pub profile: ConnectivityProfile,
    pub tracks: Vec<LocalTrack>,
    /// Viewer mode: declare receive-only intent for audio and video.
    pub receive_only: bool,
    pub events: LinkEvents,
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, request: ConnectionRequest) -> Result<Arc<dyn MediaConnection>>;
}
