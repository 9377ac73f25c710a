use async_trait::async_trait;
use huddle_core::{IceCandidate, PeerId, SessionDescription};

/// Outbound half of the signaling channel, as seen by the engine.
///
/// Sends are fire-and-forget: a frame that cannot be delivered is dropped
/// and the link's own timeouts take over.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, to: PeerId, description: SessionDescription);

    async fn send_answer(&self, to: PeerId, description: SessionDescription);

    async fn send_ice(&self, to: PeerId, candidate: IceCandidate);
}
