use async_trait::async_trait;
use huddle_client::render::{RemoteStream, RenderSink};
use huddle_client::signaling::SignalingOutput;
use huddle_core::{IceCandidate, PeerId, SdpKind, SessionDescription};
use std::time::Duration;
use tokio::sync::mpsc;

pub const EVENT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Offer(PeerId),
    Answer(PeerId),
    Ice(PeerId, String),
}

/// Signaling output that hands every outbound frame to the test.
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<Sent>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Sent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_offer(&self, to: PeerId, description: SessionDescription) {
        assert_eq!(description.kind, SdpKind::Offer);
        let _ = self.tx.send(Sent::Offer(to));
    }

    async fn send_answer(&self, to: PeerId, description: SessionDescription) {
        assert_eq!(description.kind, SdpKind::Answer);
        let _ = self.tx.send(Sent::Answer(to));
    }

    async fn send_ice(&self, to: PeerId, candidate: IceCandidate) {
        let _ = self.tx.send(Sent::Ice(to, candidate.candidate));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Stream(PeerId, usize),
    Removed(PeerId),
}

pub struct MockRenderSink {
    tx: mpsc::UnboundedSender<Rendered>,
}

impl MockRenderSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Rendered>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RenderSink for MockRenderSink {
    fn on_stream(&self, peer: PeerId, stream: RemoteStream) {
        let _ = self.tx.send(Rendered::Stream(peer, stream.tracks.len()));
    }

    fn on_removed(&self, peer: PeerId) {
        let _ = self.tx.send(Rendered::Removed(peer));
    }
}

/// Next item, or `None` if nothing arrives within [`EVENT_TIMEOUT`].
pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Option<T> {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .ok()
        .flatten()
}

/// Everything that arrives until the channel stays quiet for [`EVENT_TIMEOUT`].
pub async fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Some(item) = recv_within(rx).await {
        items.push(item);
    }
    items
}
