use huddle_core::{ClientSignal, PeerId, RelaySignal};
use tokio::sync::{mpsc, oneshot};

/// Commands delivered to the room by the WebSocket layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A socket opened. `outbox` receives every frame addressed to it.
    Connect {
        peer_id: PeerId,
        outbox: mpsc::UnboundedSender<RelaySignal>,
    },

    /// An addressed negotiation frame from `from`.
    Relay { from: PeerId, signal: ClientSignal },

    /// The socket closed.
    Disconnect { peer_id: PeerId },

    /// Current membership in join order.
    Members { reply: oneshot::Sender<Vec<PeerId>> },
}
