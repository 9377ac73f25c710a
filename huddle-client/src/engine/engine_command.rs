use crate::engine::EngineSnapshot;
use crate::media::MediaError;
use crate::transport::ConnectionStats;
use huddle_core::{CatalogError, PeerId};
use tokio::sync::oneshot;

/// Operator actions delivered to the engine loop.
#[derive(Debug)]
pub enum EngineCommand {
    ToggleAudio {
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleVideo {
        reply: oneshot::Sender<Option<bool>>,
    },
    /// Request capture again and push the new tracks into every link.
    ReacquireMedia {
        reply: oneshot::Sender<Result<(), MediaError>>,
    },
    /// Forget the last-known-good profile and rebuild every link on `name`.
    SwitchProfile {
        name: String,
        reply: oneshot::Sender<Result<(), CatalogError>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    Stats {
        peer: PeerId,
        reply: oneshot::Sender<Option<ConnectionStats>>,
    },
    Shutdown,
}
