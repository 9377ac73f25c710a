pub mod credentials;
pub mod diagnostics;
pub mod engine;
pub mod link;
pub mod media;
pub mod registry;
pub mod render;
pub mod rotator;
pub mod signaling;
pub mod transport;

pub use engine::{CallEngine, EngineConfig, EngineHandle, EngineParts, EngineSnapshot, RelayStatus};
pub use link::{ConnectivityStatus, LinkSnapshot, LinkState, Role};
pub use media::{LocalMediaSession, MediaSource, NoCaptureSource};
pub use signaling::{
    ReconnectPolicy, RelayClient, RelayClientError, RelayEvent, RelayHandle, SignalingOutput,
};
pub use transport::{ConnectionFactory, MediaConnection, WebRtcConnectionFactory};
