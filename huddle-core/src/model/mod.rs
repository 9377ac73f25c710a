mod diagnostics;
mod peer;
mod profile;
mod signaling;

pub use diagnostics::{DiagnosticEvent, DiagnosticRecord};
pub use peer::{PeerId, PeerIdError};
pub use profile::{
    CatalogError, ConnectivityProfile, GOOGLE_STUN_PROFILE, METERED_PROFILE,
    OPENRELAY_TURN_PROFILE, PUBLIC_STUN_PROFILE, ProfileCatalog,
};
pub use signaling::{
    ClientSignal, IceCandidate, IceServerConfig, RelaySignal, SdpKind, SessionDescription,
};
