use crate::credentials::CredentialService;
use crate::diagnostics::DiagnosticsStore;
use crate::room::RoomHandle;
use std::sync::Arc;

struct SignalingInner {
    room: RoomHandle,
    credentials: CredentialService,
    diagnostics: DiagnosticsStore,
}

/// Shared state behind every route of the relay.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(
        room: RoomHandle,
        credentials: CredentialService,
        diagnostics: DiagnosticsStore,
    ) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                room,
                credentials,
                diagnostics,
            }),
        }
    }

    pub fn room(&self) -> &RoomHandle {
        &self.inner.room
    }

    pub fn credentials(&self) -> &CredentialService {
        &self.inner.credentials
    }

    pub fn diagnostics(&self) -> &DiagnosticsStore {
        &self.inner.diagnostics
    }
}
