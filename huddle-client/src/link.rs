use crate::render::RemoteStream;
use crate::transport::MediaConnection;
use huddle_core::{ConnectivityProfile, IceCandidate, PeerId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Per-connection status as reported by the media transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectivityStatus {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    DisconnectedGrace,
    Retrying,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Grace,
    Retry,
    NegotiationTimeout,
}

/// What the engine has to do after a status change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    None,
    /// Reached `Connected`. `recovered` is set when it came back from grace.
    Connected { recovered: bool },
    StartGrace,
    Fail,
}

/// A pending timer. Aborted when dropped.
pub struct TimerHandle(JoinHandle<()>);

impl TimerHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Observable summary of one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSnapshot {
    pub peer: PeerId,
    pub state: LinkState,
    pub role: Role,
    pub generation: u64,
    pub attempts: u32,
    pub profile: String,
    pub receive_only: bool,
}

/// The relationship between the local participant and one remote participant.
pub struct PeerLink {
    remote: PeerId,
    state: LinkState,
    role: Role,
    generation: u64,
    attempts: u32,
    profile: ConnectivityProfile,
    retry_order: Vec<ConnectivityProfile>,
    connection: Option<Arc<dyn MediaConnection>>,
    receive_only: bool,
    remote_described: bool,
    pending_candidates: Vec<IceCandidate>,
    remote_stream: RemoteStream,
    grace_timer: Option<TimerHandle>,
    retry_timer: Option<TimerHandle>,
    negotiation_timer: Option<TimerHandle>,
}

impl PeerLink {
    pub fn new(remote: PeerId, role: Role, profile: ConnectivityProfile) -> Self {
        Self {
            remote,
            state: LinkState::New,
            role,
            generation: 0,
            attempts: 0,
            profile,
            retry_order: Vec::new(),
            connection: None,
            receive_only: false,
            remote_described: false,
            pending_candidates: Vec::new(),
            remote_stream: RemoteStream::default(),
            grace_timer: None,
            retry_timer: None,
            negotiation_timer: None,
        }
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn profile(&self) -> &ConnectivityProfile {
        &self.profile
    }

    pub fn connection(&self) -> Option<Arc<dyn MediaConnection>> {
        self.connection.clone()
    }

    pub fn is_remote_described(&self) -> bool {
        self.remote_described
    }

    pub fn has_grace_timer(&self) -> bool {
        self.grace_timer.is_some()
    }

    /// Begin a fresh negotiation attempt under `generation`.
    ///
    /// Returns the previous connection handle, which the caller must close.
    pub fn begin_attempt(
        &mut self,
        generation: u64,
        role: Role,
        receive_only: bool,
    ) -> Option<Arc<dyn MediaConnection>> {
        self.generation = generation;
        self.role = role;
        self.receive_only = receive_only;
        self.state = LinkState::Connecting;
        self.remote_described = false;
        self.pending_candidates.clear();
        self.grace_timer = None;
        self.retry_timer = None;
        self.negotiation_timer = None;
        self.connection.take()
    }

    pub fn attach(&mut self, connection: Arc<dyn MediaConnection>, negotiation_timer: TimerHandle) {
        self.connection = Some(connection);
        self.negotiation_timer = Some(negotiation_timer);
    }

    /// Apply a transport status change.
    pub fn on_connectivity(&mut self, status: ConnectivityStatus) -> Reaction {
        match (self.state, status) {
            (LinkState::New | LinkState::Connecting, ConnectivityStatus::Connected) => {
                self.mark_connected();
                Reaction::Connected { recovered: false }
            }
            (LinkState::DisconnectedGrace, ConnectivityStatus::Connected) => {
                self.mark_connected();
                Reaction::Connected { recovered: true }
            }
            (LinkState::Connected, ConnectivityStatus::Disconnected) => {
                self.state = LinkState::DisconnectedGrace;
                if self.grace_timer.is_some() {
                    Reaction::None
                } else {
                    Reaction::StartGrace
                }
            }
            (
                LinkState::New
                | LinkState::Connecting
                | LinkState::Connected
                | LinkState::DisconnectedGrace,
                ConnectivityStatus::Failed,
            ) => Reaction::Fail,
            _ => Reaction::None,
        }
    }

    pub fn set_grace_timer(&mut self, timer: TimerHandle) {
        self.grace_timer = Some(timer);
    }

    /// Whether a fired timer of `kind` still applies to the current state.
    pub fn timer_applies(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Grace => self.state == LinkState::DisconnectedGrace,
            TimerKind::NegotiationTimeout => self.state == LinkState::Connecting,
            TimerKind::Retry => self.state == LinkState::Retrying,
        }
    }

    /// Count one failure. The retry order is captured on the first failure of
    /// an episode and reused until the link connects again.
    pub fn record_failure<F>(&mut self, order: F) -> (u32, &[ConnectivityProfile])
    where
        F: FnOnce() -> Vec<ConnectivityProfile>,
    {
        self.attempts += 1;
        if self.attempts == 1 || self.retry_order.is_empty() {
            self.retry_order = order();
        }
        (self.attempts, &self.retry_order)
    }

    /// Tear down the current attempt and wait for `timer` to start the next one.
    ///
    /// The generation moves to `generation` immediately so that late events
    /// from the old connection are ignored.
    pub fn schedule_retry(
        &mut self,
        generation: u64,
        profile: ConnectivityProfile,
        timer: TimerHandle,
    ) -> Option<Arc<dyn MediaConnection>> {
        let old = self.begin_attempt(generation, Role::Initiator, self.receive_only);
        self.state = LinkState::Retrying;
        self.profile = profile;
        self.retry_timer = Some(timer);
        old
    }

    pub fn abandon(&mut self) {
        self.state = LinkState::Abandoned;
    }

    /// Operator-driven restart: forget the failure episode and use `profile`.
    pub fn reset(&mut self, profile: ConnectivityProfile) {
        self.attempts = 0;
        self.retry_order.clear();
        self.profile = profile;
    }

    /// Queue a candidate until the remote description is applied.
    /// Returns it back when it can be applied right away.
    pub fn queue_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_described {
            return Some(candidate);
        }
        self.pending_candidates.push(candidate);
        None
    }

    /// Mark the remote description as applied and hand back queued candidates.
    pub fn remote_description_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_described = true;
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn remote_stream_mut(&mut self) -> &mut RemoteStream {
        &mut self.remote_stream
    }

    /// Drop timers and queued candidates and hand back the connection to close.
    pub fn teardown(&mut self) -> Option<Arc<dyn MediaConnection>> {
        self.grace_timer = None;
        self.retry_timer = None;
        self.negotiation_timer = None;
        self.pending_candidates.clear();
        self.connection.take()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            peer: self.remote,
            state: self.state,
            role: self.role,
            generation: self.generation,
            attempts: self.attempts,
            profile: self.profile.name.clone(),
            receive_only: self.receive_only,
        }
    }

    fn mark_connected(&mut self) {
        self.state = LinkState::Connected;
        self.attempts = 0;
        self.retry_order.clear();
        self.grace_timer = None;
        self.negotiation_timer = None;
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("remote", &self.remote)
            .field("state", &self.state)
            .field("role", &self.role)
            .field("generation", &self.generation)
            .field("attempts", &self.attempts)
            .field("profile", &self.profile.name)
            .finish()
    }
}
