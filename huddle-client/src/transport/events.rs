use crate::link::{ConnectivityStatus, TimerKind};
use crate::render::RemoteTrack;
use huddle_core::{IceCandidate, PeerId, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Something that happened on one link, outside the engine's own loop.
pub enum LinkEventKind {
    Connectivity(ConnectivityStatus),
    LocalCandidate(IceCandidate),
    RemoteTrack(Arc<dyn RemoteTrack>),
    /// Our offer or answer is ready to be sent.
    LocalDescription(SessionDescription),
    /// The remote answer was applied to an initiator connection.
    AnswerApplied,
    NegotiationFailed(String),
    Timer(TimerKind),
}

impl fmt::Debug for LinkEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEventKind::Connectivity(status) => write!(f, "Connectivity({:?})", status),
            LinkEventKind::LocalCandidate(_) => write!(f, "LocalCandidate"),
            LinkEventKind::RemoteTrack(track) => write!(f, "RemoteTrack({})", track.id()),
            LinkEventKind::LocalDescription(desc) => write!(f, "LocalDescription({:?})", desc.kind),
            LinkEventKind::AnswerApplied => write!(f, "AnswerApplied"),
            LinkEventKind::NegotiationFailed(reason) => write!(f, "NegotiationFailed({})", reason),
            LinkEventKind::Timer(kind) => write!(f, "Timer({:?})", kind),
        }
    }
}

#[derive(Debug)]
pub struct LinkEvent {
    pub peer: PeerId,
    pub generation: u64,
    pub kind: LinkEventKind,
}

/// Emitter handed to a connection and to timers.
///
/// Every event carries the generation it was created for; the engine drops
/// events whose generation no longer matches the live link.
#[derive(Clone)]
pub struct LinkEvents {
    peer: PeerId,
    generation: u64,
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl LinkEvents {
    pub fn new(peer: PeerId, generation: u64, tx: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self {
            peer,
            generation,
            tx,
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the engine is gone.
    pub fn emit(&self, kind: LinkEventKind) -> bool {
        self.tx
            .send(LinkEvent {
                peer: self.peer,
                generation: self.generation,
                kind,
            })
            .is_ok()
    }
}
