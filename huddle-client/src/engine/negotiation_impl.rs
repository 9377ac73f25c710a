use crate::engine::{CallEngine, close_quietly};
use crate::link::{Role, TimerKind};
use crate::transport::{ConnectionRequest, LinkEventKind, MediaConnection};
use huddle_core::{DiagnosticEvent, IceCandidate, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CallEngine {
    /// Start a fresh attempt on `peer`'s link: new generation, new connection.
    ///
    /// The previous connection is closed first. An initiator sends its offer
    /// as soon as the connection exists; a responder waits for one.
    pub(super) async fn open_attempt(&mut self, peer: PeerId, role: Role) {
        let generation = self.next_generation();
        let receive_only = self.media.is_viewer();
        let tracks = self.media.tracks();

        let Some(link) = self.registry.get_mut(&peer) else {
            return;
        };
        let previous = link.begin_attempt(generation, role, receive_only);
        let profile = link.profile().clone();
        close_quietly(previous).await;

        debug!(
            "Opening attempt {} to {} as {:?} on {}",
            generation, peer, role, profile.name
        );
        let request = ConnectionRequest {
            peer,
            generation,
            profile,
            tracks,
            receive_only,
            events: self.events_for(peer, generation),
        };
        let opened = self.factory.open(request).await;

        let timer = self.schedule(
            peer,
            generation,
            TimerKind::NegotiationTimeout,
            self.config.negotiation_timeout,
        );

        // The link may have been removed or superseded while opening.
        let Some(link) = self
            .registry
            .get_mut(&peer)
            .filter(|link| link.generation() == generation)
        else {
            if let Ok(connection) = opened {
                close_quietly(Some(connection)).await;
            }
            return;
        };

        match opened {
            Ok(connection) => {
                link.attach(Arc::clone(&connection), timer);
                if role == Role::Initiator {
                    self.spawn_offer(peer, generation, connection);
                }
            }
            Err(e) => {
                drop(timer);
                warn!("Could not open connection to {}: {:#}", peer, e);
                self.fail_link(peer, format!("opening connection: {}", e))
                    .await;
            }
        }
    }

    fn spawn_offer(&self, peer: PeerId, generation: u64, connection: Arc<dyn MediaConnection>) {
        let events = self.events_for(peer, generation);
        tokio::spawn(async move {
            let kind = match connection.create_offer().await {
                Ok(offer) => LinkEventKind::LocalDescription(offer),
                Err(e) => LinkEventKind::NegotiationFailed(format!("creating offer: {}", e)),
            };
            events.emit(kind);
        });
    }

    pub(super) async fn handle_remote_offer(&mut self, from: PeerId, offer: SessionDescription) {
        let Some(link) = self.registry.get(&from) else {
            warn!("Offer from unknown peer {}, dropping", from);
            return;
        };

        // Both sides sent an offer. The lower identity keeps its own, the
        // higher one drops its offer and answers.
        let crossed = link.role() == Role::Initiator
            && link.connection().is_some()
            && !link.is_remote_described();
        if crossed && self.keeps_own_offer(from) {
            info!("Offer from {} crossed ours, keeping ours", from);
            self.report(DiagnosticEvent::new("offer-collision", from.to_string()));
            return;
        }

        // A retrying remote starts over; so do we.
        let needs_fresh = link.connection().is_none()
            || link.role() == Role::Initiator
            || link.is_remote_described();
        if needs_fresh {
            info!("Offer from {} restarts the link as responder", from);
            self.open_attempt(from, Role::Responder).await;
        }

        let Some(link) = self.registry.get(&from) else {
            return;
        };
        let Some(connection) = link.connection() else {
            debug!("Link to {} has no connection for the offer", from);
            return;
        };

        let events = self.events_for(from, link.generation());
        tokio::spawn(async move {
            let kind = match connection.accept_offer(offer).await {
                Ok(answer) => LinkEventKind::LocalDescription(answer),
                Err(e) => LinkEventKind::NegotiationFailed(format!("answering offer: {}", e)),
            };
            events.emit(kind);
        });
    }

    pub(super) async fn handle_remote_answer(&mut self, from: PeerId, answer: SessionDescription) {
        let Some(link) = self.registry.get(&from) else {
            warn!("Answer from unknown peer {}, dropping", from);
            return;
        };
        if link.role() != Role::Initiator || link.is_remote_described() {
            debug!("Unexpected answer from {}, ignoring", from);
            return;
        }
        let Some(connection) = link.connection() else {
            debug!("Answer from {} arrived between attempts, ignoring", from);
            return;
        };

        let events = self.events_for(from, link.generation());
        tokio::spawn(async move {
            let kind = match connection.apply_answer(answer).await {
                Ok(()) => LinkEventKind::AnswerApplied,
                Err(e) => LinkEventKind::NegotiationFailed(format!("applying answer: {}", e)),
            };
            events.emit(kind);
        });
    }

    pub(super) async fn handle_remote_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        let Some(link) = self.registry.get_mut(&from) else {
            warn!("Candidate from unknown peer {}, dropping", from);
            return;
        };
        let Some(connection) = link.connection() else {
            debug!("Candidate from {} arrived between attempts, dropping", from);
            return;
        };

        if let Some(candidate) = link.queue_candidate(candidate) {
            spawn_candidates(from, connection, vec![candidate]);
        }
    }

    fn keeps_own_offer(&self, remote: PeerId) -> bool {
        self.local_id.is_some_and(|local| local < remote)
    }

    /// Our offer or answer is ready.
    pub(super) async fn on_local_description(
        &mut self,
        peer: PeerId,
        description: SessionDescription,
    ) {
        match description.kind {
            SdpKind::Offer => {
                debug!("Sending offer to {}", peer);
                self.signaling.send_offer(peer, description).await;
            }
            SdpKind::Answer => {
                // Producing an answer means the remote offer is applied.
                self.flush_candidates(peer);
                debug!("Sending answer to {}", peer);
                self.signaling.send_answer(peer, description).await;
            }
        }
    }

    /// The remote description is in place; queued candidates can go in.
    pub(super) fn flush_candidates(&mut self, peer: PeerId) {
        let Some(link) = self.registry.get_mut(&peer) else {
            return;
        };
        let pending = link.remote_description_applied();
        if let Some(connection) = link.connection()
            && !pending.is_empty()
        {
            debug!("Applying {} queued candidate(s) from {}", pending.len(), peer);
            spawn_candidates(peer, connection, pending);
        }
    }
}

fn spawn_candidates(
    peer: PeerId,
    connection: Arc<dyn MediaConnection>,
    candidates: Vec<IceCandidate>,
) {
    tokio::spawn(async move {
        for candidate in candidates {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                warn!("Rejected candidate from {}: {}", peer, e);
            }
        }
    });
}
