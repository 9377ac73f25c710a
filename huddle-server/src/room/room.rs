use crate::room::room_command::RoomCommand;
use huddle_core::{ClientSignal, PeerId, RelaySignal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Member {
    id: PeerId,
    outbox: mpsc::UnboundedSender<RelaySignal>,
}

/// The single implicit room.
///
/// Membership is exactly the set of open sessions. A member whose outbox has
/// closed counts as gone. Commands are handled one at a time, so a joiner's
/// snapshot and the matching join broadcast can never interleave with another
/// join or leave.
pub struct Room {
    members: Vec<Member>,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl Room {
    pub fn new(command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            members: Vec::new(),
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!(
            "Command channel closed. Shutting down room with {} members.",
            self.members.len()
        );
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Connect { peer_id, outbox } => self.join(peer_id, outbox),
            RoomCommand::Relay { from, signal } => self.relay(from, signal),
            RoomCommand::Disconnect { peer_id } => self.leave(&peer_id),
            RoomCommand::Members { reply } => {
                self.drop_closed();
                let _ = reply.send(self.member_ids());
            }
        }
    }

    fn join(&mut self, peer_id: PeerId, outbox: mpsc::UnboundedSender<RelaySignal>) {
        if self.contains(&peer_id) {
            warn!("Peer {} connected twice, replacing the old session", peer_id);
            self.leave(&peer_id);
        }

        self.drop_closed();

        let snapshot = self.member_ids();
        if outbox.send(RelaySignal::Welcome(peer_id)).is_err() {
            debug!("Session {} closed before joining", peer_id);
            return;
        }
        info!(
            "Peer {} joined, {} already present",
            peer_id,
            snapshot.len()
        );
        let _ = outbox.send(RelaySignal::ExistingUsers(snapshot));

        self.members.push(Member {
            id: peer_id,
            outbox,
        });

        self.broadcast_except(&peer_id, RelaySignal::UserJoined(peer_id));
    }

    fn relay(&mut self, from: PeerId, signal: ClientSignal) {
        if !self.contains(&from) {
            debug!("Dropping frame from unregistered session {}", from);
            return;
        }

        let (to, delivered) = signal.stamp(from);

        let Some(target) = self.members.iter().find(|m| m.id == to) else {
            debug!("Dropping frame from {} to unknown peer {}", from, to);
            return;
        };

        debug!("Relaying {} -> {}", from, to);
        if target.outbox.send(delivered).is_err() {
            debug!("Outbox of {} closed, dropping the member", to);
            self.leave(&to);
        }
    }

    fn leave(&mut self, peer_id: &PeerId) {
        let Some(index) = self.members.iter().position(|m| &m.id == peer_id) else {
            return;
        };

        self.members.remove(index);
        info!(
            "Peer {} left, {} remaining",
            peer_id,
            self.members.len()
        );

        self.broadcast_except(peer_id, RelaySignal::UserLeft(*peer_id));
    }

    fn broadcast_except(&mut self, skip: &PeerId, signal: RelaySignal) {
        for member in self.members.iter().filter(|m| &m.id != skip) {
            let _ = member.outbox.send(signal.clone());
        }
        self.drop_closed();
    }

    fn drop_closed(&mut self) {
        let closed: Vec<PeerId> = self
            .members
            .iter()
            .filter(|m| m.outbox.is_closed())
            .map(|m| m.id)
            .collect();

        for peer_id in closed {
            debug!("Outbox of {} closed, dropping the member", peer_id);
            self.leave(&peer_id);
        }
    }

    fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.iter().any(|m| &m.id == peer_id)
    }

    fn member_ids(&self) -> Vec<PeerId> {
        self.members.iter().map(|m| m.id).collect()
    }
}
