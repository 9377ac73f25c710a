use crate::room::{Room, RoomCommand};
use anyhow::{Context, Result};
use huddle_core::{ClientSignal, PeerId, RelaySignal};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Cloneable entry point into the room's event loop.
#[derive(Clone)]
pub struct RoomHandle {
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Create the room and start its loop. The loop ends once every handle is dropped.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        info!("Creating room");
        let (tx, rx) = mpsc::channel(256);
        let task = tokio::spawn(Room::new(rx).run());
        (Self { command_tx: tx }, task)
    }

    pub async fn connect(
        &self,
        peer_id: PeerId,
        outbox: mpsc::UnboundedSender<RelaySignal>,
    ) -> Result<()> {
        self.send(RoomCommand::Connect { peer_id, outbox }).await
    }

    pub async fn relay(&self, from: PeerId, signal: ClientSignal) -> Result<()> {
        self.send(RoomCommand::Relay { from, signal }).await
    }

    pub async fn disconnect(&self, peer_id: PeerId) -> Result<()> {
        self.send(RoomCommand::Disconnect { peer_id }).await
    }

    pub async fn members(&self) -> Result<Vec<PeerId>> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Members { reply }).await?;
        rx.await.context("Room dropped the membership request")
    }

    async fn send(&self, cmd: RoomCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow::anyhow!("Room event loop is gone"))
    }
}
