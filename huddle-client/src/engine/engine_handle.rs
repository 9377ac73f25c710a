use crate::engine::{EngineCommand, EngineSnapshot};
use crate::transport::ConnectionStats;
use anyhow::{Context, Result};
use huddle_core::PeerId;
use tokio::sync::{mpsc, oneshot};

/// Cloneable entry point into the engine's event loop.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<EngineCommand>) -> Self {
        Self { command_tx }
    }

    /// Returns the new enabled state, `None` without a local audio track.
    pub async fn toggle_audio(&self) -> Result<Option<bool>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::ToggleAudio { reply }).await?;
        rx.await.context("Engine dropped the toggle request")
    }

    pub async fn toggle_video(&self) -> Result<Option<bool>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::ToggleVideo { reply }).await?;
        rx.await.context("Engine dropped the toggle request")
    }

    pub async fn reacquire_media(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::ReacquireMedia { reply }).await?;
        rx.await
            .context("Engine dropped the media request")?
            .context("Capture request failed")
    }

    pub async fn switch_profile(&self, name: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::SwitchProfile {
            name: name.into(),
            reply,
        })
        .await?;
        rx.await
            .context("Engine dropped the profile switch")?
            .context("Profile switch rejected")
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply }).await?;
        rx.await.context("Engine dropped the snapshot request")
    }

    pub async fn stats(&self, peer: PeerId) -> Result<Option<ConnectionStats>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stats { peer, reply }).await?;
        rx.await.context("Engine dropped the stats request")
    }

    /// Tear down every link and stop the loop.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown).await
    }

    async fn send(&self, cmd: EngineCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow::anyhow!("Engine event loop is gone"))
    }
}
