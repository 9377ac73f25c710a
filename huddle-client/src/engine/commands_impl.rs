use crate::engine::{CallEngine, EngineCommand, EngineSnapshot};
use crate::link::Role;
use crate::media::{MediaError, MediaKind};
use crate::transport::{ConnectionStats, MediaConnection};
use huddle_core::{CatalogError, DiagnosticEvent, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CallEngine {
    pub(super) async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle(MediaKind::Audio));
            }
            EngineCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle(MediaKind::Video));
            }
            EngineCommand::ReacquireMedia { reply } => {
                let _ = reply.send(self.reacquire_media().await);
            }
            EngineCommand::SwitchProfile { name, reply } => {
                let _ = reply.send(self.switch_profile(&name).await);
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            EngineCommand::Stats { peer, reply } => {
                let _ = reply.send(self.stats(&peer).await);
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn toggle(&mut self, kind: MediaKind) -> Option<bool> {
        let enabled = self.media.toggle(kind);
        match enabled {
            Some(enabled) => info!("Local {} {}", kind, if enabled { "on" } else { "off" }),
            None => debug!("No local {} track to toggle", kind),
        }
        enabled
    }

    /// Replace the capture and swap the new tracks into live connections in place.
    async fn reacquire_media(&mut self) -> Result<(), MediaError> {
        let source = Arc::clone(&self.media_source);
        let tracks = match self.media.reacquire(source.as_ref()).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Capture request failed, keeping current media: {}", e);
                self.report(
                    DiagnosticEvent::new("media-error", "re-request failed")
                        .with_error(e.to_string()),
                );
                return Err(e);
            }
        };

        let live: Vec<(PeerId, Arc<dyn MediaConnection>)> = self
            .registry
            .iter()
            .filter_map(|link| link.connection().map(|c| (link.remote(), c)))
            .collect();

        for (peer, connection) in live {
            for track in &tracks {
                match connection.replace_track(track).await {
                    Ok(true) => debug!("Replaced {} track on link to {}", track.kind(), peer),
                    Ok(false) => info!(
                        "Link to {} sends no {}, leaving it receive-only",
                        peer,
                        track.kind()
                    ),
                    Err(e) => warn!("Replacing {} track for {} failed: {}", track.kind(), peer, e),
                }
            }
        }

        self.report(DiagnosticEvent::new(
            "media-reacquired",
            format!("{} track(s)", tracks.len()),
        ));
        Ok(())
    }

    /// Forget what worked, select `name`, and rebuild every link as initiator.
    async fn switch_profile(&mut self, name: &str) -> Result<(), CatalogError> {
        let profile = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownProfile(name.to_owned()))?;

        info!(
            "Switching to profile {}, rebuilding {} link(s)",
            profile.name,
            self.registry.len()
        );
        self.last_good = None;
        self.selected = Some(profile.clone());
        self.report(
            DiagnosticEvent::new("profile-switched", "manual").with_profile(profile.name),
        );

        for peer in self.registry.ids() {
            self.create_link(peer, Role::Initiator).await;
        }
        Ok(())
    }

    fn snapshot(&self) -> EngineSnapshot {
        let links = self
            .registry
            .ids()
            .iter()
            .filter_map(|peer| self.registry.get(peer))
            .map(|link| link.snapshot())
            .collect();

        EngineSnapshot {
            local_id: self.local_id,
            relay: self.relay_status,
            selected_profile: self.selected.as_ref().map(|p| p.name.clone()),
            last_good_profile: self.last_good.as_ref().map(|p| p.name.clone()),
            media: self.media.snapshot(),
            links,
        }
    }

    async fn stats(&self, peer: &PeerId) -> Option<ConnectionStats> {
        let connection = self.registry.get(peer)?.connection()?;
        match connection.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Stats for {} unavailable: {}", peer, e);
                None
            }
        }
    }
}
