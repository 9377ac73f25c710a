use crate::link::PeerLink;
use huddle_core::PeerId;
use std::collections::HashMap;
use tracing::{debug, warn};

/// At most one [`PeerLink`] per remote identity.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    links: HashMap<PeerId, PeerLink>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `link`, tearing down whatever link existed for the same identity.
    pub async fn insert(&mut self, link: PeerLink) {
        let remote = link.remote();
        if let Some(previous) = self.links.insert(remote, link) {
            debug!("Superseding existing link to {}", remote);
            close(previous).await;
        }
    }

    pub fn get(&self, peer: &PeerId) -> Option<&PeerLink> {
        self.links.get(peer)
    }

    pub fn get_mut(&mut self, peer: &PeerId) -> Option<&mut PeerLink> {
        self.links.get_mut(peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.links.contains_key(peer)
    }

    /// Tear down and forget the link to `peer`. Safe to call repeatedly.
    pub async fn remove(&mut self, peer: &PeerId) -> bool {
        match self.links.remove(peer) {
            Some(link) => {
                close(link).await;
                true
            }
            None => false,
        }
    }

    /// Identities in a stable order.
    pub fn ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.links.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerLink> {
        self.links.values()
    }

    /// Remove every link, returning the identities that were dropped.
    pub async fn clear(&mut self) -> Vec<PeerId> {
        let ids = self.ids();
        for link in std::mem::take(&mut self.links).into_values() {
            close(link).await;
        }
        ids
    }
}

async fn close(mut link: PeerLink) {
    if let Some(connection) = link.teardown() {
        if let Err(e) = connection.close().await {
            warn!("Closing connection to {} failed: {}", link.remote(), e);
        }
    }
}
