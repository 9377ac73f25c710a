use crate::model::signaling::IceServerConfig;
use crate::utils::{
    CLOUDFLARE_STUN_ADDR, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3,
    DEFAULT_STUN_ADDR_4, DEFAULT_STUN_ADDR_5, OPENRELAY_CREDENTIAL, OPENRELAY_STUN_ADDR,
    OPENRELAY_TURN_ADDRS, OPENRELAY_USERNAME, PUBLIC_STUN_ADDRS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the slot filled from the credential endpoint.
pub const METERED_PROFILE: &str = "metered";
pub const GOOGLE_STUN_PROFILE: &str = "google-stun";
pub const OPENRELAY_TURN_PROFILE: &str = "openrelay-turn";
pub const PUBLIC_STUN_PROFILE: &str = "public-stun";

/// A named bundle of rendezvous/relay endpoints used to build one media connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectivityProfile {
    pub name: String,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ConnectivityProfile {
    pub fn new(name: impl Into<String>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            name: name.into(),
            ice_servers,
        }
    }

    pub fn has_relay(&self) -> bool {
        self.ice_servers
            .iter()
            .flat_map(|server| server.urls.iter())
            .any(|url| url.starts_with("turn:") || url.starts_with("turns:"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no profile named '{0}'")]
    UnknownProfile(String),
    #[error("profile '{0}' is static and cannot be replaced")]
    NotDynamic(String),
    #[error("profile '{0}' was already replaced during this session")]
    AlreadySubstituted(String),
}

#[derive(Debug, Clone)]
struct Slot {
    profile: ConnectivityProfile,
    dynamic: bool,
    substituted: bool,
}

/// Fixed, ordered set of connectivity profiles.
///
/// Order is significant: it is the order the rotator walks on failure.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    slots: Vec<Slot>,
}

impl ProfileCatalog {
    pub fn new(profiles: Vec<ConnectivityProfile>) -> Self {
        Self {
            slots: profiles
                .into_iter()
                .map(|profile| Slot {
                    profile,
                    dynamic: false,
                    substituted: false,
                })
                .collect(),
        }
    }

    /// Mark `name` as the slot that may be replaced once by fetched credentials.
    pub fn with_dynamic_slot(mut self, name: &str) -> Self {
        for slot in self.slots.iter_mut() {
            slot.dynamic = slot.profile.name == name;
        }
        self
    }

    pub fn builtin() -> Self {
        let metered_fallback = vec![
            IceServerConfig::stun(CLOUDFLARE_STUN_ADDR),
            IceServerConfig::stun(DEFAULT_STUN_ADDR),
        ];

        let google = [
            DEFAULT_STUN_ADDR,
            DEFAULT_STUN_ADDR_2,
            DEFAULT_STUN_ADDR_3,
            DEFAULT_STUN_ADDR_4,
            DEFAULT_STUN_ADDR_5,
        ]
        .iter()
        .map(|url| IceServerConfig::stun(url))
        .collect();

        let mut openrelay = vec![IceServerConfig::stun(OPENRELAY_STUN_ADDR)];
        openrelay.extend(
            OPENRELAY_TURN_ADDRS
                .iter()
                .map(|url| IceServerConfig::turn(url, OPENRELAY_USERNAME, OPENRELAY_CREDENTIAL)),
        );

        let public = PUBLIC_STUN_ADDRS
            .iter()
            .map(|url| IceServerConfig::stun(url))
            .collect();

        Self::new(vec![
            ConnectivityProfile::new(METERED_PROFILE, metered_fallback),
            ConnectivityProfile::new(GOOGLE_STUN_PROFILE, google),
            ConnectivityProfile::new(OPENRELAY_TURN_PROFILE, openrelay),
            ConnectivityProfile::new(PUBLIC_STUN_PROFILE, public),
        ])
        .with_dynamic_slot(METERED_PROFILE)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectivityProfile> {
        self.slots.iter().map(|slot| &slot.profile)
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|profile| profile.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ConnectivityProfile> {
        self.iter().find(|profile| profile.name == name)
    }

    pub fn first(&self) -> Option<&ConnectivityProfile> {
        self.iter().next()
    }

    /// Replace the endpoints of the dynamic slot. Allowed once per catalog.
    pub fn substitute(
        &mut self,
        name: &str,
        ice_servers: Vec<IceServerConfig>,
    ) -> Result<(), CatalogError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.profile.name == name)
            .ok_or_else(|| CatalogError::UnknownProfile(name.to_owned()))?;

        if !slot.dynamic {
            return Err(CatalogError::NotDynamic(name.to_owned()));
        }
        if slot.substituted {
            return Err(CatalogError::AlreadySubstituted(name.to_owned()));
        }

        slot.profile.ice_servers = ice_servers;
        slot.substituted = true;
        Ok(())
    }
}
