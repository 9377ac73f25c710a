use huddle_core::{ConnectivityProfile, ProfileCatalog};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Rotation {
    Retry {
        profile: ConnectivityProfile,
        delay: Duration,
        attempt: u32,
    },
    Abandon,
}

/// Chooses the profile for each attempt of a failure episode.
///
/// Holds no per-link state: the caller keeps the attempt counter and the
/// order captured when the episode began.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRotator {
    base_delay: Duration,
}

impl ProfileRotator {
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// Last-known-good first, then every other catalog profile in catalog order.
    pub fn retry_order(
        catalog: &ProfileCatalog,
        last_good: Option<&ConnectivityProfile>,
    ) -> Vec<ConnectivityProfile> {
        let mut order: Vec<ConnectivityProfile> = last_good.into_iter().cloned().collect();
        for profile in catalog.iter() {
            if !order.iter().any(|p| p.name == profile.name) {
                order.push(profile.clone());
            }
        }
        order
    }

    /// Decide what the `attempt`th consecutive failure leads to.
    pub fn next(&self, attempt: u32, order: &[ConnectivityProfile]) -> Rotation {
        if attempt == 0 || attempt as usize > order.len() {
            return Rotation::Abandon;
        }

        Rotation::Retry {
            profile: order[attempt as usize - 1].clone(),
            delay: self.base_delay * attempt,
            attempt,
        }
    }

    /// Profile for a freshly created link.
    pub fn initial_profile<'a>(
        catalog: &'a ProfileCatalog,
        last_good: Option<&'a ConnectivityProfile>,
        selected: Option<&'a ConnectivityProfile>,
    ) -> Option<ConnectivityProfile> {
        last_good
            .or(selected)
            .or_else(|| catalog.first())
            .cloned()
    }
}
