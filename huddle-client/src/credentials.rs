use crate::diagnostics::DiagnosticsSink;
use huddle_core::{DiagnosticEvent, IceServerConfig, METERED_PROFILE, ProfileCatalog};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("credential endpoint returned no servers")]
    Empty,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsBody {
    ice_servers: Vec<IceServerConfig>,
}

/// One request to the relay's credential endpoint.
pub async fn fetch_profile(url: &str) -> Result<Vec<IceServerConfig>, CredentialError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let body: CredentialsBody = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if body.ice_servers.is_empty() {
        return Err(CredentialError::Empty);
    }
    Ok(body.ice_servers)
}

/// The built-in catalog with the dynamic slot filled from `url` when possible.
///
/// Never fails. Any problem leaves the static fallback in place and is reported.
pub async fn load_catalog(url: Option<&str>, diagnostics: &dyn DiagnosticsSink) -> ProfileCatalog {
    let mut catalog = ProfileCatalog::builtin();
    let Some(url) = url else {
        return catalog;
    };

    match fetch_profile(url).await {
        Ok(servers) => {
            info!("Fetched {} ICE server(s) from {}", servers.len(), url);
            if let Err(e) = catalog.substitute(METERED_PROFILE, servers) {
                warn!("Could not install fetched credentials: {}", e);
            }
        }
        Err(e) => {
            warn!("Using fallback credentials: {}", e);
            diagnostics.report(
                DiagnosticEvent::new("credentials-fallback", "credential fetch failed")
                    .with_error(e.to_string())
                    .with_profile(METERED_PROFILE),
            );
        }
    }

    catalog
}
