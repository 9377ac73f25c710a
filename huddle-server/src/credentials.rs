use anyhow::{Context, Result};
use axum::Json;
use axum::extract::State;
use huddle_core::IceServerConfig;
use huddle_core::utils::{CLOUDFLARE_STUN_ADDR, DEFAULT_STUN_ADDR};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

use crate::SignalingService;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsResponse {
    pub ice_servers: Vec<IceServerConfig>,
}

// The provider answers with a bare list; tolerate the wrapped form too.
#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamBody {
    List(Vec<IceServerConfig>),
    Wrapped(CredentialsResponse),
}

/// Fetches short-lived TURN credentials from the Metered API.
#[derive(Clone)]
pub struct CredentialService {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl CredentialService {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.filter(|key| !key.is_empty()),
            base_url: base_url.into(),
            http,
        }
    }

    pub fn fallback() -> Vec<IceServerConfig> {
        vec![
            IceServerConfig::stun(CLOUDFLARE_STUN_ADDR),
            IceServerConfig::stun(DEFAULT_STUN_ADDR),
        ]
    }

    /// Never fails: any upstream problem yields the STUN fallback.
    pub async fn ice_servers(&self) -> Vec<IceServerConfig> {
        let Some(api_key) = &self.api_key else {
            warn!("No Metered API key configured, serving fallback STUN servers");
            return Self::fallback();
        };

        match self.fetch(api_key).await {
            Ok(servers) if !servers.is_empty() => servers,
            Ok(_) => {
                warn!("Metered returned no ICE servers, serving fallback");
                Self::fallback()
            }
            Err(e) => {
                error!("Error fetching TURN credentials: {:?}", e);
                Self::fallback()
            }
        }
    }

    async fn fetch(&self, api_key: &str) -> Result<Vec<IceServerConfig>> {
        let url = format!(
            "{}/api/v1/turn/credentials",
            self.base_url.trim_end_matches('/')
        );

        let body: UpstreamBody = self
            .http
            .get(&url)
            .query(&[("apiKey", api_key)])
            .send()
            .await
            .context("Metered request failed")?
            .error_for_status()
            .context("Metered API error")?
            .json()
            .await
            .context("Metered response is not an ICE server list")?;

        Ok(match body {
            UpstreamBody::List(servers) => servers,
            UpstreamBody::Wrapped(wrapped) => wrapped.ice_servers,
        })
    }
}

pub async fn credentials_handler(
    State(service): State<SignalingService>,
) -> Json<CredentialsResponse> {
    Json(CredentialsResponse {
        ice_servers: service.credentials().ice_servers().await,
    })
}
