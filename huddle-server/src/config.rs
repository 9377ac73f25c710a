use huddle_core::utils::DEFAULT_RELAY_PORT;

pub const DEFAULT_METERED_DOMAIN: &str = "callme.metered.live";

/// Relay process settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metered_api_key: Option<String>,
    pub metered_domain: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_RELAY_PORT,
            metered_api_key: None,
            metered_domain: DEFAULT_METERED_DOMAIN.to_owned(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metered_base_url(&self) -> String {
        format!("https://{}", self.metered_domain)
    }
}
