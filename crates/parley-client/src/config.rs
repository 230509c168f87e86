pub const RELAY_URL_VAR: &str = "PARLEY_RELAY_URL";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base URL without a trailing slash.
    pub relay_url: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let relay_url = std::env::var(RELAY_URL_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());
        Self {
            relay_url: relay_url.trim_end_matches('/').to_string(),
        }
    }
}
