use std::time::Duration;

/// Checked first; normally set by the deployment.
pub const PRIMARY_URL_VAR: &str = "MCP_TOOL_ORCHESTRATOR_URL";
/// Checked when the primary variable is unset or empty.
pub const SECONDARY_URL_VAR: &str = "ORCHESTRATOR_URL";
pub const DEFAULT_BASE_URL: &str = "https://mcp-orchestrator-v1-dev.fly.dev";

/// Total budget for one streamed answer, body included. Must stay below
/// the relay's own 60 s budget so a hang is reported rather than cut off.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(55);
pub const FEEDBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrator connection settings, resolved once at startup and passed to
/// every component that talks to the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub stream_timeout: Duration,
    pub feedback_timeout: Duration,
}

impl OrchestratorConfig {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();
        Self {
            base_url,
            stream_timeout: STREAM_TIMEOUT,
            feedback_timeout: FEEDBACK_TIMEOUT,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the base URL through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = [PRIMARY_URL_VAR, SECONDARY_URL_VAR]
            .into_iter()
            .find_map(|name| lookup(name).as_deref().and_then(clean_env_value))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    pub fn stream_answer_url(&self) -> String {
        format!("{}/orchestrator/stream-answer", self.base_url)
    }

    pub fn feedback_url(&self) -> String {
        format!("{}/feedback", self.base_url)
    }
}

/// Clean a raw environment value: drop an inline `#` comment, trim, and
/// strip surrounding quotes. Returns `None` if nothing is left.
pub fn clean_env_value(raw: &str) -> Option<String> {
    let value = raw.split('#').next().unwrap_or_default().trim();
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    let value = value.strip_suffix(['"', '\'']).unwrap_or(value).trim();
    (!value.is_empty()).then(|| value.to_string())
}
