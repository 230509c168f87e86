use std::time::Duration;

use tracing::info;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the orchestrator service. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: OrchestratorConfig,
}

impl OrchestratorClient {
    pub fn new(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OrchestratorError::Client(e.to_string()))?;

        info!(base_url = %config.base_url, "orchestrator client ready");

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
