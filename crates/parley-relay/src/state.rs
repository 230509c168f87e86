use parley_orchestrator::client::OrchestratorClient;

/// Shared application state, injected into all route handlers via Axum state.
///
/// Holds nothing mutable: every chat turn gets its own identifiers and its
/// own upstream connection.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: OrchestratorClient,
}
