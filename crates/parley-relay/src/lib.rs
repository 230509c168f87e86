//! parley-relay library root.
//!
//! The binary in `main.rs` only wires configuration and logging; the
//! router lives here so integration tests can drive it directly.

pub mod error;
pub mod middleware;
pub mod relay;
pub mod routes;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/chat", post(routes::chat::chat))
        .route("/api/feedback", post(routes::feedback::submit_feedback))
        .layer(axum_mw::from_fn(middleware::request_log::request_log))
        .layer(cors)
        .with_state(state)
}
