//! Solex API /v1: REST endpoints for the exercise verifier.
pub mod handlers;
pub mod metrics;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;
use solex_verify::Verifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub metrics: Arc<Metrics>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/verify", post(handlers::verify))
        .route("/v1/health", get(handlers::health))
        .route("/v1/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    tracing::info!("Solex API listening on {}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
