//! HTTP health surface for a running consumer.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /health`: liveness, returns `{ "status": "ok" }`.
//! - `GET /consumer`: registered event types and consumer statistics.
//!
//! ## Example
//!
//! ```ignore
//! let handle = consumer.spawn();
//! let state = HealthState::new(&handle, &registry);
//!
//! // Compose with other axum routes
//! let app = profile_relay::service::http::router(state.clone());
//!
//! // Or serve directly
//! profile_relay::service::http::serve(state, "0.0.0.0:3000").await?;
//! ```

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::watch;

use super::consumer::{ConsumerHandle, ConsumerStats};
use super::registry::HandlerRegistry;

/// What the health routes report on.
#[derive(Clone)]
pub struct HealthState {
    stats: watch::Receiver<ConsumerStats>,
    event_types: Vec<String>,
}

impl HealthState {
    pub fn new(consumer: &ConsumerHandle, registry: &HandlerRegistry) -> Self {
        Self {
            stats: consumer.subscribe_stats(),
            event_types: registry
                .event_types()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Build an axum `Router` exposing the health routes.
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/consumer", get(consumer_handler))
        .with_state(state)
}

/// Serve the health routes at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve(state: HealthState, addr: &str) -> Result<(), std::io::Error> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /consumer`
async fn consumer_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let stats = state.stats.borrow().clone();
    Json(json!({ "eventTypes": state.event_types, "stats": stats }))
}
