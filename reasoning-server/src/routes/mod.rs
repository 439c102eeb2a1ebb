pub mod health;
pub mod intelligence;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/api/intelligence/events", get(intelligence::list_events))
        .route("/api/intelligence/live", get(intelligence::list_live))
        .route("/api/intelligence/frames", post(intelligence::ingest_frame))
        .route("/api/intelligence/stats", get(intelligence::stats))
        .route("/ws/reasoning", get(ws::reasoning_ws));

    if !state.production {
        api = api.route("/api/intelligence/events/test", post(intelligence::inject_test_event));
    }

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
