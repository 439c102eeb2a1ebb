use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /health` — process liveness plus the active/degraded status used
/// across the REST surface (§7).
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let coordinator = state.coordinator.lock().unwrap();
    let degraded = coordinator.is_degraded();

    let body = json!({
        "status": if degraded { "degraded" } else { "active" },
        "uptime_s": state.started_at.elapsed().as_secs(),
        "tracked_objects": coordinator.track_count(),
    });

    let status = if degraded { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    (status, Json(body))
}
