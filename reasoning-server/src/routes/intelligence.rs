use axum::extract::{Query, State};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use reasoning_core::model::{BBox, Detection, EventContext, EventType, FrameShape, TrackId};
use reasoning_core::store::PublishRequest;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>, store_capacity: usize) -> AppResult<usize> {
    match limit {
        None => Ok(store_capacity.min(50)),
        Some(n) if n <= 0 => Err(AppError::bad_request("limit must be a positive integer")),
        Some(n) => Ok((n as usize).min(store_capacity)),
    }
}

/// `GET /api/intelligence/events?limit=N`
pub async fn list_events(State(state): State<AppState>, Query(q): Query<EventsQuery>) -> AppResult<Json<Value>> {
    let coordinator = state.coordinator.lock().unwrap();
    let capacity = coordinator.config().store.capacity;
    let limit = clamp_limit(q.limit, capacity)?;
    let events = coordinator.store.recent(limit);

    Ok(Json(json!({
        "status": if coordinator.is_degraded() { "degraded" } else { "active" },
        "total": events.len(),
        "events": events,
    })))
}

/// `GET /api/intelligence/live?limit=N` — identical shape, kept for legacy clients.
pub async fn list_live(state: State<AppState>, q: Query<EventsQuery>) -> AppResult<Json<Value>> {
    list_events(state, q).await
}

#[derive(Debug, Deserialize)]
pub struct TestEventRequest {
    #[serde(default = "default_test_event_type")]
    pub event_type: EventType,
    #[serde(default = "default_test_track_id")]
    pub track_id: u64,
    #[serde(default = "default_test_severity")]
    pub severity_score: f32,
}

fn default_test_event_type() -> EventType {
    EventType::Loitering
}

fn default_test_track_id() -> u64 {
    0
}

fn default_test_severity() -> f32 {
    0.4
}

/// `POST /api/intelligence/events/test` — development only, injects a synthetic
/// event into the store so UI clients can be exercised without a live feed.
pub async fn inject_test_event(
    State(state): State<AppState>,
    Json(req): Json<TestEventRequest>,
) -> AppResult<Json<Value>> {
    if state.production {
        return Err(AppError::forbidden("test endpoint is disabled in production"));
    }

    let coordinator = state.coordinator.lock().unwrap();
    let event = coordinator.store.publish(PublishRequest {
        event_type: req.event_type,
        severity_score: req.severity_score,
        track_id: req.track_id,
        track_id_2: None,
        zone_id: None,
        duration: 1.0,
        context: EventContext::new(),
        timestamp: Local::now(),
    });

    Ok(Json(json!({ "status": "ok", "event": event })))
}

#[derive(Debug, Deserialize)]
pub struct DetectionDto {
    pub track_id: u64,
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_name: String,
}

#[derive(Debug, Deserialize)]
pub struct FrameIngestRequest {
    pub detections: Vec<DetectionDto>,
    pub frame_shape: (f32, f32),
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<Local>>,
    #[serde(default = "default_fps")]
    pub fps: f32,
}

fn default_fps() -> f32 {
    30.0
}

#[derive(Debug, Serialize)]
pub struct FrameIngestResponse {
    pub stabilized_count: usize,
    pub violation_count: usize,
    pub new_events: usize,
    pub processing_time_ms: f64,
}

/// `POST /api/intelligence/frames` — JSON adapter onto
/// [`reasoning_core::FrameCoordinator::process_frame`].
pub async fn ingest_frame(
    State(state): State<AppState>,
    Json(req): Json<FrameIngestRequest>,
) -> AppResult<Json<FrameIngestResponse>> {
    let detections: Vec<Detection> = req
        .detections
        .into_iter()
        .map(|d| Detection {
            track_id: TrackId(d.track_id),
            bbox: BBox { x1: d.bbox[0], y1: d.bbox[1], x2: d.bbox[2], y2: d.bbox[3] },
            class_name: d.class_name,
            confidence: d.confidence,
        })
        .collect();

    let (height, width) = req.frame_shape;
    let frame_shape = FrameShape { height, width };
    let timestamp = req.timestamp.unwrap_or_else(Local::now);

    let mut coordinator = state.coordinator.lock().unwrap();
    let result = coordinator.process_frame(detections, frame_shape, timestamp, req.fps);

    Ok(Json(FrameIngestResponse {
        stabilized_count: result.stabilized_count,
        violation_count: result.violations.len(),
        new_events: result.new_events.len(),
        processing_time_ms: result.processing_time.as_secs_f64() * 1000.0,
    }))
}

/// `GET /api/intelligence/stats`
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let coordinator = state.coordinator.lock().unwrap();
    Ok(Json(json!({
        "status": if coordinator.is_degraded() { "degraded" } else { "active" },
        "uptime_s": state.started_at.elapsed().as_secs(),
        "tracked_objects": coordinator.track_count(),
        "stored_events": coordinator.store.len(),
        "input_invalid_count": coordinator.input_invalid_count(),
        "state_corrupted_count": coordinator.state_corrupted_count(),
        "dropped_subscriber_messages": coordinator.store.dropped_subscriber_messages(),
        "average_processing_time_ms": coordinator.average_processing_time().as_secs_f64() * 1000.0,
        "subscriber_count": coordinator.store.subscriber_count(),
    })))
}
