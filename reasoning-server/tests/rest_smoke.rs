//! Axum smoke tests over the reasoning REST surface.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reasoning_core::config::Config;
use reasoning_core::FrameCoordinator;
use tower::ServiceExt;

#[path = "../src/errors.rs"]
mod errors;
#[path = "../src/routes/mod.rs"]
mod routes;
#[path = "../src/state.rs"]
mod state;

use state::AppState;

fn test_state(production: bool) -> AppState {
    AppState {
        coordinator: Arc::new(Mutex::new(FrameCoordinator::new(Config::default()))),
        host: "127.0.0.1".to_string(),
        port: 0,
        production,
        started_at: Instant::now(),
    }
}

#[tokio::test]
async fn health_reports_active_with_no_traffic() {
    let app = routes::create_app(test_state(false));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn events_list_starts_empty() {
    let app = routes::create_app(test_state(false));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/intelligence/events?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn events_list_rejects_non_positive_limit() {
    let app = routes::create_app(test_state(false));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/intelligence/events?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_event_endpoint_disabled_in_production() {
    let app = routes::create_app(test_state(true));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/intelligence/events/test")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_endpoint_injects_event_outside_production() {
    let app = routes::create_app(test_state(false));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/intelligence/events/test")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn frame_ingest_accepts_a_detection_batch() {
    let app = routes::create_app(test_state(false));
    let body = serde_json::json!({
        "detections": [
            {"track_id": 1, "bbox": [100.0, 100.0, 150.0, 200.0], "confidence": 0.9, "class_name": "person"}
        ],
        "frame_shape": [1080.0, 1920.0],
        "fps": 30.0
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/intelligence/frames")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
