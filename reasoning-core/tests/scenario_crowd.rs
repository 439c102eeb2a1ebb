//! S4 — five person tracks converging within a 200px radius should produce
//! at least one CROWD_FORMING event with `count >= 5`, throttled to no more
//! than one per 2s window.

use chrono::{Local, TimeZone};
use reasoning_core::config::Config;
use reasoning_core::coordinator::FrameCoordinator;
use reasoning_core::model::{BBox, ContextValue, Detection, EventType, FrameShape, TrackId};

const SHAPE: FrameShape = FrameShape { height: 1080.0, width: 1920.0 };
const FPS: f32 = 30.0;

fn person_near(id: u64, offset: f32) -> Detection {
    let cx = 960.0 + offset;
    let cy = 540.0;
    Detection {
        track_id: TrackId(id),
        bbox: BBox { x1: cx - 10.0, y1: cy - 10.0, x2: cx + 10.0, y2: cy + 10.0 },
        class_name: "person".to_string(),
        confidence: 0.9,
    }
}

#[test]
fn five_converging_persons_emit_crowd_forming() {
    let mut coordinator = FrameCoordinator::new(Config::default());
    let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut all_events = Vec::new();
    let mut timestamps = Vec::new();

    for i in 0..60u64 {
        let t = base + chrono::Duration::milliseconds((i as i64) * 33);
        timestamps.push(t);
        let detections = vec![
            person_near(1, 0.0),
            person_near(2, 50.0),
            person_near(3, -50.0),
            person_near(4, 100.0),
            person_near(5, -100.0),
        ];
        let r = coordinator.process_frame(detections, SHAPE, t, FPS);
        all_events.extend(r.new_events);
    }

    let crowd_events: Vec<_> = all_events.iter().filter(|e| e.event_type == EventType::CrowdForming).collect();
    assert!(!crowd_events.is_empty());
    for e in &crowd_events {
        match e.context.get("count") {
            Some(ContextValue::Number(n)) => assert!(*n >= 5.0),
            other => panic!("expected numeric count, got {other:?}"),
        }
    }

    for window in crowd_events.windows(2) {
        let dt = (window[1].timestamp - window[0].timestamp).num_milliseconds();
        assert!(dt >= 1900, "crowd events emitted closer than ~2s apart: {dt}ms");
    }
}
