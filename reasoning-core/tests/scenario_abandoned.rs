//! S5 — a graspable object left motionless and alone for >=30s emits
//! exactly one ABANDONED_OBJECT event at MEDIUM severity.

use chrono::{Local, TimeZone};
use reasoning_core::config::Config;
use reasoning_core::coordinator::FrameCoordinator;
use reasoning_core::model::{BBox, Detection, EventType, FrameShape, SeverityLevel, TrackId};

const SHAPE: FrameShape = FrameShape { height: 1080.0, width: 1920.0 };
const FPS: f32 = 30.0;

fn suitcase_at(cx: f32) -> Detection {
    Detection {
        track_id: TrackId(2),
        bbox: BBox { x1: cx - 25.0, y1: 100.0, x2: cx + 25.0, y2: 150.0 },
        class_name: "suitcase".to_string(),
        confidence: 0.9,
    }
}

fn person_at(cx: f32) -> Detection {
    Detection {
        track_id: TrackId(1),
        bbox: BBox { x1: cx - 20.0, y1: 500.0, x2: cx + 20.0, y2: 700.0 },
        class_name: "person".to_string(),
        confidence: 0.9,
    }
}

#[test]
fn static_unattended_suitcase_emits_abandoned_object() {
    let mut coordinator = FrameCoordinator::new(Config::default());
    let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut all_events = Vec::new();
    let mut final_suitcase_x = 450.0;

    for frame in 0..300u64 {
        let t = base + chrono::Duration::milliseconds((frame as i64) * 33);
        let cx = 450.0 + frame as f32;
        final_suitcase_x = cx;
        let r = coordinator.process_frame(vec![person_at(cx), suitcase_at(cx)], SHAPE, t, FPS);
        all_events.extend(r.new_events);
    }

    for frame in 300..1400u64 {
        let t = base + chrono::Duration::milliseconds((frame as i64) * 33);
        let r = coordinator.process_frame(vec![suitcase_at(final_suitcase_x)], SHAPE, t, FPS);
        all_events.extend(r.new_events);
    }

    let abandoned: Vec<_> = all_events.iter().filter(|e| e.event_type == EventType::AbandonedObject).collect();
    assert_eq!(abandoned.len(), 1, "expected exactly one abandoned-object event, got {abandoned:?}");
    assert_eq!(abandoned[0].track_id, 2);
    assert_eq!(abandoned[0].severity, SeverityLevel::Medium);
}
