//! S1 — a stationary person track should produce exactly one LOITERING
//! event after ~10s dwell, and no INTRUSION events.

use chrono::{Local, TimeZone};
use reasoning_core::config::Config;
use reasoning_core::coordinator::FrameCoordinator;
use reasoning_core::model::{BBox, Detection, EventType, FrameShape, TrackId};

const FPS: f32 = 30.0;
const SHAPE: FrameShape = FrameShape { height: 1080.0, width: 1920.0 };

#[test]
fn stationary_person_emits_single_loitering_event() {
    let mut coordinator = FrameCoordinator::new(Config::default());
    let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();

    let mut all_events = Vec::new();
    for frame in 0..600u64 {
        let timestamp = base + chrono::Duration::milliseconds((frame as i64) * 33);
        let detections = vec![Detection {
            track_id: TrackId(1),
            bbox: BBox { x1: 500.0, y1: 500.0, x2: 600.0, y2: 700.0 },
            class_name: "person".to_string(),
            confidence: 0.9,
        }];
        let result = coordinator.process_frame(detections, SHAPE, timestamp, FPS);
        all_events.extend(result.new_events);
    }

    let loitering: Vec<_> = all_events.iter().filter(|e| e.event_type == EventType::Loitering).collect();
    assert_eq!(loitering.len(), 1, "expected exactly one loitering event, got {loitering:?}");
    assert_eq!(loitering[0].track_id, 1);
    assert!(loitering[0].duration >= 10.0);
    assert!(loitering[0].reasoning_text.starts_with("Subject ID 1 exhibited loitering"));

    let intrusions = all_events.iter().filter(|e| e.event_type == EventType::Intrusion).count();
    assert_eq!(intrusions, 0);
}
