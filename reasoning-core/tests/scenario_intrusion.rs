//! S2 — entering a RESTRICTED zone with `alert_on_entry` emits exactly one
//! CRITICAL INTRUSION event on the rising edge.

use chrono::{Local, TimeZone};
use reasoning_core::config::{Config, ZoneDef};
use reasoning_core::coordinator::FrameCoordinator;
use reasoning_core::model::{BBox, Detection, EventType, FrameShape, SeverityLevel, TrackId, ZoneType};

const SHAPE: FrameShape = FrameShape { height: 1080.0, width: 1920.0 };

fn restricted_zone_config() -> Config {
    let mut config = Config::default();
    config.zones.push(ZoneDef {
        id: "R".to_string(),
        name: "Restricted".to_string(),
        polygon: vec![(500.0, 500.0), (700.0, 500.0), (700.0, 700.0), (500.0, 700.0)],
        zone_type: ZoneType::Restricted,
        allowed_window: None,
        max_occupancy: None,
        allowed_classes: None,
        denied_classes: None,
        severity_weight: 2.0,
        use_center: false,
        alert_on_entry: true,
        allowed_direction: None,
    });
    config
}

#[test]
fn restricted_entry_emits_critical_intrusion() {
    let mut coordinator = FrameCoordinator::new(restricted_zone_config());
    let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();

    let outside = vec![Detection {
        track_id: TrackId(1),
        bbox: BBox { x1: 100.0, y1: 100.0, x2: 200.0, y2: 200.0 },
        class_name: "person".to_string(),
        confidence: 0.9,
    }];
    let r0 = coordinator.process_frame(outside, SHAPE, base, 30.0);
    assert!(r0.new_events.iter().all(|e| e.event_type != EventType::Intrusion));

    let inside = vec![Detection {
        track_id: TrackId(1),
        bbox: BBox { x1: 600.0, y1: 600.0, x2: 700.0, y2: 700.0 },
        class_name: "person".to_string(),
        confidence: 0.9,
    }];
    let t1 = base + chrono::Duration::milliseconds(33);
    let r1 = coordinator.process_frame(inside, SHAPE, t1, 30.0);

    let intrusions: Vec<_> = r1.new_events.iter().filter(|e| e.event_type == EventType::Intrusion).collect();
    assert_eq!(intrusions.len(), 1);
    assert_eq!(intrusions[0].severity, SeverityLevel::Critical);
    assert_eq!(intrusions[0].track_id, 1);
    assert_eq!(intrusions[0].zone_id.as_ref().map(|z| z.0.as_str()), Some("R"));
}
