//! S6 — three LOITERING publishes for the same track, the second inside the
//! dedup window and the third outside it, should leave exactly two events
//! in the store (first and third), with strictly increasing event ids.
//!
//! The window is scaled down from the scenario's 1s/5s/6s real-time figures
//! to keep the test fast; the suppress/allow behavior under test is
//! unaffected by the absolute timescale.

use chrono::Local;
use reasoning_core::model::{EventContext, EventType};
use reasoning_core::store::{EventStore, PublishRequest};

fn req() -> PublishRequest {
    PublishRequest {
        event_type: EventType::Loitering,
        severity_score: 0.4,
        track_id: 42,
        track_id_2: None,
        zone_id: None,
        duration: 10.0,
        context: EventContext::new(),
        timestamp: Local::now(),
    }
}

#[test]
fn dedup_window_keeps_first_and_third() {
    let store = EventStore::new(100, 0.05, 16);

    let first = store.publish(req()).expect("first publish succeeds");

    std::thread::sleep(std::time::Duration::from_millis(10));
    let second = store.publish(req());
    assert!(second.is_none(), "publish within the dedup window must be suppressed");

    std::thread::sleep(std::time::Duration::from_millis(60));
    let third = store.publish(req()).expect("publish outside the dedup window succeeds");

    assert!(first.event_id.0 < third.event_id.0);

    let recent = store.recent(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].event_id.0, third.event_id.0);
    assert_eq!(recent[1].event_id.0, first.event_id.0);
}
