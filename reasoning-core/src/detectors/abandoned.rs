//! Abandoned object detector (§4.6.6).

use crate::model::{ContextValue, EventContext, EventType};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Default)]
pub struct AbandonedDetector;

impl Detector for AbandonedDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        let th = frame.thresholds;
        let now_s = frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        for (track_id, state) in frame.context.iter() {
            if state.class == "person" || state.disappeared {
                continue;
            }
            if !state.is_stationary(frame.config.context.stationary_speed_px_s) {
                continue;
            }
            let stationary_for = state.stationary_duration_s(now_s);
            if stationary_for < th.abandoned_stationary_s {
                continue;
            }

            let has_nearby_person = frame
                .context
                .near_object(*track_id, "person", th.abandoned_person_radius_px);
            if has_nearby_person {
                continue;
            }

            let mut context = EventContext::new();
            context.insert("class".to_string(), ContextValue::String(state.class.clone()));

            out.push(PublishRequest {
                event_type: EventType::AbandonedObject,
                // Held below the HIGH cutoff so the level bucket resolves
                // to MEDIUM (§4.6.6, §8 S5).
                severity_score: 0.45,
                track_id: track_id.0,
                track_id_2: None,
                zone_id: None,
                duration: stationary_for,
                context,
                timestamp: frame.timestamp,
            });
        }

        out
    }
}
