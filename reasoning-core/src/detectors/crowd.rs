//! Crowd forming detector (§4.6.7).

use crate::model::{ContextValue, EventContext, EventType};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Default)]
pub struct CrowdDetector {
    last_emitted_s: Option<f64>,
}

impl Detector for CrowdDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let th = frame.thresholds;
        let now_s = frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        let count = frame.context.tracks_of_class("person").count() as u32;
        if count < th.crowd_count {
            return Vec::new();
        }

        if let Some(last) = self.last_emitted_s {
            if now_s - last < th.crowd_throttle_s as f64 {
                return Vec::new();
            }
        }
        self.last_emitted_s = Some(now_s);

        let severity = if count >= th.crowd_count_high { 0.55 } else { 0.35 };

        let mut context = EventContext::new();
        context.insert("count".to_string(), ContextValue::Number(count as f64));

        vec![PublishRequest {
            event_type: EventType::CrowdForming,
            severity_score: severity,
            track_id: 0,
            track_id_2: None,
            zone_id: None,
            duration: 0.0,
            context,
            timestamp: frame.timestamp,
        }]
    }
}
