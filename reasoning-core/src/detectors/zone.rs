//! Zone violation / intrusion detector (§4.6.3).
//!
//! Spatial violations are computed upstream by the spatial engine (§4.4);
//! this detector maps each violation to an `INTRUSION` or `ZONE_VIOLATION`
//! event with the appropriate severity treatment.

use crate::model::{ContextValue, EventContext, EventType, ViolationKind};
use crate::severity::{score, SeverityInputs};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Default)]
pub struct ZoneDetector;

impl Detector for ZoneDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();

        for violation in frame.violations {
            // track_id 0 is reserved for zone-scoped (non-track) violations, e.g. crowd limit.
            let object_state = if violation.track_id.0 != 0 {
                frame.context.state(violation.track_id)
            } else {
                None
            };

            let zone_def = frame
                .config
                .zones
                .iter()
                .find(|z| z.id == violation.zone_id.0);
            let alert_on_entry = zone_def.is_some_and(|z| z.alert_on_entry);

            let mut context = EventContext::new();
            context.insert("violation_kind".to_string(), ContextValue::String(format!("{:?}", violation.kind)));

            if violation.kind == ViolationKind::RestrictedEntry && alert_on_entry {
                out.push(PublishRequest {
                    event_type: EventType::Intrusion,
                    severity_score: 0.9,
                    track_id: violation.track_id.0,
                    track_id_2: None,
                    zone_id: Some(violation.zone_id.clone()),
                    duration: 0.0,
                    context,
                    timestamp: frame.timestamp,
                });
                continue;
            }

            let speed = object_state.map(|s| s.speed).unwrap_or(0.0);
            let dwell = object_state.map(|s| s.dwell_time()).unwrap_or(0.0);
            let class_name = object_state.map(|s| s.class.clone()).unwrap_or_else(|| "other".to_string());

            let inputs = SeverityInputs {
                dwell_time_s: dwell,
                zone_weight: violation.severity_weight,
                class_name,
                speed_px_s: speed,
                baseline_speed_px_s: frame.config.context.stationary_speed_px_s,
                timestamp: frame.timestamp,
                occupancy: 0,
                capacity: 1,
                prior_violation_count: 0,
            };
            let severity = score(&inputs, &frame.config.severity_weights);

            let event_type = if violation.kind == ViolationKind::RestrictedEntry {
                EventType::Intrusion
            } else {
                EventType::ZoneViolation
            };

            out.push(PublishRequest {
                event_type,
                severity_score: severity.score,
                track_id: violation.track_id.0,
                track_id_2: None,
                zone_id: Some(violation.zone_id.clone()),
                duration: dwell,
                context,
                timestamp: frame.timestamp,
            });
        }

        out
    }
}
