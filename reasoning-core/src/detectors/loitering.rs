//! Loitering state machine (§4.6.1):
//! `NORMAL -> PRESENT -> STATIONARY -> LOITERING -> SUSPICIOUS`.

use std::collections::HashMap;

use crate::model::{ContextValue, EventContext, EventType, TrackId, ZoneType};
use crate::severity::{score, SeverityInputs};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Normal,
    Present,
    Stationary,
    Loitering,
    Suspicious,
}

#[derive(Debug, Default)]
pub struct LoiteringDetector {
    stages: HashMap<TrackId, Stage>,
}

impl Detector for LoiteringDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        let th = frame.thresholds;

        for (track_id, state) in frame.context.tracks_of_class("person") {
            let stage = self.stages.entry(*track_id).or_insert(Stage::Normal);

            let now_s = now_seconds(frame);
            if state.motion_duration_s(now_s) >= th.motion_resume_s {
                *stage = Stage::Present;
                continue;
            }

            let dwell = state.stationary_duration_s(now_s);
            let stationary = state.is_stationary(frame.config.context.stationary_speed_px_s);

            match *stage {
                Stage::Normal => *stage = Stage::Present,
                Stage::Present if stationary && dwell >= th.loiter_stationary_s => {
                    *stage = Stage::Stationary;
                }
                Stage::Stationary if dwell >= th.loiter_s => {
                    *stage = Stage::Loitering;
                    out.push(build_event(*track_id, state.speed, dwell, 0.4, frame));
                }
                Stage::Loitering if dwell >= th.loiter_suspicious_s && in_non_normal_zone(state, frame) => {
                    *stage = Stage::Suspicious;
                    out.push(build_event(*track_id, state.speed, dwell, 0.65, frame));
                }
                _ => {}
            }
        }

        out
    }
}

fn in_non_normal_zone(state: &crate::context::ObjectState, frame: &DetectorFrame<'_>) -> bool {
    state.current_zone.as_ref().is_some_and(|zone_id| {
        frame
            .config
            .zones
            .iter()
            .find(|z| z.id == zone_id.0)
            .is_some_and(|z| z.zone_type != ZoneType::Normal)
    })
}

fn now_seconds(frame: &DetectorFrame<'_>) -> f64 {
    frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0
}

fn build_event(track_id: TrackId, speed: f32, dwell: f32, baseline_score: f32, frame: &DetectorFrame<'_>) -> PublishRequest {
    let inputs = SeverityInputs {
        dwell_time_s: dwell,
        zone_weight: 1.0,
        class_name: "person".to_string(),
        speed_px_s: speed,
        baseline_speed_px_s: frame.config.context.stationary_speed_px_s,
        timestamp: frame.timestamp,
        occupancy: 0,
        capacity: 1,
        prior_violation_count: 0,
    };
    let severity = score(&inputs, &frame.config.severity_weights).score.max(baseline_score);

    let mut context = EventContext::new();
    context.insert("speed_px_s".to_string(), ContextValue::Number(speed as f64));
    context.insert("dwell_time_s".to_string(), ContextValue::Number(dwell as f64));

    PublishRequest {
        event_type: EventType::Loitering,
        severity_score: severity,
        track_id: track_id.0,
        track_id_2: None,
        zone_id: None,
        duration: dwell,
        context,
        timestamp: frame.timestamp,
    }
}
