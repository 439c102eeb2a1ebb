//! Running / rapid movement detector (§4.6.2).

use std::collections::HashMap;

use crate::model::{ContextValue, EventContext, EventType, TrackId};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Default)]
pub struct RunningDetector {
    /// Timestamp (seconds) each track started sustaining `|v| > V_run`, cleared on drop-below.
    above_since_s: HashMap<TrackId, f64>,
    /// Whether a RUNNING event is currently active for the track (suppresses re-trigger).
    active: HashMap<TrackId, bool>,
}

impl Detector for RunningDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        let th = frame.thresholds;
        let now_s = frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        let mut seen = std::collections::HashSet::new();
        for (track_id, state) in frame.context.iter() {
            if state.disappeared {
                continue;
            }
            seen.insert(*track_id);

            if state.speed > th.v_run_px_s {
                let started = *self.above_since_s.entry(*track_id).or_insert(now_s);
                let sustained = now_s - started;

                if sustained >= th.running_sustain_s as f64 {
                    let already_active = *self.active.entry(*track_id).or_insert(false);
                    if !already_active {
                        self.active.insert(*track_id, true);

                        let in_restricted = frame
                            .violations
                            .iter()
                            .any(|v| v.track_id == *track_id);
                        let high = state.speed > th.v_run_high_px_s || in_restricted;

                        let mut context = EventContext::new();
                        context.insert("speed_px_s".to_string(), ContextValue::Number(state.speed as f64));

                        out.push(PublishRequest {
                            event_type: EventType::Running,
                            severity_score: if high { 0.6 } else { 0.35 },
                            track_id: track_id.0,
                            track_id_2: None,
                            zone_id: None,
                            duration: sustained as f32,
                            context,
                            timestamp: frame.timestamp,
                        });
                    }
                }
            } else {
                self.above_since_s.remove(track_id);
                self.active.insert(*track_id, false);
            }
        }

        self.above_since_s.retain(|id, _| seen.contains(id));
        self.active.retain(|id, _| seen.contains(id));
        out
    }
}
