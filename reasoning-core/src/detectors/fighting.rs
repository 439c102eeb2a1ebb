//! Fighting detector (§4.6.5): unordered pairs of person tracks exhibiting
//! sustained close-range erratic high-speed motion.

use std::collections::HashMap;

use crate::model::TrackId;
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

fn pair_key(a: TrackId, b: TrackId) -> (TrackId, TrackId) {
    if a.0 <= b.0 { (a, b) } else { (b, a) }
}

#[derive(Debug, Default)]
pub struct FightingDetector {
    close_since_s: HashMap<(TrackId, TrackId), f64>,
    active: std::collections::HashSet<(TrackId, TrackId)>,
}

impl Detector for FightingDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        let th = frame.thresholds;
        let now_s = frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        let persons: Vec<TrackId> = frame.context.tracks_of_class("person").map(|(id, _)| *id).collect();
        let mut live_pairs = std::collections::HashSet::new();

        for i in 0..persons.len() {
            for j in (i + 1)..persons.len() {
                let key = pair_key(persons[i], persons[j]);
                let Some(a) = frame.context.state(key.0) else { continue };
                let Some(b) = frame.context.state(key.1) else { continue };
                let Some(distance) = a.distance_to(b) else { continue };

                let erratic = a.direction_changes >= th.fight_direction_changes
                    && b.direction_changes >= th.fight_direction_changes;
                let fast = a.speed > th.fight_speed_px_s && b.speed > th.fight_speed_px_s;
                let close = distance < th.fight_distance_px;

                if close && fast && erratic {
                    live_pairs.insert(key);
                    let started = *self.close_since_s.entry(key).or_insert(now_s);
                    if now_s - started >= th.fight_sustain_s as f64 && !self.active.contains(&key) {
                        self.active.insert(key);
                        out.push(PublishRequest {
                            event_type: crate::model::EventType::Fighting,
                            severity_score: 0.9,
                            track_id: key.0.0,
                            track_id_2: Some(key.1.0),
                            zone_id: None,
                            duration: (now_s - started) as f32,
                            context: crate::model::EventContext::new(),
                            timestamp: frame.timestamp,
                        });
                    }
                } else {
                    self.close_since_s.remove(&key);
                    self.active.remove(&key);
                }
            }
        }

        self.close_since_s.retain(|key, _| live_pairs.contains(key));
        out
    }
}
