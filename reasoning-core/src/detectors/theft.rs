//! Theft suspicion state machine (§4.6.4):
//! `IDLE -> INTERACTION -> CONCEALMENT -> THEFT_SUSPECTED`, keyed by
//! `(person_id, object_id)` per the coordinator's flat-map convention (§9).

use std::collections::HashMap;

use crate::config::GRASPABLE_CLASSES;
use crate::model::{ContextValue, EventContext, EventType, TrackId};
use crate::store::PublishRequest;

use super::{Detector, DetectorFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Interaction,
    Concealment,
}

#[derive(Debug, Clone, Copy)]
struct PairState {
    stage: Stage,
    interaction_started_s: Option<f64>,
    last_interaction_s: Option<f64>,
}

impl Default for PairState {
    fn default() -> Self {
        PairState { stage: Stage::Idle, interaction_started_s: None, last_interaction_s: None }
    }
}

#[derive(Debug, Default)]
pub struct TheftDetector {
    pairs: HashMap<(TrackId, TrackId), PairState>,
}

impl Detector for TheftDetector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        let th = frame.thresholds;
        let now_s = frame.timestamp.timestamp() as f64 + frame.timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        let persons: Vec<TrackId> = frame.context.tracks_of_class("person").map(|(id, _)| *id).collect();
        let objects: Vec<(TrackId, String)> = GRASPABLE_CLASSES
            .iter()
            .flat_map(|class| frame.context.tracks_of_class(class).map(|(id, s)| (*id, s.class.clone())))
            .collect();

        let mut live_pairs = std::collections::HashSet::new();

        for &person_id in &persons {
            let Some(person) = frame.context.state(person_id) else { continue };
            for (object_id, _class) in &objects {
                let Some(object) = frame.context.state(*object_id) else { continue };
                let Some(distance) = person.distance_to(object) else { continue };

                let key = (person_id, *object_id);
                live_pairs.insert(key);
                let pair = self.pairs.entry(key).or_default();

                let near = distance < th.theft_near_px;

                match pair.stage {
                    Stage::Idle => {
                        if near {
                            pair.stage = Stage::Interaction;
                            pair.interaction_started_s = Some(now_s);
                            pair.last_interaction_s = Some(now_s);
                        }
                    }
                    Stage::Interaction => {
                        if near {
                            pair.last_interaction_s = Some(now_s);
                            let started = pair.interaction_started_s.unwrap_or(now_s);
                            if now_s - started >= th.theft_concealment_s as f64 {
                                pair.stage = Stage::Concealment;
                            }
                        } else {
                            let gap = now_s - pair.last_interaction_s.unwrap_or(now_s);
                            if gap > th.theft_interaction_break_s as f64 {
                                pair.stage = Stage::Idle;
                                pair.interaction_started_s = None;
                            }
                        }
                    }
                    Stage::Concealment => {
                        if near {
                            pair.last_interaction_s = Some(now_s);
                        }
                        let gap = now_s - pair.last_interaction_s.unwrap_or(now_s);
                        if person.speed > th.theft_exit_speed_px_s {
                            pair.stage = Stage::Idle;
                            pair.interaction_started_s = None;

                            let mut context = EventContext::new();
                            context.insert("speed_px_s".to_string(), ContextValue::Number(person.speed as f64));

                            out.push(PublishRequest {
                                event_type: EventType::TheftSuspected,
                                // Held just below the CRITICAL cutoff so the
                                // level bucket resolves to HIGH (§4.6.4, §8 S3).
                                severity_score: 0.65,
                                track_id: person_id.0,
                                track_id_2: Some(object_id.0),
                                zone_id: None,
                                duration: (now_s - pair.last_interaction_s.unwrap_or(now_s)).max(0.0) as f32,
                                context,
                                timestamp: frame.timestamp,
                            });
                        } else if gap > th.theft_interaction_break_s as f64 {
                            pair.stage = Stage::Idle;
                            pair.interaction_started_s = None;
                        }
                    }
                }
            }
        }

        self.pairs.retain(|key, _| live_pairs.contains(key));
        out
    }
}
