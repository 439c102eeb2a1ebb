//! Temporal stabilization (§4.2): eliminate per-frame class flicker via a
//! bounded observation history, mode voting, and a lock/unlock state
//! machine per track.

use std::collections::{HashMap, VecDeque};

use crate::config::StabilizerConfig;
use crate::model::{BBox, Detection, StabilizedDetection, TrackId};

#[derive(Debug, Clone)]
struct Observation {
    class: String,
    confidence: f32,
}

/// Per-track state owned exclusively by the stabilizer.
#[derive(Debug, Clone)]
pub struct TemporalState {
    history: VecDeque<Observation>,
    published_class: String,
    published_confidence: f32,
    locked: bool,
    lock_streak: usize,
    contradiction_counter: usize,
    last_seen_frame: u64,
}

impl TemporalState {
    fn new(first: &Observation, frame_index: u64) -> Self {
        TemporalState {
            history: VecDeque::new(),
            published_class: first.class.clone(),
            published_confidence: first.confidence,
            locked: false,
            lock_streak: 0,
            contradiction_counter: 0,
            last_seen_frame: frame_index,
        }
    }

    pub fn published_class(&self) -> &str {
        &self.published_class
    }

    pub fn published_confidence(&self) -> f32 {
        self.published_confidence
    }

    pub fn locked(&self) -> bool {
        self.locked
    }
}

/// Majority-vote class over the window, most recent observation wins ties.
fn mode_class(history: &VecDeque<Observation>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for obs in history {
        *counts.entry(obs.class.as_str()).or_insert(0) += 1;
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    history
        .iter()
        .rev()
        .find(|obs| counts.get(obs.class.as_str()).copied().unwrap_or(0) == max_count)
        .map(|obs| obs.class.clone())
        .unwrap_or_default()
}

fn current_streak(history: &VecDeque<Observation>) -> usize {
    let mut iter = history.iter().rev();
    let Some(last) = iter.next() else {
        return 0;
    };
    let mut streak = 1;
    for obs in iter {
        if obs.class == last.class {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Temporal stabilizer, keyed by track id.
#[derive(Debug, Default)]
pub struct Stabilizer {
    states: HashMap<TrackId, TemporalState>,
}

impl Stabilizer {
    pub fn new() -> Self {
        Stabilizer::default()
    }

    /// Process one frame's detections and return the stabilized output.
    /// Detections whose class fails the allow/block policy are dropped
    /// before stabilization, per §4.2.
    pub fn step(
        &mut self,
        detections: &[Detection],
        frame_index: u64,
        config: &StabilizerConfig,
    ) -> Vec<StabilizedDetection> {
        let mut out = Vec::with_capacity(detections.len());
        for det in detections {
            if !Self::class_allowed(&det.class_name, config) {
                continue;
            }
            let stabilized = self.step_track(det, frame_index, config);
            out.push(stabilized);
        }
        out
    }

    fn class_allowed(class_name: &str, config: &StabilizerConfig) -> bool {
        if config.block_list.iter().any(|c| c == class_name) {
            return false;
        }
        config.allow_list.iter().any(|c| c == class_name)
    }

    fn step_track(
        &mut self,
        det: &Detection,
        frame_index: u64,
        config: &StabilizerConfig,
    ) -> StabilizedDetection {
        let obs = Observation {
            class: det.class_name.clone(),
            confidence: det.confidence,
        };

        let state = self
            .states
            .entry(det.track_id)
            .or_insert_with(|| TemporalState::new(&obs, frame_index));

        state.last_seen_frame = frame_index;
        state.history.push_back(obs.clone());
        while state.history.len() > config.window_size {
            state.history.pop_front();
        }

        state.published_confidence =
            config.alpha * obs.confidence + (1.0 - config.alpha) * state.published_confidence;
        state.published_confidence = state.published_confidence.clamp(0.0, 1.0);

        if state.locked {
            let locked_class = state.published_class.clone();
            state.contradiction_counter = state
                .history
                .iter()
                .filter(|o| o.class != locked_class)
                .count();
            if state.contradiction_counter >= config.unlock_contradictions {
                state.locked = false;
                state.contradiction_counter = 0;
                state.lock_streak = current_streak(&state.history);
            }
        }

        if !state.locked {
            state.published_class = mode_class(&state.history);
            state.lock_streak = current_streak(&state.history);
            if state.lock_streak >= config.lock_streak {
                state.locked = true;
                state.contradiction_counter = 0;
            }
        }

        StabilizedDetection {
            track_id: det.track_id,
            bbox: clip_bbox(det.bbox),
            published_class: state.published_class.clone(),
            published_confidence: state.published_confidence,
            locked: state.locked,
        }
    }

    /// Drop state for tracks not seen in the last `forget_frames` frames,
    /// relative to `current_frame` (§4.1 periodic cleanup).
    pub fn cleanup(&mut self, current_frame: u64, forget_frames: u64) {
        self.states
            .retain(|_, state| current_frame.saturating_sub(state.last_seen_frame) < forget_frames);
    }

    /// Force-reset a track whose state is found to violate an invariant
    /// (§4.2 failure semantics): the track begins a fresh lifecycle.
    pub fn reset_track(&mut self, track_id: TrackId) {
        self.states.remove(&track_id);
    }

    pub fn state(&self, track_id: TrackId) -> Option<&TemporalState> {
        self.states.get(&track_id)
    }

    pub fn track_count(&self) -> usize {
        self.states.len()
    }
}

fn clip_bbox(bbox: BBox) -> BBox {
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(track_id: u64, class: &str, conf: f32) -> Detection {
        Detection {
            track_id: TrackId(track_id),
            bbox: BBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 },
            class_name: class.to_string(),
            confidence: conf,
        }
    }

    #[test]
    fn locks_after_streak() {
        let mut stabilizer = Stabilizer::new();
        let config = StabilizerConfig::default();
        let mut last = Vec::new();
        for frame in 0..config.lock_streak as u64 {
            last = stabilizer.step(&[det(1, "person", 0.9)], frame, &config);
        }
        assert!(last[0].locked);
        assert_eq!(last[0].published_class, "person");
    }

    #[test]
    fn unlocks_after_enough_contradictions() {
        let mut stabilizer = Stabilizer::new();
        let config = StabilizerConfig::default();
        for frame in 0..config.lock_streak as u64 {
            stabilizer.step(&[det(1, "person", 0.9)], frame, &config);
        }
        assert!(stabilizer.state(TrackId(1)).unwrap().locked());

        let mut frame = config.lock_streak as u64;
        let mut last_locked = true;
        for _ in 0..config.window_size {
            let out = stabilizer.step(&[det(1, "dog", 0.9)], frame, &config);
            last_locked = out[0].locked;
            frame += 1;
        }
        assert!(!last_locked);
    }

    #[test]
    fn unknown_class_dropped() {
        let mut stabilizer = Stabilizer::new();
        let config = StabilizerConfig::default();
        let out = stabilizer.step(&[det(1, "unicorn", 0.9)], 0, &config);
        assert!(out.is_empty());
    }

    #[test]
    fn confidence_step_bounded_by_alpha() {
        let mut stabilizer = Stabilizer::new();
        let config = StabilizerConfig::default();
        stabilizer.step(&[det(1, "person", 0.0)], 0, &config);
        let out = stabilizer.step(&[det(1, "person", 1.0)], 1, &config);
        assert!(out[0].published_confidence <= config.alpha + 1e-6);
    }
}
