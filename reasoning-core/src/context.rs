//! Behavioral context accumulation (§4.3): per-track trajectories,
//! velocities, dwell times, and derived kinematic features.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local};

use crate::config::ContextConfig;
use crate::model::{StabilizedDetection, TrackId, ZoneId};

#[derive(Debug, Clone, Copy)]
struct Sample {
    cx: f32,
    cy: f32,
    frame_index: u64,
    timestamp_s: f64,
}

/// Per-track kinematic and temporal state, owned exclusively by the context engine.
#[derive(Debug, Clone)]
pub struct ObjectState {
    pub class: String,
    pub first_seen: DateTime<Local>,
    pub last_seen: DateTime<Local>,
    pub last_seen_frame: u64,
    positions: VecDeque<Sample>,
    speed_samples: VecDeque<f32>,
    heading_samples: VecDeque<f32>,
    pub velocity: (f32, f32),
    pub speed: f32,
    pub acceleration: f32,
    pub direction_changes: u32,
    pub current_zone: Option<ZoneId>,
    zone_entered_at: Option<f64>,
    pub total_dwell: f32,
    pub disappeared: bool,
    pub age_frames: u64,
    pub path_length: f32,
    last_speed: f32,
    motion_resumed_at: Option<f64>,
    stationary_since: Option<f64>,
}

impl ObjectState {
    fn new(class: String, now: DateTime<Local>, frame_index: u64) -> Self {
        ObjectState {
            class,
            first_seen: now,
            last_seen: now,
            last_seen_frame: frame_index,
            positions: VecDeque::new(),
            speed_samples: VecDeque::new(),
            heading_samples: VecDeque::new(),
            velocity: (0.0, 0.0),
            speed: 0.0,
            acceleration: 0.0,
            direction_changes: 0,
            current_zone: None,
            zone_entered_at: None,
            total_dwell: 0.0,
            disappeared: false,
            age_frames: 0,
            path_length: 0.0,
            last_speed: 0.0,
            motion_resumed_at: None,
            stationary_since: None,
        }
    }

    pub fn centroid(&self) -> Option<(f32, f32)> {
        self.positions.back().map(|s| (s.cx, s.cy))
    }

    pub fn is_stationary(&self, threshold: f32) -> bool {
        self.speed < threshold
    }

    pub fn is_loitering(&self, threshold_s: f32, threshold_speed: f32) -> bool {
        self.dwell_time() >= threshold_s && self.is_stationary(threshold_speed)
    }

    pub fn dwell_time(&self) -> f32 {
        match (self.zone_entered_at, self.positions.back()) {
            (Some(entered), Some(last)) => (last.timestamp_s - entered).max(0.0) as f32,
            _ => 0.0,
        }
    }

    pub fn distance_to(&self, other: &ObjectState) -> Option<f32> {
        match (self.centroid(), other.centroid()) {
            (Some((x1, y1)), Some((x2, y2))) => Some(((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()),
            _ => None,
        }
    }

    /// Seconds of sustained motion since the track stopped being stationary.
    pub fn motion_duration_s(&self, now_s: f64) -> f32 {
        self.motion_resumed_at.map(|t| (now_s - t).max(0.0) as f32).unwrap_or(0.0)
    }

    /// Seconds the track has been continuously stationary.
    pub fn stationary_duration_s(&self, now_s: f64) -> f32 {
        self.stationary_since.map(|t| (now_s - t).max(0.0) as f32).unwrap_or(0.0)
    }
}

/// Behavioral context engine, keyed by track id.
#[derive(Debug, Default)]
pub struct ContextEngine {
    states: HashMap<TrackId, ObjectState>,
}

impl ContextEngine {
    pub fn new() -> Self {
        ContextEngine::default()
    }

    /// Update kinematic state for this frame's stabilized detections.
    pub fn step(
        &mut self,
        detections: &[StabilizedDetection],
        frame_index: u64,
        timestamp: DateTime<Local>,
        fps: f32,
        config: &ContextConfig,
    ) {
        let now_s = timestamp.timestamp() as f64 + timestamp.timestamp_subsec_millis() as f64 / 1000.0;

        for det in detections {
            let (cx, cy) = det.bbox.centroid();
            let state = self
                .states
                .entry(det.track_id)
                .or_insert_with(|| ObjectState::new(det.published_class.clone(), timestamp, frame_index));

            state.class = det.published_class.clone();
            state.last_seen = timestamp;
            state.last_seen_frame = frame_index;
            state.disappeared = false;
            state.age_frames += 1;

            let prev = state.positions.back().copied();
            if let Some(prev) = prev {
                let dt = (now_s - prev.timestamp_s).max(1.0 / fps.max(1.0) as f64) as f32;
                let vx = (cx - prev.cx) / dt;
                let vy = (cy - prev.cy) / dt;
                let instant_speed = (vx * vx + vy * vy).sqrt();

                state.speed_samples.push_back(instant_speed);
                while state.speed_samples.len() > config.velocity_smoothing_samples {
                    state.speed_samples.pop_front();
                }
                let smoothed_speed =
                    state.speed_samples.iter().sum::<f32>() / state.speed_samples.len() as f32;

                state.acceleration = smoothed_speed - state.last_speed;
                state.last_speed = smoothed_speed;
                state.velocity = (vx, vy);
                state.speed = smoothed_speed;
                state.path_length += ((cx - prev.cx).powi(2) + (cy - prev.cy).powi(2)).sqrt();

                if instant_speed > 1e-3 {
                    let heading = vy.atan2(vx);
                    if let Some(&last_heading) = state.heading_samples.back() {
                        let delta = (heading - last_heading).abs();
                        if delta > 0.5 {
                            state.direction_changes += 1;
                        }
                    }
                    state.heading_samples.push_back(heading);
                    while state.heading_samples.len() > config.direction_change_window {
                        state.heading_samples.pop_front();
                    }
                }

                if state.is_stationary(config.stationary_speed_px_s) {
                    state.motion_resumed_at = None;
                } else {
                    state.motion_resumed_at.get_or_insert(now_s);
                }
            }

            if state.is_stationary(config.stationary_speed_px_s) {
                state.stationary_since.get_or_insert(now_s);
            } else {
                state.stationary_since = None;
            }

            state.positions.push_back(Sample { cx, cy, frame_index, timestamp_s: now_s });
            while state.positions.len() > config.position_history_len {
                state.positions.pop_front();
            }
        }
    }

    /// Set or clear a track's current zone, resetting the dwell clock on change (§4.4).
    pub fn set_zone(&mut self, track_id: TrackId, zone: Option<ZoneId>, now_s: f64) {
        if let Some(state) = self.states.get_mut(&track_id) {
            if state.current_zone != zone {
                if state.current_zone.is_some() {
                    state.total_dwell += state.dwell_time();
                }
                state.current_zone = zone;
                state.zone_entered_at = Some(now_s);
            }
        }
    }

    /// Mark tracks not observed this frame as possibly disappeared, based on
    /// elapsed frames since last observation.
    pub fn mark_disappeared(&mut self, current_frame: u64, missing_frames: u64) {
        for state in self.states.values_mut() {
            if current_frame.saturating_sub(state.last_seen_frame) >= missing_frames {
                state.disappeared = true;
            }
        }
    }

    pub fn cleanup(&mut self, current_frame: u64, forget_frames: u64) {
        self.states
            .retain(|_, s| current_frame.saturating_sub(s.last_seen_frame) < forget_frames);
    }

    pub fn state(&self, track_id: TrackId) -> Option<&ObjectState> {
        self.states.get(&track_id)
    }

    pub fn reset_track(&mut self, track_id: TrackId) {
        self.states.remove(&track_id);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, &ObjectState)> {
        self.states.iter()
    }

    pub fn tracks_of_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = (&'a TrackId, &'a ObjectState)> {
        self.states.iter().filter(move |(_, s)| s.class == class && !s.disappeared)
    }

    /// True if any live track of `class` lies within `radius` px of `track_id`'s centroid.
    pub fn near_object(&self, track_id: TrackId, class: &str, radius: f32) -> bool {
        let Some(origin) = self.states.get(&track_id) else {
            return false;
        };
        self.tracks_of_class(class)
            .filter(|(id, _)| **id != track_id)
            .any(|(_, other)| origin.distance_to(other).is_some_and(|d| d <= radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, TrackId as Tid};
    use chrono::TimeZone;

    fn stabilized(track_id: u64, cx: f32, cy: f32) -> StabilizedDetection {
        StabilizedDetection {
            track_id: Tid(track_id),
            bbox: BBox { x1: cx - 5.0, y1: cy - 5.0, x2: cx + 5.0, y2: cy + 5.0 },
            published_class: "person".to_string(),
            published_confidence: 0.9,
            locked: true,
        }
    }

    #[test]
    fn stationary_track_has_low_speed() {
        let mut engine = ContextEngine::new();
        let config = ContextConfig::default();
        let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        for i in 0..10u64 {
            let t = base + chrono::Duration::milliseconds((i as i64) * 33);
            engine.step(&[stabilized(1, 500.0, 500.0)], i, t, 30.0, &config);
        }
        let state = engine.state(Tid(1)).unwrap();
        assert!(state.is_stationary(config.stationary_speed_px_s));
    }

    #[test]
    fn moving_track_has_positive_speed() {
        let mut engine = ContextEngine::new();
        let config = ContextConfig::default();
        let base = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        for i in 0..10u64 {
            let t = base + chrono::Duration::milliseconds((i as i64) * 33);
            engine.step(&[stabilized(1, 500.0 + i as f32 * 50.0, 500.0)], i, t, 30.0, &config);
        }
        let state = engine.state(Tid(1)).unwrap();
        assert!(state.speed > config.stationary_speed_px_s);
    }
}
