//! Frame coordinator (§4.1): drives the full per-frame pipeline exactly
//! once, in a fixed order, single-threaded.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::context::ContextEngine;
use crate::detectors::{DetectorBattery, DetectorFrame};
use crate::model::{Detection, Event, FrameShape, SpatialViolation, TrackId, Zone};
use crate::spatial::{SpatialEngine, TrackInput};
use crate::stabilizer::Stabilizer;
use crate::store::EventStore;

/// Output of one `process_frame` call (§4.1).
#[derive(Debug)]
pub struct FrameResult {
    pub stabilized_count: usize,
    pub violations: Vec<SpatialViolation>,
    pub new_events: Vec<Event>,
    pub processing_time: Duration,
}

#[derive(Debug, Default)]
struct ErrorCounters {
    input_invalid: u64,
    state_corrupted: u64,
}

/// Drives stabilizer -> context -> spatial -> severity -> detectors -> store
/// for one camera's detection feed.
pub struct FrameCoordinator {
    stabilizer: Stabilizer,
    context: ContextEngine,
    spatial: SpatialEngine,
    detectors: DetectorBattery,
    pub store: EventStore,
    config: Config,
    zones: HashMap<String, Zone>,
    frame_index: u64,
    errors: ErrorCounters,
    recent_processing_times: std::collections::VecDeque<Duration>,
}

impl std::fmt::Debug for FrameCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCoordinator")
            .field("frame_index", &self.frame_index)
            .field("tracks", &self.stabilizer.track_count())
            .field("errors", &self.errors)
            .finish()
    }
}

impl FrameCoordinator {
    pub fn new(config: Config) -> Self {
        let zones = config.zones();
        let store = EventStore::new(
            config.store.capacity,
            config.store.dedup_window_s,
            config.store.broadcast_capacity,
        );
        FrameCoordinator {
            stabilizer: Stabilizer::new(),
            context: ContextEngine::new(),
            spatial: SpatialEngine::new(),
            detectors: DetectorBattery::new(),
            store,
            config,
            zones,
            frame_index: 0,
            errors: ErrorCounters::default(),
            recent_processing_times: std::collections::VecDeque::with_capacity(100),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process one frame's detections (§4.1): validate, dedup, clip, then
    /// run the full downstream pipeline exactly once.
    pub fn process_frame(
        &mut self,
        detections: Vec<Detection>,
        frame_shape: FrameShape,
        timestamp: DateTime<Local>,
        fps: f32,
    ) -> FrameResult {
        let start = Instant::now();
        self.frame_index += 1;

        let cleaned = self.validate_and_dedup(detections, frame_shape);

        let stabilized = self.stabilizer.step(&cleaned, self.frame_index, &self.config.stabilizer);
        self.context.step(&stabilized, self.frame_index, timestamp, fps, &self.config.context);
        self.context.mark_disappeared(self.frame_index, self.config.context.missing_frames);

        let track_inputs: Vec<TrackInput<'_>> = stabilized
            .iter()
            .map(|d| TrackInput { track_id: d.track_id, bbox: d.bbox, class: d.published_class.as_str() })
            .collect();
        let (containment, violations) = self.spatial.step(&track_inputs, &self.zones, timestamp);

        let now_s = timestamp.timestamp() as f64 + timestamp.timestamp_subsec_millis() as f64 / 1000.0;
        for (track_id, zones) in &containment {
            self.context.set_zone(*track_id, zones.first().cloned(), now_s);
        }

        let detector_frame = DetectorFrame {
            context: &self.context,
            violations: &violations,
            timestamp,
            thresholds: &self.config.thresholds,
            config: &self.config,
        };
        let publish_requests = self.detectors.step(&detector_frame);

        let mut new_events = Vec::with_capacity(publish_requests.len());
        for req in publish_requests {
            if let Some(event) = self.store.publish(req) {
                new_events.push(event);
            }
        }

        if self.frame_index % self.config.cleanup_interval_frames.max(1) == 0 {
            self.run_cleanup();
        }

        let elapsed = start.elapsed();
        self.recent_processing_times.push_back(elapsed);
        while self.recent_processing_times.len() > 100 {
            self.recent_processing_times.pop_front();
        }

        FrameResult {
            stabilized_count: stabilized.len(),
            violations,
            new_events,
            processing_time: elapsed,
        }
    }

    /// Drop malformed records, clip boxes to frame bounds, and keep only
    /// the highest-confidence detection per duplicated track id (§4.1).
    fn validate_and_dedup(&mut self, detections: Vec<Detection>, frame_shape: FrameShape) -> Vec<Detection> {
        let mut best: HashMap<TrackId, Detection> = HashMap::new();
        for mut det in detections {
            if !det.bbox.is_valid() || !(0.0..=1.0).contains(&det.confidence) {
                self.errors.input_invalid += 1;
                tracing::debug!(track_id = det.track_id.0, "dropped invalid detection");
                continue;
            }
            det.bbox = det.bbox.clip(frame_shape.width, frame_shape.height);

            match best.get(&det.track_id) {
                Some(existing) if existing.confidence >= det.confidence => {}
                _ => {
                    best.insert(det.track_id, det);
                }
            }
        }
        best.into_values().collect()
    }

    fn run_cleanup(&mut self) {
        let forget = self.config.stabilizer.forget_frames;
        self.stabilizer.cleanup(self.frame_index, forget);
        self.context.cleanup(self.frame_index, forget);

        let live_tracks: HashSet<TrackId> = self.context.iter().map(|(id, _)| *id).collect();
        self.spatial.cleanup(&live_tracks);
    }

    /// Reset a track whose per-track state violates an invariant (§4.2/§4.3
    /// failure semantics): clear it everywhere so it begins a fresh lifecycle.
    pub fn reset_track(&mut self, track_id: TrackId) {
        self.errors.state_corrupted += 1;
        self.stabilizer.reset_track(track_id);
        self.context.reset_track(track_id);
    }

    pub fn input_invalid_count(&self) -> u64 {
        self.errors.input_invalid
    }

    pub fn state_corrupted_count(&self) -> u64 {
        self.errors.state_corrupted
    }

    pub fn average_processing_time(&self) -> Duration {
        if self.recent_processing_times.is_empty() {
            return Duration::ZERO;
        }
        self.recent_processing_times.iter().sum::<Duration>() / self.recent_processing_times.len() as u32
    }

    pub fn track_count(&self) -> usize {
        self.stabilizer.track_count()
    }

    /// `true` when the per-frame error rate has crossed an operability
    /// threshold in the recent window (§7 "degraded" status).
    pub fn is_degraded(&self) -> bool {
        self.errors.input_invalid + self.errors.state_corrupted > 1000
    }
}
