//! Event intelligence (§4.6): seven per-track or per-pair state machines,
//! expressed as a tagged variant over a common "step per frame" capability
//! rather than a class hierarchy (§9).

mod abandoned;
mod crowd;
mod fighting;
mod loitering;
mod running;
mod theft;
mod zone;

pub use abandoned::AbandonedDetector;
pub use crowd::CrowdDetector;
pub use fighting::FightingDetector;
pub use loitering::LoiteringDetector;
pub use running::RunningDetector;
pub use theft::TheftDetector;
pub use zone::ZoneDetector;

use chrono::{DateTime, Local};

use crate::config::{Config, DetectorThresholds};
use crate::context::ContextEngine;
use crate::model::SpatialViolation;
use crate::store::PublishRequest;

/// Shared per-frame view handed to every detector.
pub struct DetectorFrame<'a> {
    pub context: &'a ContextEngine,
    pub violations: &'a [SpatialViolation],
    pub timestamp: DateTime<Local>,
    pub thresholds: &'a DetectorThresholds,
    pub config: &'a Config,
}

/// Common capability every detector variant implements: advance one frame
/// and return zero or more publish requests.
pub trait Detector {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest>;
}

/// Tagged dispatch over the six detector kinds (§9), avoiding dynamic
/// dispatch across unrelated detector types.
pub enum DetectorKind {
    Loitering(LoiteringDetector),
    Running(RunningDetector),
    Zone(ZoneDetector),
    Theft(TheftDetector),
    Fighting(FightingDetector),
    Abandoned(AbandonedDetector),
    Crowd(CrowdDetector),
}

impl Detector for DetectorKind {
    fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        match self {
            DetectorKind::Loitering(d) => d.step(frame),
            DetectorKind::Running(d) => d.step(frame),
            DetectorKind::Zone(d) => d.step(frame),
            DetectorKind::Theft(d) => d.step(frame),
            DetectorKind::Fighting(d) => d.step(frame),
            DetectorKind::Abandoned(d) => d.step(frame),
            DetectorKind::Crowd(d) => d.step(frame),
        }
    }
}

/// The full detector battery run every frame by the coordinator.
pub struct DetectorBattery {
    detectors: Vec<DetectorKind>,
}

impl Default for DetectorBattery {
    fn default() -> Self {
        DetectorBattery {
            detectors: vec![
                DetectorKind::Loitering(LoiteringDetector::default()),
                DetectorKind::Running(RunningDetector::default()),
                DetectorKind::Zone(ZoneDetector::default()),
                DetectorKind::Theft(TheftDetector::default()),
                DetectorKind::Fighting(FightingDetector::default()),
                DetectorKind::Abandoned(AbandonedDetector::default()),
                DetectorKind::Crowd(CrowdDetector::default()),
            ],
        }
    }
}

impl DetectorBattery {
    pub fn new() -> Self {
        DetectorBattery::default()
    }

    pub fn step(&mut self, frame: &DetectorFrame<'_>) -> Vec<PublishRequest> {
        let mut out = Vec::new();
        for detector in &mut self.detectors {
            out.extend(detector.step(frame));
        }
        out
    }
}
