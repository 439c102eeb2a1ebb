//! Immutable run configuration (§6.5).
//!
//! Loaded once at startup from a TOML document, with every numeric default
//! named in the reasoning design overridable. Mirrors the layered
//! defaults-then-file-then-env composition used elsewhere in this stack's
//! configuration loaders, collapsed here into a single `Config::load`
//! entry point since the reasoning core has only one caller.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReasoningError, Result};
use crate::model::{TimeWindow, Zone, ZoneType};

/// Default allow-listed classes gating stabilizer input (§6.4).
pub const DEFAULT_CLASS_CATALOG: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "bus",
    "truck",
    "backpack",
    "handbag",
    "suitcase",
    "sports ball",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "chair",
    "couch",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "book",
    "scissors",
    "clock",
    "frisbee",
    "tv",
    "traffic light",
    "stop sign",
    "toothbrush",
    "hair drier",
];

/// Graspable classes eligible for the theft-suspicion detector (§4.6.4).
pub const GRASPABLE_CLASSES: &[&str] = &[
    "handbag",
    "backpack",
    "suitcase",
    "bottle",
    "cell phone",
    "laptop",
    "book",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfig {
    pub window_size: usize,
    pub alpha: f32,
    pub unlock_contradictions: usize,
    pub lock_streak: usize,
    pub forget_frames: u64,
    pub allow_list: Vec<String>,
    pub block_list: Vec<String>,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        StabilizerConfig {
            window_size: 10,
            alpha: 0.3,
            unlock_contradictions: 8,
            lock_streak: 5,
            forget_frames: 30,
            allow_list: DEFAULT_CLASS_CATALOG.iter().map(|s| s.to_string()).collect(),
            block_list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    pub position_history_len: usize,
    pub velocity_smoothing_samples: usize,
    pub direction_change_window: usize,
    pub stationary_speed_px_s: f32,
    pub missing_frames: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            position_history_len: 30,
            velocity_smoothing_samples: 5,
            direction_change_window: 30,
            stationary_speed_px_s: 5.0,
            missing_frames: 15, // fps * 0.5 at the default 30fps feed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub duration: f32,
    pub zone: f32,
    pub class: f32,
    pub speed: f32,
    pub time: f32,
    pub crowd: f32,
    pub history: f32,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        SeverityWeights {
            duration: 0.25,
            zone: 0.20,
            class: 0.15,
            speed: 0.15,
            time: 0.10,
            crowd: 0.10,
            history: 0.05,
        }
    }
}

impl SeverityWeights {
    fn sum(&self) -> f32 {
        self.duration + self.zone + self.class + self.speed + self.time + self.crowd + self.history
    }

    /// Renormalize to sum to 1.0; returns true if renormalization was needed.
    fn normalize(&mut self) -> bool {
        let total = self.sum();
        if (total - 1.0).abs() < 1e-3 {
            return false;
        }
        if total <= 0.0 {
            *self = SeverityWeights::default();
            return true;
        }
        self.duration /= total;
        self.zone /= total;
        self.class /= total;
        self.speed /= total;
        self.time /= total;
        self.crowd /= total;
        self.history /= total;
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorThresholds {
    pub v_run_px_s: f32,
    pub v_run_high_px_s: f32,
    pub running_sustain_s: f32,
    pub loiter_stationary_s: f32,
    pub loiter_s: f32,
    pub loiter_suspicious_s: f32,
    pub motion_resume_s: f32,
    pub theft_near_px: f32,
    pub theft_concealment_s: f32,
    pub theft_exit_speed_px_s: f32,
    pub theft_interaction_break_s: f32,
    pub fight_distance_px: f32,
    pub fight_sustain_s: f32,
    pub fight_speed_px_s: f32,
    pub fight_direction_changes: u32,
    pub abandoned_stationary_s: f32,
    pub abandoned_person_radius_px: f32,
    pub crowd_count: u32,
    pub crowd_count_high: u32,
    pub crowd_throttle_s: f32,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        DetectorThresholds {
            v_run_px_s: 150.0,
            v_run_high_px_s: 200.0,
            running_sustain_s: 0.5,
            loiter_stationary_s: 5.0,
            loiter_s: 10.0,
            loiter_suspicious_s: 15.0,
            motion_resume_s: 2.0,
            theft_near_px: 50.0,
            theft_concealment_s: 2.0,
            theft_exit_speed_px_s: 80.0,
            theft_interaction_break_s: 1.0,
            fight_distance_px: 100.0,
            fight_sustain_s: 1.0,
            fight_speed_px_s: 60.0,
            fight_direction_changes: 3,
            abandoned_stationary_s: 30.0,
            abandoned_person_radius_px: 200.0,
            crowd_count: 3,
            crowd_count_high: 5,
            crowd_throttle_s: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub capacity: usize,
    pub dedup_window_s: f32,
    pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: 100,
            dedup_window_s: 5.0,
            broadcast_capacity: 256,
        }
    }
}

/// On-disk zone document shape (§6.5); validated and converted into
/// [`crate::model::Zone`] at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: String,
    pub name: String,
    pub polygon: Vec<(f32, f32)>,
    pub zone_type: ZoneType,
    #[serde(default)]
    pub allowed_window: Option<TimeWindow>,
    #[serde(default)]
    pub max_occupancy: Option<u32>,
    #[serde(default)]
    pub allowed_classes: Option<Vec<String>>,
    #[serde(default)]
    pub denied_classes: Option<Vec<String>>,
    #[serde(default = "default_severity_weight")]
    pub severity_weight: f32,
    #[serde(default)]
    pub use_center: bool,
    #[serde(default)]
    pub alert_on_entry: bool,
    #[serde(default)]
    pub allowed_direction: Option<(f32, f32)>,
}

fn default_severity_weight() -> f32 {
    1.0
}

/// The fully validated, immutable run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub severity_weights: SeverityWeights,
    #[serde(default)]
    pub thresholds: DetectorThresholds,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cleanup_interval_frames: u64,
    #[serde(default)]
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            zones: Vec::new(),
            stabilizer: StabilizerConfig::default(),
            context: ContextConfig::default(),
            severity_weights: SeverityWeights::default(),
            thresholds: DetectorThresholds::default(),
            store: StoreConfig::default(),
            cleanup_interval_frames: 300,
            production: false,
        }
    }
}

impl Config {
    /// Parse and validate a configuration document, rejecting zero-area
    /// polygons and renormalizing severity weights that don't sum to 1.0.
    pub fn from_toml_str(text: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(text)
            .map_err(|e| ReasoningError::ZoneConfigError(format!("invalid config document: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<()> {
        for zone in &self.zones {
            self.validate_zone(zone)?;
        }
        if self.severity_weights.normalize() {
            tracing::warn!("severity weights did not sum to 1.0; renormalized");
        }
        Ok(())
    }

    fn validate_zone(&self, zone: &ZoneDef) -> Result<()> {
        if zone.polygon.len() < 3 {
            return Err(ReasoningError::ZoneConfigError(format!(
                "zone {} has fewer than 3 vertices",
                zone.id
            )));
        }
        let area = polygon_area(&zone.polygon);
        if area <= 0.0 {
            return Err(ReasoningError::ZoneConfigError(format!(
                "zone {} has zero area",
                zone.id
            )));
        }
        Ok(())
    }

    /// Materialize validated [`Zone`] records keyed by id, for the spatial engine.
    pub fn zones(&self) -> HashMap<String, Zone> {
        self.zones
            .iter()
            .map(|z| {
                (
                    z.id.clone(),
                    Zone {
                        id: z.id.as_str().into(),
                        name: z.name.clone(),
                        polygon: z.polygon.clone(),
                        zone_type: z.zone_type,
                        allowed_window: z.allowed_window,
                        max_occupancy: z.max_occupancy,
                        allowed_classes: z.allowed_classes.clone(),
                        denied_classes: z.denied_classes.clone(),
                        severity_weight: z.severity_weight,
                        use_center: z.use_center,
                        alert_on_entry: z.alert_on_entry,
                        allowed_direction: z.allowed_direction,
                    },
                )
            })
            .collect()
    }
}

fn polygon_area(points: &[(f32, f32)]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for i in 0..n {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % n];
        sum += (x1 as f64) * (y2 as f64) - (x2 as f64) * (y1 as f64);
    }
    (sum / 2.0).abs()
}
