use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Opaque track identifier assigned upstream by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically assigned event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable zone identifier, supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        ZoneId(s.to_string())
    }
}

/// Axis-aligned bounding box in pixel coordinates `(x1, y1, x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn clip(&self, width: f32, height: f32) -> BBox {
        BBox {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    pub fn centroid(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Bottom-center reference point used for zone containment (§4.4).
    pub fn bottom_center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, self.y2)
    }

    pub fn is_valid(&self) -> bool {
        self.x2 > self.x1 && self.y2 > self.y1
    }
}

/// A single per-frame detection record from the upstream detector/tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub track_id: TrackId,
    pub bbox: BBox,
    pub class_name: String,
    pub confidence: f32,
}

/// Frame dimensions, `(height, width)` in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameShape {
    pub height: f32,
    pub width: f32,
}

/// A detection annotated with coordinator-assigned provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackObservation {
    pub detection: Detection,
    pub frame_index: u64,
    pub timestamp: DateTime<Local>,
}

/// A detection after temporal stabilization: the published class may differ
/// from the raw observed class.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizedDetection {
    pub track_id: TrackId,
    pub bbox: BBox,
    pub published_class: String,
    pub published_confidence: f32,
    pub locked: bool,
}

/// Zone policy type (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    Normal,
    Restricted,
    EntryOnly,
    ExitOnly,
    TimeRestricted,
    CrowdLimit,
}

/// Local time-of-day window, `start`/`end` in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_minute: u16,
    pub end_minute: u16,
}

impl TimeWindow {
    pub fn contains(&self, minute_of_day: u16) -> bool {
        if self.start_minute <= self.end_minute {
            (self.start_minute..=self.end_minute).contains(&minute_of_day)
        } else {
            // window wraps midnight
            minute_of_day >= self.start_minute || minute_of_day <= self.end_minute
        }
    }
}

/// An operator-defined polygonal region with an associated policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub polygon: Vec<(f32, f32)>,
    pub zone_type: ZoneType,
    pub allowed_window: Option<TimeWindow>,
    pub max_occupancy: Option<u32>,
    pub allowed_classes: Option<Vec<String>>,
    pub denied_classes: Option<Vec<String>>,
    pub severity_weight: f32,
    pub use_center: bool,
    pub alert_on_entry: bool,
    pub allowed_direction: Option<(f32, f32)>,
}

impl Zone {
    pub fn area(&self) -> f64 {
        let n = self.polygon.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0f64;
        for i in 0..n {
            let (x1, y1) = self.polygon[i];
            let (x2, y2) = self.polygon[(i + 1) % n];
            sum += (x1 as f64) * (y2 as f64) - (x2 as f64) * (y1 as f64);
        }
        (sum / 2.0).abs()
    }
}

/// Kind of spatial policy breach (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    RestrictedEntry,
    TimeWindow,
    WrongDirection,
    CrowdLimitExceeded,
    DisallowedClass,
}

/// A single spatial policy breach observed this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialViolation {
    pub track_id: TrackId,
    pub zone_id: ZoneId,
    pub kind: ViolationKind,
    pub timestamp: DateTime<Local>,
    pub severity_weight: f32,
}

/// Categorical severity bucket (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    pub fn from_score(score: f32) -> SeverityLevel {
        if score >= 0.7 {
            SeverityLevel::Critical
        } else if score >= 0.5 {
            SeverityLevel::High
        } else if score >= 0.3 {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        }
    }
}

/// A weighted severity score with its factor breakdown (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityScore {
    pub score: f32,
    pub level: SeverityLevel,
    pub factors: BTreeMap<String, f32>,
}

/// Behavioral classification emitted by the event intelligence layer (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Loitering,
    Running,
    ZoneViolation,
    Intrusion,
    Fighting,
    TheftSuspected,
    AbandonedObject,
    CrowdForming,
    Normal,
}

/// A scalar/string/bool/list value usable in an event's free-form context map.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<ContextValue>),
}

impl Serialize for ContextValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ContextValue::String(s) => serializer.serialize_str(s),
            ContextValue::Number(n) => serializer.serialize_f64(*n),
            ContextValue::Bool(b) => serializer.serialize_bool(*b),
            ContextValue::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContextValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        Ok(ContextValue::from_json(&v))
    }
}

impl ContextValue {
    fn from_json(v: &serde_json::Value) -> ContextValue {
        match v {
            serde_json::Value::String(s) => ContextValue::String(s.clone()),
            serde_json::Value::Number(n) => ContextValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::Bool(b) => ContextValue::Bool(*b),
            serde_json::Value::Array(items) => {
                ContextValue::List(items.iter().map(ContextValue::from_json).collect())
            }
            serde_json::Value::Null => ContextValue::Bool(false),
            serde_json::Value::Object(_) => ContextValue::String(v.to_string()),
        }
    }
}

impl From<f64> for ContextValue {
    fn from(n: f64) -> Self {
        ContextValue::Number(n)
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::String(s.to_string())
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

/// An ordered free-form context map attached to an emitted event.
pub type EventContext = BTreeMap<String, ContextValue>;

/// A reasoning event, the core's sole externally visible output record (§3, §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub event_type: EventType,
    pub severity: SeverityLevel,
    pub severity_score: f32,
    pub track_id: u64,
    pub zone_id: Option<ZoneId>,
    pub reasoning_text: String,
    pub duration: f32,
    pub timestamp: DateTime<Local>,
    pub context: EventContext,
}
