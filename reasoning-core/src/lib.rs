//! Behavioral reasoning core for edge video-surveillance.
//!
//! Consumes a per-frame detection/tracking feed and produces structured
//! reasoning events (loitering, rapid movement, zone intrusion, theft,
//! fighting, abandoned objects, crowd forming) through temporal
//! stabilization, kinematic context accumulation, spatial zone evaluation,
//! severity scoring, and a battery of per-track state machines. See
//! [`FrameCoordinator`] for the single entry point.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod detectors;
pub mod error;
pub mod model;
pub mod severity;
pub mod spatial;
pub mod stabilizer;
pub mod store;

pub use coordinator::{FrameCoordinator, FrameResult};
pub use error::{ReasoningError, Result};
pub use model::{
    BBox, ContextValue, Detection, Event, EventContext, EventId, EventType, FrameShape,
    SeverityLevel, SeverityScore, SpatialViolation, StabilizedDetection, TrackId, TrackObservation,
    ViolationKind, Zone, ZoneId, ZoneType,
};
