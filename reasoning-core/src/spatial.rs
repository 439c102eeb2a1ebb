//! Spatial zone evaluation (§4.4): point-in-polygon containment and
//! zone-policy violation rules.

use std::collections::HashMap;

use chrono::{DateTime, Local, Timelike};

use crate::model::{BBox, SpatialViolation, TrackId, ViolationKind, Zone, ZoneId, ZoneType};

/// Ray-casting containment test; a point exactly on an edge counts as inside.
pub fn point_in_polygon(point: (f32, f32), polygon: &[(f32, f32)]) -> bool {
    let (px, py) = point;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];

        if on_segment(point, (xi, yi), (xj, yj)) {
            return true;
        }

        let intersects = (yi > py) != (yj > py)
            && px < (xj - xi) * (py - yi) / (yj - yi) + xi;
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    if cross.abs() > 1e-3 {
        return false;
    }
    let dot = (p.0 - a.0) * (b.0 - a.0) + (p.1 - a.1) * (b.1 - a.1);
    let len_sq = (b.0 - a.0).powi(2) + (b.1 - a.1).powi(2);
    (0.0..=len_sq).contains(&dot)
}

fn containment_point(bbox: &BBox, zone: &Zone) -> (f32, f32) {
    if zone.use_center {
        bbox.centroid()
    } else {
        bbox.bottom_center()
    }
}

/// Per-track record of which zones it was inside on the prior frame, used
/// to detect rising edges (entry) and crossing direction.
#[derive(Debug, Default, Clone)]
struct TrackZoneHistory {
    inside: Vec<String>,
    last_point: Option<(f32, f32)>,
}

/// Spatial engine; owns per-zone occupancy and per-track containment history.
#[derive(Debug, Default)]
pub struct SpatialEngine {
    history: HashMap<TrackId, TrackZoneHistory>,
    occupancy: HashMap<String, u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackInput<'a> {
    pub track_id: TrackId,
    pub bbox: BBox,
    pub class: &'a str,
}

impl SpatialEngine {
    pub fn new() -> Self {
        SpatialEngine::default()
    }

    /// Evaluate containment and violations for this frame's tracks against
    /// the configured zones. Returns, per track, its current zone ids and
    /// any violations raised this frame.
    pub fn step(
        &mut self,
        tracks: &[TrackInput<'_>],
        zones: &HashMap<String, Zone>,
        timestamp: DateTime<Local>,
    ) -> (HashMap<TrackId, Vec<ZoneId>>, Vec<SpatialViolation>) {
        let mut containment: HashMap<TrackId, Vec<ZoneId>> = HashMap::new();
        let mut violations = Vec::new();
        let mut new_occupancy: HashMap<String, u32> = HashMap::new();

        for track in tracks {
            let mut current_zones = Vec::new();
            for zone in zones.values() {
                let point = containment_point(&track.bbox, zone);
                if !point_in_polygon(point, &zone.polygon) {
                    continue;
                }
                current_zones.push(ZoneId(zone.id.0.clone()));

                let class_allowed = zone
                    .allowed_classes
                    .as_ref()
                    .is_none_or(|allowed| allowed.iter().any(|c| c == track.class));
                if class_allowed {
                    *new_occupancy.entry(zone.id.0.clone()).or_insert(0) += 1;
                }

                let class_denied = zone
                    .denied_classes
                    .as_ref()
                    .is_some_and(|denied| denied.iter().any(|c| c == track.class));
                if class_denied {
                    violations.push(SpatialViolation {
                        track_id: track.track_id,
                        zone_id: zone.id.clone(),
                        kind: ViolationKind::DisallowedClass,
                        timestamp,
                        severity_weight: zone.severity_weight,
                    });
                }

                let prior = self.history.get(&track.track_id);
                let was_inside = prior.is_some_and(|h| h.inside.contains(&zone.id.0));

                if zone.zone_type == ZoneType::Restricted && !was_inside {
                    violations.push(SpatialViolation {
                        track_id: track.track_id,
                        zone_id: zone.id.clone(),
                        kind: ViolationKind::RestrictedEntry,
                        timestamp,
                        severity_weight: zone.severity_weight,
                    });
                }

                if zone.zone_type == ZoneType::TimeRestricted {
                    let minute_of_day = timestamp.hour() * 60 + timestamp.minute();
                    let within = zone
                        .allowed_window
                        .is_none_or(|w| w.contains(minute_of_day as u16));
                    if !within {
                        violations.push(SpatialViolation {
                            track_id: track.track_id,
                            zone_id: zone.id.clone(),
                            kind: ViolationKind::TimeWindow,
                            timestamp,
                            severity_weight: zone.severity_weight,
                        });
                    }
                }

                if matches!(zone.zone_type, ZoneType::EntryOnly | ZoneType::ExitOnly) {
                    if let (Some(prior), Some(allowed_dir)) =
                        (prior.and_then(|h| h.last_point), zone.allowed_direction)
                    {
                        let displacement = (point.0 - prior.0, point.1 - prior.1);
                        let dot = displacement.0 * allowed_dir.0 + displacement.1 * allowed_dir.1;
                        let expected_sign = if zone.zone_type == ZoneType::EntryOnly { 1.0 } else { -1.0 };
                        if dot * expected_sign < 0.0 {
                            violations.push(SpatialViolation {
                                track_id: track.track_id,
                                zone_id: zone.id.clone(),
                                kind: ViolationKind::WrongDirection,
                                timestamp,
                                severity_weight: zone.severity_weight,
                            });
                        }
                    }
                }
            }

            let entry = self.history.entry(track.track_id).or_default();
            entry.inside = current_zones.iter().map(|z| z.0.clone()).collect();
            entry.last_point = Some(track.bbox.bottom_center());
            containment.insert(track.track_id, current_zones);
        }

        for (zone_id, count) in &new_occupancy {
            if let Some(zone) = zones.get(zone_id) {
                if let Some(max) = zone.max_occupancy {
                    if *count > max {
                        violations.push(SpatialViolation {
                            track_id: TrackId(0),
                            zone_id: zone.id.clone(),
                            kind: ViolationKind::CrowdLimitExceeded,
                            timestamp,
                            severity_weight: zone.severity_weight,
                        });
                    }
                }
            }
        }

        self.occupancy = new_occupancy;
        (containment, violations)
    }

    pub fn occupancy(&self, zone_id: &str) -> u32 {
        self.occupancy.get(zone_id).copied().unwrap_or(0)
    }

    pub fn cleanup(&mut self, live_tracks: &std::collections::HashSet<TrackId>) {
        self.history.retain(|id, _| live_tracks.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_inside_square() {
        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon((5.0, 5.0), &square));
        assert!(!point_in_polygon((15.0, 5.0), &square));
    }

    #[test]
    fn point_on_edge_is_inside() {
        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon((0.0, 5.0), &square));
    }

    #[test]
    fn restricted_entry_rising_edge_only() {
        let mut engine = SpatialEngine::new();
        let mut zones = HashMap::new();
        zones.insert(
            "r".to_string(),
            Zone {
                id: "r".into(),
                name: "Restricted".to_string(),
                polygon: vec![(500.0, 500.0), (700.0, 500.0), (700.0, 700.0), (500.0, 700.0)],
                zone_type: ZoneType::Restricted,
                allowed_window: None,
                max_occupancy: None,
                allowed_classes: None,
                denied_classes: None,
                severity_weight: 2.0,
                use_center: false,
                alert_on_entry: true,
                allowed_direction: None,
            },
        );
        let now = Local::now();
        let outside = TrackInput { track_id: TrackId(1), bbox: BBox { x1: 100.0, y1: 100.0, x2: 200.0, y2: 200.0 }, class: "person" };
        let (_, v1) = engine.step(&[outside], &zones, now);
        assert!(v1.is_empty());

        let inside = TrackInput { track_id: TrackId(1), bbox: BBox { x1: 600.0, y1: 600.0, x2: 700.0, y2: 700.0 }, class: "person" };
        let (_, v2) = engine.step(&[inside], &zones, now);
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].kind, ViolationKind::RestrictedEntry);

        let (_, v3) = engine.step(&[inside], &zones, now);
        assert!(v3.is_empty());
    }
}
