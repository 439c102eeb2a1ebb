//! Severity scoring (§4.5): a weighted sum of seven normalized factors.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Timelike};

use crate::config::SeverityWeights;
use crate::model::{SeverityLevel, SeverityScore};

/// Raw, unnormalized inputs to the severity model.
pub struct SeverityInputs {
    pub dwell_time_s: f32,
    pub zone_weight: f32,
    pub class_name: String,
    pub speed_px_s: f32,
    pub baseline_speed_px_s: f32,
    pub timestamp: DateTime<Local>,
    pub occupancy: u32,
    pub capacity: u32,
    pub prior_violation_count: u32,
}

fn class_factor(class_name: &str) -> f32 {
    match class_name {
        "person" => 1.0,
        "bicycle" | "car" | "motorcycle" | "bus" | "truck" => 0.7,
        "backpack" | "handbag" | "suitcase" | "bottle" | "laptop" | "cell phone" | "book" => 0.4,
        _ => 0.2,
    }
}

fn speed_factor(speed: f32, baseline: f32) -> f32 {
    if baseline <= 0.0 {
        return 0.0;
    }
    ((speed - baseline).abs() / baseline).clamp(0.0, 1.0)
}

/// Night hours are more suspicious than day hours; a simple triangular curve
/// peaking at local midnight.
fn time_of_day_factor(timestamp: DateTime<Local>) -> f32 {
    let hour = timestamp.hour() as f32 + timestamp.minute() as f32 / 60.0;
    let distance_from_midnight = (hour - 0.0).min((24.0 - hour).abs()).min((hour - 24.0).abs());
    (1.0 - distance_from_midnight / 12.0).clamp(0.0, 1.0)
}

fn crowd_factor(occupancy: u32, capacity: u32) -> f32 {
    if capacity == 0 {
        return 0.0;
    }
    (occupancy as f32 / capacity as f32).clamp(0.0, 1.0)
}

fn history_factor(prior_violation_count: u32) -> f32 {
    (prior_violation_count as f32 / 5.0).clamp(0.0, 1.0)
}

/// Compute a weighted severity score from raw inputs (§4.5).
pub fn score(inputs: &SeverityInputs, weights: &SeverityWeights) -> SeverityScore {
    let duration = (inputs.dwell_time_s / 60.0).clamp(0.0, 1.0);
    let zone = (inputs.zone_weight / 3.0).clamp(0.0, 1.0);
    let class = class_factor(&inputs.class_name);
    let speed = speed_factor(inputs.speed_px_s, inputs.baseline_speed_px_s);
    let time = time_of_day_factor(inputs.timestamp);
    let crowd = crowd_factor(inputs.occupancy, inputs.capacity);
    let history = history_factor(inputs.prior_violation_count);

    let total = duration * weights.duration
        + zone * weights.zone
        + class * weights.class
        + speed * weights.speed
        + time * weights.time
        + crowd * weights.crowd
        + history * weights.history;
    let total = total.clamp(0.0, 1.0);

    let mut factors = BTreeMap::new();
    factors.insert("duration".to_string(), duration);
    factors.insert("zone".to_string(), zone);
    factors.insert("class".to_string(), class);
    factors.insert("speed".to_string(), speed);
    factors.insert("time".to_string(), time);
    factors.insert("crowd".to_string(), crowd);
    factors.insert("history".to_string(), history);

    SeverityScore {
        score: total,
        level: SeverityLevel::from_score(total),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn levels_match_buckets() {
        assert_eq!(SeverityLevel::from_score(0.1), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_score(0.3), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::from_score(0.5), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(0.9), SeverityLevel::Critical);
    }

    #[test]
    fn person_scores_higher_class_factor_than_object() {
        assert!(class_factor("person") > class_factor("bottle"));
    }

    #[test]
    fn weights_sum_respected() {
        let weights = SeverityWeights::default();
        let inputs = SeverityInputs {
            dwell_time_s: 60.0,
            zone_weight: 3.0,
            class_name: "person".to_string(),
            speed_px_s: 0.0,
            baseline_speed_px_s: 0.0,
            timestamp: Local.timestamp_opt(1_700_000_000, 0).unwrap(),
            occupancy: 0,
            capacity: 0,
            prior_violation_count: 0,
        };
        let result = score(&inputs, &weights);
        assert!(result.score <= 1.0 && result.score >= 0.0);
    }
}
