use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest and highest stability score.
pub const STABILITY_MIN: f64 = 0.0;
pub const STABILITY_MAX: f64 = 100.0;

/// One aggregation tick of the stability metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilitySnapshot {
    pub timestamp: DateTime<Utc>,
    /// Always within `[0, 100]`.
    pub stability_score: f64,
    pub contributing_event_count: usize,
    pub weighted_avg_risk: f64,
    pub velocity_factor: f64,
}

impl StabilitySnapshot {
    /// Baseline snapshot for a window with no observed risk.
    pub fn baseline(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            stability_score: STABILITY_MAX,
            contributing_event_count: 0,
            weighted_avg_risk: 0.0,
            velocity_factor: 1.0,
        }
    }
}

/// Direction classification of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    Accelerating,
    Stable,
    Improving,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::Accelerating => write!(f, "Accelerating"),
            TrendLabel::Stable => write!(f, "Stable"),
            TrendLabel::Improving => write!(f, "Improving"),
        }
    }
}

/// Linear trend fitted over a score history plus its projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub slope: f64,
    pub intercept: f64,
    pub trend_label: TrendLabel,
    /// One value per future step, nearest first.
    pub projected_scores: Vec<f64>,
    pub alert_triggered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_snapshot_is_fully_stable() {
        let snap = StabilitySnapshot::baseline(Utc::now());
        assert_eq!(snap.stability_score, 100.0);
        assert_eq!(snap.contributing_event_count, 0);
        assert_eq!(snap.velocity_factor, 1.0);
    }

    #[test]
    fn forecast_result_serializes_label_as_string() {
        let result = ForecastResult {
            slope: 1.0,
            intercept: 0.0,
            trend_label: TrendLabel::Accelerating,
            projected_scores: vec![1.0],
            alert_triggered: true,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["trend_label"], "Accelerating");
    }
}
