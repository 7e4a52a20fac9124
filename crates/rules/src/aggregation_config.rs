//! AggregationConfig rule kind: lookback window, velocity baseline and
//! optional recency weighting for the stability aggregate.

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

/// Longest lookback any time window may span: ten years, in minutes.
pub const MAX_WINDOW_MINUTES: u64 = 10 * 365 * 24 * 60;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level AggregationConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: AggregationConfigSpec,
}

/// Specification section of an AggregationConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfigSpec {
    /// Trailing window length in minutes.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
    /// Event rate (per hour) considered normal; denser windows amplify risk.
    #[serde(default = "default_baseline_rate")]
    pub baseline_events_per_hour: f64,
    /// Upper bound on the velocity factor.
    #[serde(default = "default_max_velocity")]
    pub max_velocity_factor: f64,
    /// Half-life for recency weighting. Absent = equal weights.
    #[serde(default)]
    pub recency_half_life_minutes: Option<f64>,
    /// Number of newest events averaged for the headline indicator.
    #[serde(default = "default_indicator_sample")]
    pub indicator_sample: usize,
    /// Trailing window for the volume indicator, in hours.
    #[serde(default = "default_volume_window")]
    pub volume_window_hours: u64,
}

fn default_window_minutes() -> u64 {
    60
}
fn default_baseline_rate() -> f64 {
    10.0
}
fn default_max_velocity() -> f64 {
    2.0
}
fn default_indicator_sample() -> usize {
    50
}
fn default_volume_window() -> u64 {
    24
}

impl Default for AggregationConfigSpec {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            baseline_events_per_hour: default_baseline_rate(),
            max_velocity_factor: default_max_velocity(),
            recency_half_life_minutes: None,
            indicator_sample: default_indicator_sample(),
            volume_window_hours: default_volume_window(),
        }
    }
}

impl AggregationConfigSpec {
    /// Window length in hours.
    pub fn window_hours(&self) -> f64 {
        self.window_minutes as f64 / 60.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_minutes == 0 || self.window_minutes > MAX_WINDOW_MINUTES {
            return Err(RuleError::Validation(format!(
                "window_minutes must be in 1..={MAX_WINDOW_MINUTES}, got {}",
                self.window_minutes
            )));
        }
        if self.volume_window_hours == 0 || self.volume_window_hours > MAX_WINDOW_MINUTES / 60 {
            return Err(RuleError::Validation(format!(
                "volume_window_hours must be in 1..={}, got {}",
                MAX_WINDOW_MINUTES / 60,
                self.volume_window_hours
            )));
        }
        if !(self.baseline_events_per_hour > 0.0) {
            return Err(RuleError::Validation(
                "baseline_events_per_hour must be positive".to_string(),
            ));
        }
        if !(self.max_velocity_factor >= 1.0) {
            return Err(RuleError::Validation(format!(
                "max_velocity_factor must be >= 1.0, got {}",
                self.max_velocity_factor
            )));
        }
        if let Some(half_life) = self.recency_half_life_minutes {
            if !(half_life > 0.0) {
                return Err(RuleError::Validation(
                    "recency_half_life_minutes must be positive when set".to_string(),
                ));
            }
        }
        if self.indicator_sample == 0 {
            return Err(RuleError::Validation("indicator_sample must be positive".to_string()));
        }
        Ok(())
    }
}

// ── Compiled type ───────────────────────────────────────────────────

pub type CompiledAggregationConfig = AggregationConfigSpec;

impl AggregationConfigRule {
    pub fn compile(&self) -> Result<CompiledAggregationConfig> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aggregation_config_yaml() {
        let yaml = include_str!("../../../data/rules/aggregation-config.yml");
        let rule: AggregationConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.kind, "AggregationConfig");
        let cfg = rule.compile().unwrap();
        assert_eq!(cfg.window_minutes, 60);
        assert_eq!(cfg.max_velocity_factor, 2.0);
    }

    #[test]
    fn velocity_cap_below_one_is_rejected() {
        let cfg = AggregationConfigSpec {
            max_velocity_factor: 0.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_half_life_is_rejected() {
        let cfg = AggregationConfigSpec {
            recency_half_life_minutes: Some(0.0),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let cfg = AggregationConfigSpec {
            window_minutes: 1_099_511_627_776,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(RuleError::Validation(msg)) if msg.contains("window_minutes")));

        let cfg = AggregationConfigSpec {
            volume_window_hours: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(RuleError::Validation(msg)) if msg.contains("volume_window_hours")));

        let cfg = AggregationConfigSpec {
            window_minutes: MAX_WINDOW_MINUTES,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn window_hours_converts_minutes() {
        let cfg = AggregationConfigSpec {
            window_minutes: 90,
            ..Default::default()
        };
        assert!((cfg.window_hours() - 1.5).abs() < 1e-12);
    }
}
