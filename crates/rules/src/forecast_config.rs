//! ForecastConfig rule kind: acceleration threshold, projection horizon
//! and the resampling bucket used to build a score series.

use serde::{Deserialize, Serialize};

use crate::aggregation_config::MAX_WINDOW_MINUTES;
use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

/// Top-level ForecastConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ForecastConfigSpec,
}

/// Specification section of a ForecastConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfigSpec {
    /// |slope| above this is Accelerating (positive) or Improving (negative).
    #[serde(default = "default_accel_threshold")]
    pub accel_threshold: f64,
    /// Number of projected future steps.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Width of one resampling bucket, in minutes.
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u64,
    /// Most recent buckets kept when resampling a long event span.
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
}

fn default_accel_threshold() -> f64 {
    0.5
}
fn default_horizon() -> usize {
    4
}
fn default_bucket_minutes() -> u64 {
    60
}
fn default_max_buckets() -> usize {
    168
}

impl Default for ForecastConfigSpec {
    fn default() -> Self {
        Self {
            accel_threshold: default_accel_threshold(),
            horizon: default_horizon(),
            bucket_minutes: default_bucket_minutes(),
            max_buckets: default_max_buckets(),
        }
    }
}

impl ForecastConfigSpec {
    pub fn validate(&self) -> Result<()> {
        if !(self.accel_threshold >= 0.0) {
            return Err(RuleError::Validation(format!(
                "accel_threshold must be >= 0, got {}",
                self.accel_threshold
            )));
        }
        if self.horizon == 0 {
            return Err(RuleError::Validation("horizon must be at least 1".to_string()));
        }
        if self.bucket_minutes == 0 || self.bucket_minutes > MAX_WINDOW_MINUTES {
            return Err(RuleError::Validation(format!(
                "bucket_minutes must be in 1..={MAX_WINDOW_MINUTES}, got {}",
                self.bucket_minutes
            )));
        }
        if self.max_buckets < 2 {
            return Err(RuleError::Validation("max_buckets must be at least 2".to_string()));
        }
        Ok(())
    }
}

pub type CompiledForecastConfig = ForecastConfigSpec;

impl ForecastConfigRule {
    pub fn compile(&self) -> Result<CompiledForecastConfig> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forecast_config_yaml() {
        let yaml = include_str!("../../../data/rules/forecast-config.yml");
        let rule: ForecastConfigRule = serde_yaml::from_str(yaml).unwrap();
        let cfg = rule.compile().unwrap();
        assert_eq!(cfg.horizon, 4);
        assert!((cfg.accel_threshold - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let cfg = ForecastConfigSpec {
            horizon: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(RuleError::Validation(_))));
    }

    #[test]
    fn bucket_bounds_are_enforced() {
        let huge = ForecastConfigSpec {
            bucket_minutes: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(RuleError::Validation(msg)) if msg.contains("bucket_minutes")));

        let single = ForecastConfigSpec {
            max_buckets: 1,
            ..Default::default()
        };
        assert!(single.validate().is_err());
    }
}
