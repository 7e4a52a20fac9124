//! Rule document envelope and the multi-kind container.
//!
//! Every rule file shares the header `apiVersion` / `kind` / `metadata`.
//! Loading is two-pass: read the [`RuleEnvelope`] to learn the kind, then
//! deserialize the full document into the matching [`RuleDocument`] variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aggregation_config::AggregationConfigRule;
use crate::clustering_config::ClusteringConfigRule;
use crate::forecast_config::ForecastConfigRule;
use crate::scoring_config::ScoringConfigRule;
use crate::sector_config::SectorConfigRule;

// ── Rule kind enum ──────────────────────────────────────────────────

/// Supported rule kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    ScoringConfig,
    AggregationConfig,
    ForecastConfig,
    ClusteringConfig,
    SectorConfig,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::ScoringConfig => write!(f, "ScoringConfig"),
            RuleKind::AggregationConfig => write!(f, "AggregationConfig"),
            RuleKind::ForecastConfig => write!(f, "ForecastConfig"),
            RuleKind::ClusteringConfig => write!(f, "ClusteringConfig"),
            RuleKind::SectorConfig => write!(f, "SectorConfig"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ScoringConfig" => Ok(RuleKind::ScoringConfig),
            "AggregationConfig" => Ok(RuleKind::AggregationConfig),
            "ForecastConfig" => Ok(RuleKind::ForecastConfig),
            "ClusteringConfig" => Ok(RuleKind::ClusteringConfig),
            "SectorConfig" => Ok(RuleKind::SectorConfig),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}

// ── Shared metadata ─────────────────────────────────────────────────

/// Metadata shared by every rule kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

// ── Rule envelope (first-pass) ──────────────────────────────────────

/// Lightweight first-pass deserializer that reads only the header fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl RuleEnvelope {
    /// Parse the `kind` field into a typed [`RuleKind`].
    pub fn rule_kind(&self) -> std::result::Result<RuleKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<RuleDocument, String> {
        let kind = self.rule_kind()?;
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        let doc = match kind {
            RuleKind::ScoringConfig => RuleDocument::ScoringConfig(parse(&yaml)?),
            RuleKind::AggregationConfig => RuleDocument::AggregationConfig(parse(&yaml)?),
            RuleKind::ForecastConfig => RuleDocument::ForecastConfig(parse(&yaml)?),
            RuleKind::ClusteringConfig => RuleDocument::ClusteringConfig(parse(&yaml)?),
            RuleKind::SectorConfig => RuleDocument::SectorConfig(parse(&yaml)?),
        };
        Ok(doc)
    }
}

fn parse<T: serde::de::DeserializeOwned>(yaml: &str) -> std::result::Result<T, String> {
    serde_yaml::from_str(yaml).map_err(|e| e.to_string())
}

// ── Rule document (multi-kind container) ────────────────────────────

/// A fully deserialized rule of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Category severities, confidence amplifier, risk bands.
    ScoringConfig(ScoringConfigRule),
    /// Lookback window, velocity baseline, recency weighting.
    AggregationConfig(AggregationConfigRule),
    /// Acceleration threshold, horizon, resampling bucket.
    ForecastConfig(ForecastConfigRule),
    /// Topic clustering bounds and labelling.
    ClusteringConfig(ClusteringConfigRule),
    /// Sector keywords and upcoming-event phrases.
    SectorConfig(SectorConfigRule),
}

impl RuleDocument {
    /// Get the rule's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::ScoringConfig(rule) => &rule.metadata,
            RuleDocument::AggregationConfig(rule) => &rule.metadata,
            RuleDocument::ForecastConfig(rule) => &rule.metadata,
            RuleDocument::ClusteringConfig(rule) => &rule.metadata,
            RuleDocument::SectorConfig(rule) => &rule.metadata,
        }
    }

    /// Get the rule kind.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::ScoringConfig(_) => RuleKind::ScoringConfig,
            RuleDocument::AggregationConfig(_) => RuleKind::AggregationConfig,
            RuleDocument::ForecastConfig(_) => RuleKind::ForecastConfig,
            RuleDocument::ClusteringConfig(_) => RuleKind::ClusteringConfig,
            RuleDocument::SectorConfig(_) => RuleKind::SectorConfig,
        }
    }

    pub fn as_scoring_config(&self) -> Option<&ScoringConfigRule> {
        match self {
            RuleDocument::ScoringConfig(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_aggregation_config(&self) -> Option<&AggregationConfigRule> {
        match self {
            RuleDocument::AggregationConfig(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_forecast_config(&self) -> Option<&ForecastConfigRule> {
        match self {
            RuleDocument::ForecastConfig(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_clustering_config(&self) -> Option<&ClusteringConfigRule> {
        match self {
            RuleDocument::ClusteringConfig(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_sector_config(&self) -> Option<&SectorConfigRule> {
        match self {
            RuleDocument::SectorConfig(rule) => Some(rule),
            _ => None,
        }
    }

    /// Serialize this document to YAML, delegating to the inner type.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            RuleDocument::ScoringConfig(r) => serde_yaml::to_string(r),
            RuleDocument::AggregationConfig(r) => serde_yaml::to_string(r),
            RuleDocument::ForecastConfig(r) => serde_yaml::to_string(r),
            RuleDocument::ClusteringConfig(r) => serde_yaml::to_string(r),
            RuleDocument::SectorConfig(r) => serde_yaml::to_string(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_kind_round_trips_through_display() {
        for kind in [
            RuleKind::ScoringConfig,
            RuleKind::AggregationConfig,
            RuleKind::ForecastConfig,
            RuleKind::ClusteringConfig,
            RuleKind::SectorConfig,
        ] {
            assert_eq!(kind.to_string().parse::<RuleKind>().unwrap(), kind);
        }
        assert!("AnomalyRule".parse::<RuleKind>().is_err());
    }

    #[test]
    fn envelope_dispatches_to_forecast_config() {
        let yaml = r#"
apiVersion: v1
kind: ForecastConfig
metadata:
  id: forecast-test
  name: Forecast Test
spec:
  accel_threshold: 1.5
  horizon: 6
"#;
        let envelope: RuleEnvelope = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(envelope.rule_kind().unwrap(), RuleKind::ForecastConfig);
        let doc = envelope.parse_full().unwrap();
        assert_eq!(doc.kind(), RuleKind::ForecastConfig);
        assert_eq!(doc.metadata().id, "forecast-test");
        assert!(doc.metadata().enabled);
        let spec = &doc.as_forecast_config().unwrap().spec;
        assert_eq!(spec.horizon, 6);
        assert_eq!(spec.bucket_minutes, 60);
    }

    #[test]
    fn envelope_rejects_unknown_kind() {
        let yaml = r#"
apiVersion: v1
kind: Mystery
metadata:
  id: x
  name: X
spec: {}
"#;
        let envelope: RuleEnvelope = serde_yaml::from_str(yaml).unwrap();
        assert!(envelope.parse_full().unwrap_err().contains("unknown rule kind"));
    }
}
