//! ScoringConfig rule kind: per-category base severity, the confidence
//! amplifier, and the thresholds that band scores for dashboards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riskpulse_core::RiskCategory;

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

/// Upper bound of every risk score.
pub const MAX_RISK: f64 = 100.0;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ScoringConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ScoringConfigSpec,
}

/// Specification section of a ScoringConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfigSpec {
    /// Base severity per category, each in [0, 100].
    pub base_severity: BTreeMap<RiskCategory, f64>,
    /// Maximum contribution of classifier confidence.
    #[serde(default = "default_amplifier")]
    pub amplifier: f64,
    #[serde(default)]
    pub bands: RiskBands,
    #[serde(default)]
    pub insights: InsightThresholds,
}

fn default_amplifier() -> f64 {
    20.0
}

/// Score boundaries for Critical / Warning / Info banding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RiskBands {
    /// Scores at or above this are Critical.
    pub critical: f64,
    /// Scores at or above this (and below critical) are Warning.
    pub warning: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            critical: 80.0,
            warning: 50.0,
        }
    }
}

/// Thresholds for the dashboard insight lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InsightThresholds {
    /// Events strictly above this are listed as top risks.
    pub high_risk: f64,
    /// Events strictly below this are listed as opportunities.
    pub opportunity: f64,
    /// Maximum entries per list.
    pub limit: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            high_risk: 70.0,
            opportunity: 20.0,
            limit: 5,
        }
    }
}

impl Default for ScoringConfigSpec {
    fn default() -> Self {
        let base_severity = BTreeMap::from([
            (RiskCategory::CivilUnrest, 80.0),
            (RiskCategory::EconomicCrisis, 50.0),
            (RiskCategory::NaturalDisaster, 70.0),
            (RiskCategory::Other, 10.0),
        ]);
        Self {
            base_severity,
            amplifier: default_amplifier(),
            bands: RiskBands::default(),
            insights: InsightThresholds::default(),
        }
    }
}

impl ScoringConfigSpec {
    /// Base severity for a category, if configured.
    pub fn base_severity(&self, category: RiskCategory) -> Option<f64> {
        self.base_severity.get(&category).copied()
    }

    /// True when a zero-confidence `higher` event always outscores a
    /// full-confidence `lower` event.
    pub fn dominates(&self, higher: RiskCategory, lower: RiskCategory) -> bool {
        match (self.base_severity(higher), self.base_severity(lower)) {
            (Some(h), Some(l)) => h > (l + self.amplifier).min(MAX_RISK),
            _ => false,
        }
    }

    /// Category pairs ordered by base severity where confidence can still
    /// flip the ranking.
    pub fn dominance_gaps(&self) -> Vec<(RiskCategory, RiskCategory)> {
        let mut gaps = Vec::new();
        for (&higher, &h) in &self.base_severity {
            for (&lower, &l) in &self.base_severity {
                if h > l && !self.dominates(higher, lower) {
                    gaps.push((higher, lower));
                }
            }
        }
        gaps
    }

    pub fn validate(&self) -> Result<()> {
        for (category, &severity) in &self.base_severity {
            if !(0.0..=MAX_RISK).contains(&severity) {
                return Err(RuleError::Validation(format!(
                    "base_severity for {} must be in [0, 100], got {}",
                    category, severity
                )));
            }
        }
        if !self.amplifier.is_finite() || self.amplifier < 0.0 {
            return Err(RuleError::Validation(format!(
                "amplifier must be a non-negative number, got {}",
                self.amplifier
            )));
        }
        if self.bands.warning > self.bands.critical {
            return Err(RuleError::Validation(
                "bands.warning must not exceed bands.critical".to_string(),
            ));
        }
        if self.insights.opportunity > self.insights.high_risk {
            return Err(RuleError::Validation(
                "insights.opportunity must not exceed insights.high_risk".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Pre-compiled scoring config (spec is already typed).
pub type CompiledScoringConfig = ScoringConfigSpec;

impl ScoringConfigRule {
    /// Validate and compile the YAML config.
    pub fn compile(&self) -> Result<CompiledScoringConfig> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}
