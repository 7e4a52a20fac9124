//! SectorConfig rule kind: keyword rules that tag event text with a
//! sector, and phrases marking scheduled/upcoming events.

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level SectorConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SectorConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: SectorConfigSpec,
}

/// Specification section of a SectorConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SectorConfigSpec {
    /// Sector assigned when no keyword matches.
    #[serde(default = "default_sector")]
    pub default_sector: String,
    /// Sectors in match priority order.
    #[serde(default)]
    pub sectors: Vec<SectorKeywords>,
    /// Phrases that mark an event as upcoming.
    #[serde(default)]
    pub upcoming_keywords: Vec<String>,
    /// Newest events per sector averaged for the sector status.
    #[serde(default = "default_status_sample")]
    pub status_sample: usize,
}

/// One sector and the keywords that select it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SectorKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

fn default_sector() -> String {
    "GENERAL".to_string()
}
fn default_status_sample() -> usize {
    10
}

// ── Compiled (hot-path) type ────────────────────────────────────────

/// Sector rules with lower-cased keywords, ready for substring matching.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRules {
    pub default_sector: String,
    sectors: Vec<(String, Vec<String>)>,
    upcoming_keywords: Vec<String>,
    pub status_sample: usize,
}

impl Default for SectorRules {
    fn default() -> Self {
        Self {
            default_sector: default_sector(),
            sectors: Vec::new(),
            upcoming_keywords: Vec::new(),
            status_sample: default_status_sample(),
        }
    }
}

impl SectorRules {
    /// First sector with a keyword contained in `text`, else the default sector.
    pub fn detect(&self, text: &str) -> &str {
        let lower = text.to_lowercase();
        self.sectors
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|(name, _)| name.as_str())
            .unwrap_or(&self.default_sector)
    }

    /// Whether `text` refers to a scheduled or future event.
    pub fn is_upcoming(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.upcoming_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()))
    }

    /// Configured sector names in priority order.
    pub fn sector_names(&self) -> impl Iterator<Item = &str> {
        self.sectors.iter().map(|(name, _)| name.as_str())
    }
}

impl SectorConfigRule {
    pub fn compile(&self) -> Result<SectorRules> {
        let spec = &self.spec;
        if spec.status_sample == 0 {
            return Err(RuleError::Validation("status_sample must be positive".to_string()));
        }
        let mut sectors = Vec::with_capacity(spec.sectors.len());
        for sector in &spec.sectors {
            if sectors.iter().any(|(name, _)| name == &sector.name) {
                return Err(RuleError::Validation(format!(
                    "duplicate sector '{}'",
                    sector.name
                )));
            }
            let keywords = sector
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            sectors.push((sector.name.clone(), keywords));
        }
        Ok(SectorRules {
            default_sector: spec.default_sector.clone(),
            sectors,
            upcoming_keywords: spec
                .upcoming_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            status_sample: spec.status_sample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SectorRules {
        let yaml = include_str!("../../../data/rules/sector-config.yml");
        let rule: SectorConfigRule = serde_yaml::from_str(yaml).unwrap();
        rule.compile().unwrap()
    }

    #[test]
    fn detects_sector_by_keyword() {
        let rules = rules();
        assert_eq!(rules.detect("Island-wide power outage reported"), "INFRASTRUCTURE");
        assert_eq!(rules.detect("Dock workers begin STRIKE"), "LABOR");
    }

    #[test]
    fn unmatched_text_gets_default_sector() {
        assert_eq!(rules().detect("Cricket team wins series"), "GENERAL");
    }

    #[test]
    fn upcoming_keywords_match_case_insensitively() {
        let rules = rules();
        assert!(rules.is_upcoming("Talks SCHEDULED for Monday"));
        assert!(rules.is_upcoming("Budget will be presented next week"));
        assert!(!rules.is_upcoming("Flood waters recede"));
    }

    #[test]
    fn duplicate_sector_is_rejected() {
        let yaml = r#"
apiVersion: v1
kind: SectorConfig
metadata:
  id: dup
  name: Dup
spec:
  sectors:
    - name: FINANCE
      keywords: [bank]
    - name: FINANCE
      keywords: [tax]
"#;
        let rule: SectorConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(rule.compile(), Err(RuleError::Validation(_))));
    }

    #[test]
    fn default_rules_have_no_sectors() {
        let rules = SectorRules::default();
        assert_eq!(rules.sector_names().count(), 0);
        assert_eq!(rules.detect("anything"), "GENERAL");
        assert!(!rules.is_upcoming("scheduled"));
    }
}
