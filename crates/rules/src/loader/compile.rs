//! Compilation of loaded documents into the bundle the analytics consume.

use std::path::Path;

use tracing::{debug, info};

use crate::aggregation_config::CompiledAggregationConfig;
use crate::clustering_config::CompiledClusteringConfig;
use crate::forecast_config::CompiledForecastConfig;
use crate::schema::{RuleDocument, RuleKind};
use crate::scoring_config::CompiledScoringConfig;
use crate::sector_config::SectorRules;

use super::core::RuleLoader;
use super::error::{LoadResult, Result, RuleError};

/// Every parameter the analytics need, passed explicitly into each call.
///
/// Kinds without an enabled document fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsRules {
    pub scoring: CompiledScoringConfig,
    pub aggregation: CompiledAggregationConfig,
    pub forecast: CompiledForecastConfig,
    pub clustering: CompiledClusteringConfig,
    pub sectors: SectorRules,
}

impl AnalyticsRules {
    /// Load every rule file under `dir` and compile the result.
    pub fn load(dir: &Path) -> Result<(Self, Vec<LoadResult>)> {
        let mut loader = RuleLoader::new(dir.to_path_buf());
        let results = loader.load_all()?;
        let rules = loader.compile()?;
        Ok((rules, results))
    }

    pub(crate) fn from_loader(loader: &RuleLoader) -> Result<Self> {
        let mut rules = AnalyticsRules::default();

        if let Some(doc) = single_enabled(loader, RuleKind::ScoringConfig)? {
            if let Some(rule) = doc.as_scoring_config() {
                rules.scoring = rule.compile()?;
            }
        }
        if let Some(doc) = single_enabled(loader, RuleKind::AggregationConfig)? {
            if let Some(rule) = doc.as_aggregation_config() {
                rules.aggregation = rule.compile()?;
            }
        }
        if let Some(doc) = single_enabled(loader, RuleKind::ForecastConfig)? {
            if let Some(rule) = doc.as_forecast_config() {
                rules.forecast = rule.compile()?;
            }
        }
        if let Some(doc) = single_enabled(loader, RuleKind::ClusteringConfig)? {
            if let Some(rule) = doc.as_clustering_config() {
                rules.clustering = rule.compile()?;
            }
        }
        if let Some(doc) = single_enabled(loader, RuleKind::SectorConfig)? {
            if let Some(rule) = doc.as_sector_config() {
                rules.sectors = rule.compile()?;
            }
        }

        for (higher, lower) in rules.scoring.dominance_gaps() {
            info!(
                %higher,
                %lower,
                amplifier = rules.scoring.amplifier,
                "confidence can reorder these categories"
            );
        }

        Ok(rules)
    }
}

/// The one enabled document of `kind`, if any. Two or more is a conflict.
fn single_enabled(loader: &RuleLoader, kind: RuleKind) -> Result<Option<&RuleDocument>> {
    let docs = loader.enabled_of_kind(kind);
    match docs.as_slice() {
        [] => {
            debug!(%kind, "no enabled document, using defaults");
            Ok(None)
        }
        [doc] => Ok(Some(*doc)),
        many => {
            let ids: Vec<&str> = many.iter().map(|d| d.metadata().id.as_str()).collect();
            Err(RuleError::Validation(format!(
                "multiple enabled {} documents: {}",
                kind,
                ids.join(", ")
            )))
        }
    }
}
