//! YAML rule documents that parameterise the risk analytics.
//!
//! This crate provides:
//! - Typed rule kinds (scoring, aggregation, forecast, clustering, sector)
//! - Two-pass deserialization via a lightweight envelope
//! - A filesystem loader that compiles the active documents into [`AnalyticsRules`]

pub mod aggregation_config;
pub mod clustering_config;
pub mod forecast_config;
pub mod loader;
pub mod schema;
pub mod scoring_config;
pub mod sector_config;

pub use aggregation_config::CompiledAggregationConfig;
pub use clustering_config::CompiledClusteringConfig;
pub use forecast_config::CompiledForecastConfig;
pub use loader::{AnalyticsRules, LoadResult, LoadStatus, Result, RuleError, RuleLoader};
pub use scoring_config::CompiledScoringConfig;
pub use sector_config::SectorRules;
