//! Risk analytics pipeline.
//!
//! One tick runs the stages in order:
//!
//! - **Scoring**: classified events become risk scores; invalid events are rejected.
//! - **Aggregation**: the rolling window collapses into a stability snapshot.
//! - **Forecast**: the stability history plus the new snapshot is trended and projected.
//!
//! Theme detection and dashboard indicators run on demand over scored events.

pub mod forecast;
pub mod indicators;
pub mod metrics;
pub mod scoring;
pub mod stability;
pub mod themes;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use riskpulse_core::{ForecastResult, RawClassifiedEvent, Result, ScoredEvent, StabilitySnapshot};
use riskpulse_rules::AnalyticsRules;

use self::indicators::{Insights, NationalIndicators, SectorStatus};
use self::metrics::PipelineMetrics;
use self::scoring::{BandCounts, RejectedEvent};
use self::themes::TrendCluster;

/// Everything one tick produced.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub as_of: DateTime<Utc>,
    pub scored: Vec<ScoredEvent>,
    pub rejected: Vec<RejectedEvent>,
    pub snapshot: StabilitySnapshot,
    /// Trend of the stability series; `None` until there are two points.
    pub forecast: Option<ForecastResult>,
    /// Trend of bucketed mean risk across the scored batch.
    pub risk_forecast: Option<ForecastResult>,
}

/// Dashboard view of a set of scored events.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub sector: String,
    pub indicators: NationalIndicators,
    pub bands: BandCounts,
    pub sector_status: Vec<SectorStatus>,
    pub insights: Insights,
    pub upcoming: Vec<ScoredEvent>,
    pub mappable: Vec<ScoredEvent>,
}

/// Stateless analytics over caller-supplied events, plus run metrics.
pub struct Pipeline {
    rules: AnalyticsRules,
    pub metrics: PipelineMetrics,
}

impl Pipeline {
    pub fn new(rules: AnalyticsRules) -> Self {
        Self {
            rules,
            metrics: PipelineMetrics::default(),
        }
    }

    pub fn rules(&self) -> &AnalyticsRules {
        &self.rules
    }

    /// Score `events`, aggregate the window ending at `as_of`, and forecast
    /// `history` (ascending) extended by the new snapshot.
    pub fn tick(
        &mut self,
        events: &[RawClassifiedEvent],
        history: &[StabilitySnapshot],
        as_of: DateTime<Utc>,
    ) -> TickReport {
        let timer = self.metrics.tick_timer();

        let batch = scoring::score_batch(events, &self.rules.scoring);
        let in_window = stability::window(&batch.scored, as_of, self.rules.aggregation.window_minutes);
        let snapshot = stability::aggregate(&in_window, as_of, &self.rules.aggregation);

        let mut series = history.to_vec();
        series.push(snapshot.clone());
        let forecast = forecast::forecast_stability(&series, &self.rules.forecast)
            .map_err(|e| debug!(error = %e, "stability forecast skipped"))
            .ok();

        let buckets = forecast::bucket_risk(
            &batch.scored,
            self.rules.forecast.bucket_minutes,
            self.rules.forecast.max_buckets,
        );
        let risk_forecast = forecast::forecast(&buckets, &self.rules.forecast)
            .map_err(|e| debug!(error = %e, "risk forecast skipped"))
            .ok();

        let scored = batch.scored.len() as u64;
        let rejected = batch.rejected.len() as u64;
        timer.finish(&mut self.metrics, as_of, scored, rejected);

        info!(
            %as_of,
            scored,
            rejected,
            in_window = in_window.len(),
            stability = snapshot.stability_score,
            trend = ?forecast.as_ref().map(|f| f.trend_label),
            "tick complete"
        );

        TickReport {
            as_of,
            scored: batch.scored,
            rejected: batch.rejected,
            snapshot,
            forecast,
            risk_forecast,
        }
    }

    /// Emerging topics among `events`.
    pub fn themes(&mut self, events: &[ScoredEvent]) -> Result<Vec<TrendCluster>> {
        let clusters = themes::emerging_themes(events, &self.rules.clustering)?;
        self.metrics.record_theme_run(clusters.len());
        debug!(events = events.len(), themes = clusters.len(), "themes detected");
        Ok(clusters)
    }

    /// Indicators for the events of one sector (`All` for every sector).
    pub fn dashboard(&self, events: &[ScoredEvent], as_of: DateTime<Utc>, sector: &str) -> Dashboard {
        let rules = &self.rules;
        let selected = indicators::filter_sector(events, &rules.sectors, sector);
        Dashboard {
            sector: sector.to_string(),
            indicators: indicators::national_indicators(&selected, as_of, rules),
            bands: scoring::band_counts(&selected, &rules.scoring),
            sector_status: indicators::sector_status(events, &rules.sectors),
            insights: indicators::top_insights(&selected, &rules.scoring),
            upcoming: indicators::upcoming_events(&selected, &rules.sectors, rules.scoring.insights.limit),
            mappable: indicators::mappable_events(&selected),
        }
    }
}
