//! Dashboard indicators derived from scored events.
//!
//! Every function treats its input as an unordered batch and works on the
//! newest events first, so callers can pass events in any order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use riskpulse_core::{ScoredEvent, STABILITY_MAX, STABILITY_MIN};
use riskpulse_rules::{AnalyticsRules, CompiledScoringConfig, SectorRules};

use super::stability::lookback_start;

/// Sector value that disables filtering.
pub const ALL_SECTORS: &str = "All";

/// Headline numbers for the whole event feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalIndicators {
    /// `100 - mean risk` of the newest sample; 100 for no events.
    pub stability: f64,
    /// Events above the critical band threshold.
    pub critical_count: usize,
    /// Events in the trailing volume window ending at `as_of`.
    pub volume_24h: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorStatus {
    pub sector: String,
    /// Mean risk of the newest events in the sector, 0 when it has none.
    pub average_risk: f64,
    pub sample_size: usize,
}

/// Highest-risk events and low-risk opportunities, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub risks: Vec<ScoredEvent>,
    pub opportunities: Vec<ScoredEvent>,
}

fn newest_first(events: &[ScoredEvent]) -> Vec<&ScoredEvent> {
    let mut sorted: Vec<&ScoredEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    sorted
}

fn mean_risk<'a>(events: impl Iterator<Item = &'a ScoredEvent>) -> Option<(f64, usize)> {
    let (sum, count) = events.fold((0.0, 0usize), |(sum, count), e| (sum + e.risk_score(), count + 1));
    (count > 0).then(|| (sum / count as f64, count))
}

pub fn national_indicators(
    events: &[ScoredEvent],
    as_of: DateTime<Utc>,
    rules: &AnalyticsRules,
) -> NationalIndicators {
    let sample = rules.aggregation.indicator_sample;
    let stability = mean_risk(newest_first(events).into_iter().take(sample))
        .map(|(mean, _)| (STABILITY_MAX - mean).clamp(STABILITY_MIN, STABILITY_MAX))
        .unwrap_or(STABILITY_MAX);

    let critical = rules.scoring.bands.critical;
    let critical_count = events.iter().filter(|e| e.risk_score() > critical).count();

    let since = rules
        .aggregation
        .volume_window_hours
        .checked_mul(60)
        .and_then(|minutes| lookback_start(as_of, minutes));
    let volume_24h = events
        .iter()
        .filter(|e| since.map_or(true, |s| e.timestamp() > s) && e.timestamp() <= as_of)
        .count();

    NationalIndicators {
        stability,
        critical_count,
        volume_24h,
    }
}

/// Average risk per configured sector, in configuration order.
pub fn sector_status(events: &[ScoredEvent], sectors: &SectorRules) -> Vec<SectorStatus> {
    let sorted = newest_first(events);
    sectors
        .sector_names()
        .map(|name| {
            let in_sector = sorted
                .iter()
                .copied()
                .filter(|e| sectors.detect(e.text()) == name)
                .take(sectors.status_sample);
            let (average_risk, sample_size) = mean_risk(in_sector).unwrap_or((0.0, 0));
            SectorStatus {
                sector: name.to_string(),
                average_risk,
                sample_size,
            }
        })
        .collect()
}

/// Newest events above the high-risk threshold and below the opportunity
/// threshold, each list capped at the configured limit.
pub fn top_insights(events: &[ScoredEvent], scoring: &CompiledScoringConfig) -> Insights {
    let thresholds = &scoring.insights;
    let sorted = newest_first(events);
    let pick = |keep: &dyn Fn(f64) -> bool| -> Vec<ScoredEvent> {
        sorted
            .iter()
            .filter(|e| keep(e.risk_score()))
            .take(thresholds.limit)
            .map(|e| (*e).clone())
            .collect()
    };
    Insights {
        risks: pick(&|risk| risk > thresholds.high_risk),
        opportunities: pick(&|risk| risk < thresholds.opportunity),
    }
}

/// Newest events announcing a scheduled or future happening.
pub fn upcoming_events(events: &[ScoredEvent], sectors: &SectorRules, limit: usize) -> Vec<ScoredEvent> {
    newest_first(events)
        .into_iter()
        .filter(|e| sectors.is_upcoming(e.text()))
        .take(limit)
        .cloned()
        .collect()
}

/// Events with a resolved location.
pub fn mappable_events(events: &[ScoredEvent]) -> Vec<ScoredEvent> {
    events
        .iter()
        .filter(|e| e.location().is_some())
        .cloned()
        .collect()
}

/// Events belonging to `sector`. `All` or an empty name keeps everything.
pub fn filter_sector(events: &[ScoredEvent], sectors: &SectorRules, sector: &str) -> Vec<ScoredEvent> {
    let sector = sector.trim();
    if sector.is_empty() || sector == ALL_SECTORS {
        return events.to_vec();
    }
    events
        .iter()
        .filter(|e| sectors.detect(e.text()) == sector)
        .cloned()
        .collect()
}
