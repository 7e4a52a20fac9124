//! Rolling-window stability aggregation.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use riskpulse_core::{ScoredEvent, StabilitySnapshot, STABILITY_MAX, STABILITY_MIN};
use riskpulse_rules::CompiledAggregationConfig;

/// Start of a lookback of `minutes` ending at `as_of`, or `None` when it
/// reaches past the representable time range.
pub fn lookback_start(as_of: DateTime<Utc>, minutes: u64) -> Option<DateTime<Utc>> {
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|span| as_of.checked_sub_signed(span))
}

/// Events whose timestamps fall in `(as_of - window, as_of]`, in input order.
/// A window reaching past the representable time range is unbounded below.
pub fn window(events: &[ScoredEvent], as_of: DateTime<Utc>, window_minutes: u64) -> Vec<ScoredEvent> {
    let start = lookback_start(as_of, window_minutes);
    events
        .iter()
        .filter(|e| start.map_or(true, |s| e.timestamp() > s) && e.timestamp() <= as_of)
        .cloned()
        .collect()
}

/// Ratio of the observed event rate to the baseline rate, bounded to
/// `[1, max_velocity_factor]`.
pub fn velocity_factor(event_count: usize, config: &CompiledAggregationConfig) -> f64 {
    let hours = config.window_hours();
    if event_count == 0 || hours <= 0.0 || config.baseline_events_per_hour <= 0.0 {
        return 1.0;
    }
    let density = event_count as f64 / hours;
    (density / config.baseline_events_per_hour).clamp(1.0, config.max_velocity_factor.max(1.0))
}

/// Weights summing to 1. Uniform without a half-life, otherwise
/// `0.5^(age / half_life)` so newer events never weigh less than older ones.
pub fn recency_weights(events: &[ScoredEvent], as_of: DateTime<Utc>, half_life_minutes: Option<f64>) -> Vec<f64> {
    if events.is_empty() {
        return Vec::new();
    }
    let raw: Vec<f64> = match half_life_minutes {
        Some(half_life) if half_life > 0.0 => events
            .iter()
            .map(|e| {
                let age_minutes = (as_of - e.timestamp()).num_milliseconds().max(0) as f64 / 60_000.0;
                0.5_f64.powf(age_minutes / half_life)
            })
            .collect(),
        _ => vec![1.0; events.len()],
    };
    let total: f64 = raw.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![1.0 / events.len() as f64; events.len()];
    }
    raw.into_iter().map(|w| w / total).collect()
}

/// Collapse the events of one window into a stability snapshot stamped `as_of`.
///
/// An empty window is the baseline: stability 100, velocity 1.
pub fn aggregate(
    events: &[ScoredEvent],
    as_of: DateTime<Utc>,
    config: &CompiledAggregationConfig,
) -> StabilitySnapshot {
    if events.is_empty() {
        debug!(%as_of, "empty window, baseline stability");
        return StabilitySnapshot::baseline(as_of);
    }

    let weights = recency_weights(events, as_of, config.recency_half_life_minutes);
    let weighted_avg_risk: f64 = events
        .iter()
        .zip(&weights)
        .map(|(e, w)| e.risk_score() * w)
        .sum();
    let velocity = velocity_factor(events.len(), config);
    let stability = (STABILITY_MAX - weighted_avg_risk * velocity).clamp(STABILITY_MIN, STABILITY_MAX);

    debug!(
        events = events.len(),
        weighted_avg_risk,
        velocity,
        stability,
        "stability aggregated"
    );

    StabilitySnapshot {
        timestamp: as_of,
        stability_score: stability,
        contributing_event_count: events.len(),
        weighted_avg_risk,
        velocity_factor: velocity,
    }
}
