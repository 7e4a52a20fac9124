//! Linear trend forecasting over risk and stability histories.

use chrono::{DateTime, Utc};
use tracing::debug;

use riskpulse_core::{
    ForecastResult, Result, ScoredEvent, StabilitySnapshot, TrendLabel, STABILITY_MAX,
    STABILITY_MIN,
};
use riskpulse_rules::CompiledForecastConfig;

use crate::algorithms::regression::{fit_line, LinearFit};

/// Forecast an evenly spaced risk history (`x = 0, 1, ..`).
pub fn forecast(history: &[f64], config: &CompiledForecastConfig) -> Result<ForecastResult> {
    let points: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, y)| (i as f64, *y))
        .collect();
    forecast_at(&points, config)
}

/// Forecast `(offset, score)` points with irregular offsets, measured in
/// forecast steps. Projections continue from the largest offset.
pub fn forecast_at(points: &[(f64, f64)], config: &CompiledForecastConfig) -> Result<ForecastResult> {
    let fit = fit_line(points)?;
    let label = classify(fit.slope, config.accel_threshold);
    let result = ForecastResult {
        slope: fit.slope,
        intercept: fit.intercept,
        trend_label: label,
        projected_scores: project(&fit, last_offset(points), config.horizon),
        alert_triggered: label == TrendLabel::Accelerating,
    };

    debug!(
        points = points.len(),
        slope = fit.slope,
        r_squared = fit.r_squared,
        trend = %label,
        "risk forecast"
    );
    Ok(result)
}

/// Forecast a stability history, one snapshot per step.
///
/// Higher stability is better, so a falling series classifies as
/// `Accelerating` risk. Slope, intercept and projections stay in stability
/// units; projections are clamped to `[0, 100]`.
pub fn forecast_stability(
    snapshots: &[StabilitySnapshot],
    config: &CompiledForecastConfig,
) -> Result<ForecastResult> {
    let points: Vec<(f64, f64)> = snapshots
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.stability_score))
        .collect();
    let fit = fit_line(&points)?;
    let label = classify(-fit.slope, config.accel_threshold);
    let projected_scores = project(&fit, last_offset(&points), config.horizon)
        .into_iter()
        .map(|y| y.clamp(STABILITY_MIN, STABILITY_MAX))
        .collect();

    debug!(
        snapshots = snapshots.len(),
        slope = fit.slope,
        trend = %label,
        "stability forecast"
    );

    Ok(ForecastResult {
        slope: fit.slope,
        intercept: fit.intercept,
        trend_label: label,
        projected_scores,
        alert_triggered: label == TrendLabel::Accelerating,
    })
}

/// Mean risk per consecutive bucket, aligned to the earliest event.
///
/// Buckets with no events contribute 0. Only the newest `max_buckets`
/// buckets are kept, so an outlying old timestamp cannot inflate the
/// series. Returns an empty series for no events or an unusable width.
pub fn bucket_risk(events: &[ScoredEvent], bucket_minutes: u64, max_buckets: usize) -> Vec<f64> {
    let Some(width_ms) = bucket_minutes
        .checked_mul(60_000)
        .and_then(|ms| i64::try_from(ms).ok())
        .filter(|ms| *ms > 0)
    else {
        return Vec::new();
    };
    if max_buckets == 0 {
        return Vec::new();
    }
    let Some(origin) = events.iter().map(|e| e.timestamp()).min() else {
        return Vec::new();
    };

    let indexed: Vec<(u64, f64)> = events
        .iter()
        .map(|e| (bucket_index(origin, e.timestamp(), width_ms), e.risk_score()))
        .collect();
    let last = indexed.iter().map(|(i, _)| *i).max().unwrap_or(0);
    let first = last.saturating_sub(max_buckets as u64 - 1);

    let mut sums = vec![(0.0, 0usize); (last - first) as usize + 1];
    for (index, risk) in indexed {
        if index < first {
            continue;
        }
        let slot = &mut sums[(index - first) as usize];
        slot.0 += risk;
        slot.1 += 1;
    }

    if first > 0 {
        debug!(first_kept = first, last, "older buckets dropped");
    }

    sums.into_iter()
        .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect()
}

fn bucket_index(origin: DateTime<Utc>, at: DateTime<Utc>, width_ms: i64) -> u64 {
    let elapsed = at.signed_duration_since(origin).num_milliseconds().max(0);
    (elapsed / width_ms) as u64
}

fn classify(slope: f64, threshold: f64) -> TrendLabel {
    if slope > threshold {
        TrendLabel::Accelerating
    } else if slope < -threshold {
        TrendLabel::Improving
    } else {
        TrendLabel::Stable
    }
}

fn last_offset(points: &[(f64, f64)]) -> f64 {
    points
        .iter()
        .map(|(x, _)| *x)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn project(fit: &LinearFit, last_x: f64, horizon: usize) -> Vec<f64> {
    (1..=horizon).map(|k| fit.predict(last_x + k as f64)).collect()
}
