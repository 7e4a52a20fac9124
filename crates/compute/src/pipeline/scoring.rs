//! Risk scoring: category base severity plus scaled classifier confidence.

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use riskpulse_core::{
    validate_confidence, EventId, RawClassifiedEvent, Result, RiskCategory, RiskError, ScoredEvent,
};
use riskpulse_rules::scoring_config::MAX_RISK;
use riskpulse_rules::CompiledScoringConfig;

/// Score one classification.
///
/// `risk = base_severity[category] + confidence * amplifier`, clamped to
/// `[0, 100]`. A category missing from the severity table fails with
/// `UnknownCategory`; a confidence outside `[0, 1]` with `InvalidConfidence`.
pub fn score(category: RiskCategory, confidence: f64, config: &CompiledScoringConfig) -> Result<f64> {
    let base = config
        .base_severity(category)
        .ok_or_else(|| RiskError::UnknownCategory(category.to_string()))?;
    let confidence = validate_confidence(confidence)?;
    Ok((base + confidence * config.amplifier).clamp(0.0, MAX_RISK))
}

/// Score a classified event, keeping the event unchanged.
pub fn score_event(event: RawClassifiedEvent, config: &CompiledScoringConfig) -> Result<ScoredEvent> {
    let risk = score(event.category, event.confidence, config)?;
    Ok(ScoredEvent::new(event, risk))
}

/// An input event that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEvent {
    /// Position in the input batch.
    pub index: usize,
    pub event_id: EventId,
    #[serde(serialize_with = "display")]
    pub error: RiskError,
}

fn display<S: Serializer>(error: &RiskError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of scoring a batch. `scored` keeps input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchScore {
    pub scored: Vec<ScoredEvent>,
    pub rejected: Vec<RejectedEvent>,
}

/// Score every event in parallel. Invalid events are reported, never
/// given a substitute score.
pub fn score_batch(events: &[RawClassifiedEvent], config: &CompiledScoringConfig) -> BatchScore {
    let outcomes: Vec<Result<ScoredEvent>> = events
        .par_iter()
        .map(|event| score_event(event.clone(), config))
        .collect();

    let mut batch = BatchScore::default();
    for (index, (outcome, event)) in outcomes.into_iter().zip(events).enumerate() {
        match outcome {
            Ok(scored) => batch.scored.push(scored),
            Err(error) => {
                warn!(index, event_id = %event.id, error = %error, "event rejected by scorer");
                batch.rejected.push(RejectedEvent {
                    index,
                    event_id: event.id,
                    error,
                });
            }
        }
    }

    debug!(
        scored = batch.scored.len(),
        rejected = batch.rejected.len(),
        "batch scoring complete"
    );
    batch
}

/// Coarse severity band of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskBand {
    Info,
    Warning,
    Critical,
}

pub fn band(risk_score: f64, config: &CompiledScoringConfig) -> RiskBand {
    if risk_score >= config.bands.critical {
        RiskBand::Critical
    } else if risk_score >= config.bands.warning {
        RiskBand::Warning
    } else {
        RiskBand::Info
    }
}

/// Number of events in each risk band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

pub fn band_counts(events: &[ScoredEvent], config: &CompiledScoringConfig) -> BandCounts {
    events
        .iter()
        .fold(BandCounts::default(), |mut counts, e| {
            match band(e.risk_score(), config) {
                RiskBand::Critical => counts.critical += 1,
                RiskBand::Warning => counts.warning += 1,
                RiskBand::Info => counts.info += 1,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cfg() -> CompiledScoringConfig {
        CompiledScoringConfig::default()
    }

    #[test]
    fn base_plus_scaled_confidence() {
        assert_eq!(score(RiskCategory::CivilUnrest, 0.5, &cfg()).unwrap(), 90.0);
        assert_eq!(score(RiskCategory::EconomicCrisis, 0.0, &cfg()).unwrap(), 50.0);
        assert_eq!(score(RiskCategory::NaturalDisaster, 1.0, &cfg()).unwrap(), 90.0);
    }

    #[test]
    fn result_is_clamped_to_hundred() {
        assert_eq!(score(RiskCategory::CivilUnrest, 1.0, &cfg()).unwrap(), 100.0);
        let mut config = cfg();
        config.amplifier = 50.0;
        assert_eq!(score(RiskCategory::CivilUnrest, 1.0, &config).unwrap(), 100.0);
    }

    #[test]
    fn unrest_at_zero_confidence_beats_crisis_at_full() {
        let unrest = score(RiskCategory::CivilUnrest, 0.0, &cfg()).unwrap();
        let crisis = score(RiskCategory::EconomicCrisis, 1.0, &cfg()).unwrap();
        assert!(unrest > crisis);
    }

    #[test]
    fn confidence_out_of_range_fails() {
        assert_eq!(
            score(RiskCategory::Other, 1.2, &cfg()).unwrap_err(),
            RiskError::InvalidConfidence(1.2)
        );
        assert!(matches!(
            score(RiskCategory::Other, -0.01, &cfg()),
            Err(RiskError::InvalidConfidence(_))
        ));
    }

    #[test]
    fn category_missing_from_table_fails() {
        let mut config = cfg();
        config.base_severity.remove(&RiskCategory::NaturalDisaster);
        assert_eq!(
            score(RiskCategory::NaturalDisaster, 0.5, &config).unwrap_err(),
            RiskError::UnknownCategory("NaturalDisaster".to_string())
        );
    }

    #[test]
    fn batch_keeps_order_and_reports_rejections() {
        let now = Utc::now();
        let events = vec![
            RawClassifiedEvent::new("riot", RiskCategory::CivilUnrest, 0.9, now),
            RawClassifiedEvent::new("bad", RiskCategory::Other, 3.0, now),
            RawClassifiedEvent::new("flood", RiskCategory::NaturalDisaster, 0.1, now),
        ];
        let batch = score_batch(&events, &cfg());

        assert_eq!(batch.scored.len(), 2);
        assert_eq!(batch.scored[0].text(), "riot");
        assert_eq!(batch.scored[1].text(), "flood");
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].index, 1);
        assert_eq!(batch.rejected[0].event_id, events[1].id);
        assert_eq!(batch.rejected[0].error, RiskError::InvalidConfidence(3.0));
    }

    #[test]
    fn rejected_event_serializes_error_text() {
        let rejected = RejectedEvent {
            index: 0,
            event_id: EventId::nil(),
            error: RiskError::InvalidConfidence(2.0),
        };
        let value = serde_json::to_value(&rejected).unwrap();
        assert_eq!(value["error"], "Confidence 2 is outside [0, 1]");
    }

    #[test]
    fn band_counts_tally_each_band() {
        let now = Utc::now();
        let events: Vec<ScoredEvent> = [95.0, 80.0, 60.0, 10.0, 0.0]
            .iter()
            .map(|r| ScoredEvent::new(RawClassifiedEvent::new("e", RiskCategory::Other, 0.5, now), *r))
            .collect();
        assert_eq!(
            band_counts(&events, &cfg()),
            BandCounts {
                critical: 2,
                warning: 1,
                info: 2
            }
        );
        assert_eq!(band_counts(&[], &cfg()), BandCounts::default());
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(band(95.0, &cfg()), RiskBand::Critical);
        assert_eq!(band(80.0, &cfg()), RiskBand::Critical);
        assert_eq!(band(60.0, &cfg()), RiskBand::Warning);
        assert_eq!(band(10.0, &cfg()), RiskBand::Info);
    }
}
