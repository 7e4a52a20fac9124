//! End-to-end properties of scoring, aggregation, forecasting and topic
//! detection, run against the shipped rule documents.

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};

use riskpulse_compute::pipeline::stability::window;
use riskpulse_compute::{aggregate, detect_trends, forecast, score, score_batch, Pipeline};
use riskpulse_core::{RawClassifiedEvent, RiskCategory, RiskError, ScoredEvent, TrendLabel};
use riskpulse_rules::AnalyticsRules;

fn rules_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules")
}

fn shipped_rules() -> AnalyticsRules {
    let (rules, _) = AnalyticsRules::load(&rules_dir())
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", rules_dir().display(), e));
    rules
}

fn scored_at(risk: f64, minutes_ago: i64) -> ScoredEvent {
    let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ScoredEvent::new(
        RawClassifiedEvent::new(
            "event",
            RiskCategory::Other,
            0.5,
            as_of - Duration::minutes(minutes_ago),
        ),
        risk,
    )
}

#[test]
fn risk_scores_stay_in_range_and_grow_with_confidence() {
    let rules = shipped_rules();
    for category in RiskCategory::ALL {
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=20 {
            let confidence = step as f64 / 20.0;
            let risk = score(category, confidence, &rules.scoring).unwrap();
            assert!((0.0..=100.0).contains(&risk), "{category} at {confidence}: {risk}");
            assert!(risk >= previous, "{category} not monotone at {confidence}");
            previous = risk;
        }
    }
}

#[test]
fn unrest_outranks_economic_crisis() {
    let rules = shipped_rules();
    let unrest = score(RiskCategory::CivilUnrest, 0.0, &rules.scoring).unwrap();
    let crisis = score(RiskCategory::EconomicCrisis, 1.0, &rules.scoring).unwrap();
    assert!(unrest > crisis);
    assert!(rules
        .scoring
        .dominates(RiskCategory::CivilUnrest, RiskCategory::EconomicCrisis));
}

#[test]
fn invalid_confidence_is_never_scored() {
    let rules = shipped_rules();
    assert!(matches!(
        score(RiskCategory::Other, f64::NAN, &rules.scoring),
        Err(RiskError::InvalidConfidence(_))
    ));
    let now = Utc::now();
    let batch = score_batch(
        &[RawClassifiedEvent::new("x", RiskCategory::Other, 1.5, now)],
        &rules.scoring,
    );
    assert!(batch.scored.is_empty());
    assert_eq!(batch.rejected.len(), 1);
}

#[test]
fn empty_window_is_fully_stable() {
    let rules = shipped_rules();
    let snapshot = aggregate(&[], Utc::now(), &rules.aggregation);
    assert_eq!(snapshot.stability_score, 100.0);
}

#[test]
fn riskier_window_is_less_stable() {
    let rules = shipped_rules();
    let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let high = aggregate(&[scored_at(90.0, 1)], as_of, &rules.aggregation);
    let low = aggregate(&[scored_at(10.0, 1)], as_of, &rules.aggregation);
    assert!(high.stability_score <= low.stability_score);
}

#[test]
fn denser_window_is_never_more_stable() {
    let rules = shipped_rules();
    let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut previous = f64::INFINITY;
    for count in [1, 5, 10, 15, 20, 40] {
        let events: Vec<ScoredEvent> = (0..count).map(|i| scored_at(30.0, i)).collect();
        let in_window = window(&events, as_of, rules.aggregation.window_minutes);
        let stability = aggregate(&in_window, as_of, &rules.aggregation).stability_score;
        assert!(stability <= previous, "{count} events raised stability");
        previous = stability;
    }
}

#[test]
fn rising_history_accelerates() {
    let rules = shipped_rules();
    let result = forecast(&[10.0, 20.0, 30.0, 40.0], &rules.forecast).unwrap();
    assert!((result.slope - 10.0).abs() < 1e-9);
    assert_eq!(result.trend_label, TrendLabel::Accelerating);
    assert!(result.alert_triggered);
    for (projected, expected) in result.projected_scores.iter().zip([50.0, 60.0, 70.0, 80.0]) {
        assert!((projected - expected).abs() < 1e-9);
    }
}

#[test]
fn flat_history_is_stable() {
    let rules = shipped_rules();
    let result = forecast(&[50.0, 50.0, 50.0], &rules.forecast).unwrap();
    assert_eq!(result.slope, 0.0);
    assert_eq!(result.trend_label, TrendLabel::Stable);
}

#[test]
fn single_point_history_is_insufficient() {
    let rules = shipped_rules();
    assert!(matches!(
        forecast(&[42.0], &rules.forecast),
        Err(RiskError::InsufficientHistory { .. })
    ));
}

#[test]
fn topics_separate_and_labels_use_member_terms() {
    let rules = shipped_rules();
    let texts = ["fuel shortage", "fuel strike", "election results", "election fraud"];
    let clusters = detect_trends(&texts, 2, &rules.clustering).unwrap();

    let groups: BTreeSet<BTreeSet<usize>> = clusters
        .iter()
        .map(|c| c.member_event_indices.clone())
        .collect();
    assert_eq!(
        groups,
        BTreeSet::from([BTreeSet::from([0, 1]), BTreeSet::from([2, 3])])
    );

    for cluster in &clusters {
        let member_words: BTreeSet<String> = cluster
            .member_event_indices
            .iter()
            .flat_map(|&i| texts[i].split_whitespace().map(str::to_uppercase))
            .collect();
        for term in cluster.label.split(" & ") {
            assert!(member_words.contains(term), "{term} not in cluster vocabulary");
        }
    }
}

#[test]
fn topic_detection_is_idempotent() {
    let rules = shipped_rules();
    let texts = [
        "bank raises rates",
        "port strike halts shipping",
        "inflation climbs again",
        "dock workers strike at port",
        "central bank inflation warning",
    ];
    let first = detect_trends(&texts, 2, &rules.clustering).unwrap();
    let second = detect_trends(&texts, 2, &rules.clustering).unwrap();
    assert_eq!(first, second);
}

#[test]
fn scored_events_are_not_altered_downstream() {
    let rules = shipped_rules();
    let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let events: Vec<RawClassifiedEvent> = (0..6)
        .map(|i| {
            RawClassifiedEvent::new(
                format!("fuel protest number {i}"),
                RiskCategory::CivilUnrest,
                0.1 * i as f64,
                as_of - Duration::minutes(10 * i),
            )
        })
        .collect();

    let mut pipeline = Pipeline::new(rules);
    let report = pipeline.tick(&events, &[], as_of);
    let before = report.scored.clone();

    let _ = pipeline.themes(&report.scored).unwrap();
    let _ = pipeline.dashboard(&report.scored, as_of, "All");
    let _ = aggregate(&report.scored, as_of, &pipeline.rules().aggregation);

    assert_eq!(report.scored, before);
    for (scored, raw) in report.scored.iter().zip(&events) {
        assert_eq!(scored.event(), raw);
    }
}
