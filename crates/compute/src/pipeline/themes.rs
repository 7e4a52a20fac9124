//! Topic clustering of event texts: TF-IDF, K-Means, then top-term labels.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use riskpulse_core::{Result, RiskError, ScoredEvent};
use riskpulse_rules::CompiledClusteringConfig;

use crate::algorithms::kmeans::kmeans;
use crate::algorithms::tfidf::TfidfVectorizer;

/// Label of a cluster whose centroid carries no positive term weight.
pub const MISC_LABEL: &str = "MISC";

/// One topic found in a batch of texts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCluster {
    pub cluster_id: usize,
    pub label: String,
    /// Indices into the input batch.
    pub member_event_indices: BTreeSet<usize>,
    /// K-means centroid over the batch vocabulary (sorted term order).
    pub centroid: Vec<f64>,
    /// Highest-weighted centroid terms, strongest first.
    pub top_terms: Vec<String>,
    pub size: usize,
}

/// Partition `texts` into `k` topic clusters.
///
/// Every input index lands in exactly one cluster. Degenerate batches can
/// leave clusters empty; those are returned with `size == 0` and the `MISC`
/// label.
pub fn detect_trends<S: AsRef<str> + Sync>(
    texts: &[S],
    k: usize,
    config: &CompiledClusteringConfig,
) -> Result<Vec<TrendCluster>> {
    if k == 0 || texts.len() < k {
        return Err(RiskError::InsufficientData {
            required: k.max(1),
            actual: texts.len(),
        });
    }

    let vectorizer = TfidfVectorizer::new().with_extra_stopwords(&config.extra_stopwords);
    let matrix = vectorizer.fit_transform(texts);
    let result = kmeans(&matrix.dense_rows(), k, config.max_iterations)?;

    let mut members = vec![BTreeSet::new(); k];
    for (index, &cluster) in result.assignments.iter().enumerate() {
        members[cluster].insert(index);
    }

    let clusters: Vec<TrendCluster> = members
        .into_iter()
        .zip(result.centroids.iter())
        .enumerate()
        .map(|(cluster_id, (member_event_indices, centroid))| {
            let top_terms = if member_event_indices.is_empty() {
                Vec::new()
            } else {
                top_terms(centroid, &matrix.vocabulary, config.label_terms)
            };
            TrendCluster {
                cluster_id,
                label: label_for(&top_terms),
                size: member_event_indices.len(),
                member_event_indices,
                centroid: centroid.clone(),
                top_terms,
            }
        })
        .collect();

    debug!(
        texts = texts.len(),
        k,
        vocabulary = matrix.dim(),
        iterations = result.iterations,
        inertia = result.inertia,
        "topic clustering complete"
    );
    Ok(clusters)
}

/// Cluster count for a batch: one cluster per `min_cluster_size` distinct
/// texts, capped at `max_clusters`, never below 1.
pub fn derive_k<S: AsRef<str>>(texts: &[S], config: &CompiledClusteringConfig) -> usize {
    let distinct: HashSet<String> = texts
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .collect();
    let per_cluster = config.min_cluster_size.max(1);
    (distinct.len() / per_cluster).min(config.max_clusters).max(1)
}

/// Topics among a batch of scored events, largest first.
///
/// Batches smaller than `min_batch_size` produce no themes. Empty clusters
/// are dropped.
pub fn emerging_themes(
    events: &[ScoredEvent],
    config: &CompiledClusteringConfig,
) -> Result<Vec<TrendCluster>> {
    if events.len() < config.min_batch_size {
        debug!(
            events = events.len(),
            min_batch_size = config.min_batch_size,
            "batch too small for theme detection"
        );
        return Ok(Vec::new());
    }

    let texts: Vec<&str> = events.iter().map(|e| e.text()).collect();
    let k = derive_k(&texts, config);
    let mut clusters = detect_trends(&texts, k, config)?;
    clusters.retain(|c| c.size > 0);
    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.cluster_id.cmp(&b.cluster_id)));
    Ok(clusters)
}

fn top_terms(centroid: &[f64], vocabulary: &[String], limit: usize) -> Vec<String> {
    let mut weighted: Vec<(usize, f64)> = centroid
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, w)| *w > 0.0)
        .collect();
    // Vocabulary is sorted, so index order breaks ties alphabetically.
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    weighted
        .into_iter()
        .take(limit)
        .map(|(i, _)| vocabulary[i].clone())
        .collect()
}

fn label_for(terms: &[String]) -> String {
    if terms.is_empty() {
        return MISC_LABEL.to_string();
    }
    terms
        .iter()
        .map(|t| t.to_uppercase())
        .collect::<Vec<_>>()
        .join(" & ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riskpulse_core::{RawClassifiedEvent, RiskCategory};

    fn cfg() -> CompiledClusteringConfig {
        CompiledClusteringConfig::default()
    }

    const FUEL_AND_ELECTION: [&str; 4] = [
        "fuel shortage",
        "fuel strike",
        "election results",
        "election fraud",
    ];

    #[test]
    fn separates_fuel_from_election() {
        let clusters = detect_trends(&FUEL_AND_ELECTION, 2, &cfg()).unwrap();
        assert_eq!(clusters.len(), 2);

        let election = &clusters[0];
        assert_eq!(election.member_event_indices, BTreeSet::from([2, 3]));
        assert_eq!(election.label, "ELECTION & FRAUD");

        let fuel = &clusters[1];
        assert_eq!(fuel.member_event_indices, BTreeSet::from([0, 1]));
        assert_eq!(fuel.label, "FUEL & SHORTAGE");
    }

    #[test]
    fn centroid_spans_vocabulary_and_backs_label() {
        let vocabulary = TfidfVectorizer::new().fit_transform(&FUEL_AND_ELECTION).vocabulary;
        let clusters = detect_trends(&FUEL_AND_ELECTION, 2, &cfg()).unwrap();

        for cluster in &clusters {
            assert_eq!(cluster.centroid.len(), vocabulary.len());

            let mut ranked: Vec<usize> = (0..vocabulary.len()).collect();
            ranked.sort_by(|&a, &b| {
                cluster.centroid[b]
                    .total_cmp(&cluster.centroid[a])
                    .then(a.cmp(&b))
            });
            let strongest: Vec<String> = ranked
                .iter()
                .take(2)
                .map(|&i| vocabulary[i].to_uppercase())
                .collect();
            assert_eq!(cluster.label, strongest.join(" & "));
        }

        let value = serde_json::to_value(&clusters[0]).unwrap();
        assert_eq!(value["centroid"].as_array().unwrap().len(), vocabulary.len());
    }

    #[test]
    fn clusters_partition_the_input() {
        let texts = [
            "port congestion delays shipping",
            "bank raises interest rates",
            "port workers strike",
            "inflation hits record high",
            "shipping costs rise at port",
        ];
        let clusters = detect_trends(&texts, 3, &cfg()).unwrap();
        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            assert_eq!(cluster.size, cluster.member_event_indices.len());
            for &i in &cluster.member_event_indices {
                assert!(seen.insert(i), "index {i} in two clusters");
            }
        }
        assert_eq!(seen, (0..texts.len()).collect());
        let ids: BTreeSet<usize> = clusters.iter().map(|c| c.cluster_id).collect();
        assert_eq!(ids.len(), clusters.len());
    }

    #[test]
    fn detection_is_idempotent() {
        let first = detect_trends(&FUEL_AND_ELECTION, 2, &cfg()).unwrap();
        let second = detect_trends(&FUEL_AND_ELECTION, 2, &cfg()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn too_few_texts_fail() {
        assert_eq!(
            detect_trends(&["only one"], 2, &cfg()).unwrap_err(),
            RiskError::InsufficientData { required: 2, actual: 1 }
        );
        assert!(matches!(
            detect_trends(&FUEL_AND_ELECTION, 0, &cfg()),
            Err(RiskError::InsufficientData { .. })
        ));
    }

    #[test]
    fn identical_texts_leave_empty_clusters() {
        let texts = ["power outage", "power outage", "power outage"];
        let clusters = detect_trends(&texts, 2, &cfg()).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].size, 3);
        assert_eq!(clusters[0].label, "OUTAGE & POWER");
        assert_eq!(clusters[1].size, 0);
        assert_eq!(clusters[1].label, MISC_LABEL);
    }

    #[test]
    fn stopword_only_texts_are_misc() {
        let texts = ["the and of", "it is a"];
        let clusters = detect_trends(&texts, 1, &cfg()).unwrap();
        assert_eq!(clusters[0].size, 2);
        assert_eq!(clusters[0].label, MISC_LABEL);
    }

    #[test]
    fn extra_stopwords_are_ignored_in_labels() {
        let mut config = cfg();
        config.extra_stopwords = vec!["fuel".to_string()];
        let clusters = detect_trends(&["fuel shortage", "fuel shortage"], 1, &config).unwrap();
        assert_eq!(clusters[0].label, "SHORTAGE");
    }

    #[test]
    fn derive_k_counts_distinct_texts() {
        let config = cfg();
        assert_eq!(derive_k(&FUEL_AND_ELECTION, &config), 2);
        assert_eq!(derive_k(&["a", "A ", "a"], &config), 1);
        let many: Vec<String> = (0..20).map(|i| format!("text {i}")).collect();
        assert_eq!(derive_k(&many, &config), 3);
        let empty: [&str; 0] = [];
        assert_eq!(derive_k(&empty, &config), 1);
    }

    fn scored(text: &str) -> ScoredEvent {
        ScoredEvent::new(
            RawClassifiedEvent::new(text, RiskCategory::Other, 0.5, Utc::now()),
            20.0,
        )
    }

    #[test]
    fn small_batches_have_no_themes() {
        let events: Vec<ScoredEvent> = FUEL_AND_ELECTION.iter().map(|t| scored(t)).collect();
        assert!(emerging_themes(&events, &cfg()).unwrap().is_empty());
    }

    #[test]
    fn emerging_themes_largest_first() {
        let texts = [
            "fuel shortage",
            "fuel strike",
            "election results",
            "fuel queue",
            "election fraud",
        ];
        let events: Vec<ScoredEvent> = texts.iter().map(|t| scored(t)).collect();
        let themes = emerging_themes(&events, &cfg()).unwrap();
        assert_eq!(themes.len(), 2);
        assert!(themes[0].size >= themes[1].size);
        assert!(themes.iter().all(|t| t.size > 0));
        assert_eq!(themes.iter().map(|t| t.size).sum::<usize>(), 5);
    }
}
