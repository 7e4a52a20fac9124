//! ClusteringConfig rule kind: bounds for topic clustering and labelling.

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

/// Top-level ClusteringConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClusteringConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ClusteringConfigSpec,
}

/// Specification section of a ClusteringConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClusteringConfigSpec {
    /// Upper bound on the derived cluster count.
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,
    /// Distinct texts needed per derived cluster.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    /// Batches smaller than this produce no themes.
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
    /// Cap on Lloyd iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Number of centroid terms joined into a label.
    #[serde(default = "default_label_terms")]
    pub label_terms: usize,
    /// Stopwords added to the built-in English list.
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

fn default_max_clusters() -> usize {
    3
}
fn default_min_cluster_size() -> usize {
    2
}
fn default_min_batch_size() -> usize {
    5
}
fn default_max_iterations() -> usize {
    100
}
fn default_label_terms() -> usize {
    2
}

impl Default for ClusteringConfigSpec {
    fn default() -> Self {
        Self {
            max_clusters: default_max_clusters(),
            min_cluster_size: default_min_cluster_size(),
            min_batch_size: default_min_batch_size(),
            max_iterations: default_max_iterations(),
            label_terms: default_label_terms(),
            extra_stopwords: Vec::new(),
        }
    }
}

impl ClusteringConfigSpec {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_clusters", self.max_clusters),
            ("min_cluster_size", self.min_cluster_size),
            ("max_iterations", self.max_iterations),
            ("label_terms", self.label_terms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(RuleError::Validation(format!("{} must be at least 1", field)));
            }
        }
        Ok(())
    }
}

pub type CompiledClusteringConfig = ClusteringConfigSpec;

impl ClusteringConfigRule {
    pub fn compile(&self) -> Result<CompiledClusteringConfig> {
        self.spec.validate()?;
        let mut spec = self.spec.clone();
        for word in &mut spec.extra_stopwords {
            *word = word.to_lowercase();
        }
        Ok(spec)
    }
}
