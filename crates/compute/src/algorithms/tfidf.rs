//! TF-IDF vectorization of short texts over a batch-local vocabulary.
//!
//! Tokens are lower-cased runs of alphanumeric characters, at least two
//! characters long, minus English stopwords. Weights are raw term counts
//! times the smoothed inverse document frequency `ln((1 + n) / (1 + df)) + 1`,
//! and every non-empty row is L2-normalized.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rayon::prelude::*;

/// Common English function words dropped before weighting.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "if", "in", "into", "is", "it", "its",
    "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
    "out", "over", "own", "same", "says", "said", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// A sparse row: parallel vectors of ascending term indices and weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            dense[i] = v;
        }
        dense
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Document-term matrix produced by [`TfidfVectorizer::fit_transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    /// Terms sorted lexicographically; a term's position is its column index.
    pub vocabulary: Vec<String>,
    /// One row per input text, in input order.
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn dense_rows(&self) -> Vec<Vec<f64>> {
        let dim = self.dim();
        self.rows.iter().map(|r| r.to_dense(dim)).collect()
    }
}

/// Stopword-filtering TF-IDF vectorizer.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stopwords: HashSet<String>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            stopwords: ENGLISH_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add batch- or deployment-specific stopwords (compared lower-case).
    pub fn with_extra_stopwords<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords
            .extend(extra.into_iter().map(|s| s.as_ref().to_lowercase()));
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .map(str::to_lowercase)
            .filter(|t| !self.stopwords.contains(t))
            .collect()
    }

    /// Build the vocabulary from `texts` and weight every text against it.
    pub fn fit_transform<S: AsRef<str> + Sync>(&self, texts: &[S]) -> TfidfMatrix {
        let counts: Vec<BTreeMap<String, usize>> = texts
            .par_iter()
            .map(|text| {
                let mut tf = BTreeMap::new();
                for token in self.tokenize(text.as_ref()) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let vocabulary: Vec<String> = counts
            .iter()
            .flat_map(|tf| tf.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for term in tf.keys() {
                df[index[term.as_str()]] += 1;
            }
        }

        let n = texts.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .par_iter()
            .map(|tf| {
                // BTreeMap iteration is alphabetical, which matches column order.
                let mut row = SparseVector::default();
                for (term, &count) in tf {
                    let col = index[term.as_str()];
                    row.indices.push(col);
                    row.values.push(count as f64 * idf[col]);
                }
                let norm = row.norm();
                if norm > 0.0 {
                    for v in &mut row.values {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();

        TfidfMatrix { vocabulary, rows }
    }
}
