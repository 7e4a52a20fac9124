pub mod kmeans;
pub mod regression;
pub mod tfidf;
