pub mod algorithms;
pub mod pipeline;

pub use pipeline::forecast::{forecast, forecast_at, forecast_stability};
pub use pipeline::scoring::{score, score_batch, score_event, BatchScore, RiskBand};
pub use pipeline::stability::aggregate;
pub use pipeline::themes::{detect_trends, TrendCluster};
pub use pipeline::{Dashboard, Pipeline, TickReport};
