//! Capability interfaces for the systems around the analytical core.
//!
//! The classifier, geolocation lookup and storage are supplied by the
//! caller. Any implementation honouring these contracts can be swapped in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::event::{validate_confidence, Coordinate, RawClassifiedEvent, RiskCategory, ScoredEvent};
use crate::snapshot::StabilitySnapshot;

/// Output of a text classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: RiskCategory,
    /// Expected in `[0, 1]`; validated by [`build_event`].
    pub confidence: f64,
}

/// Zero-shot (or any other) text classifier.
///
/// Implementations should fall back to [`RiskCategory::Other`] with a low
/// confidence instead of failing on odd input.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

/// Place-name resolver. `None` means the location is unresolved.
pub trait Geolocator: Send + Sync {
    fn resolve(&self, location_name: &str) -> Option<Coordinate>;
}

/// Persistence for scored events and stability snapshots.
pub trait EventStore: Send + Sync {
    fn save_snapshot(&self, snapshot: &StabilitySnapshot) -> Result<()>;

    fn save_events(&self, events: &[ScoredEvent]) -> Result<()>;

    /// Snapshots with `from <= timestamp <= to`, ascending by timestamp.
    fn load_history(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<StabilitySnapshot>>;
}

/// A text item handed over by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingItem {
    pub text: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location_name: Option<String>,
}

/// Classify and locate an incoming item.
///
/// Fails with `InvalidConfidence` if the classifier reports a confidence
/// outside `[0, 1]`. An unresolved location leaves `location` empty.
pub fn build_event(
    classifier: &dyn Classifier,
    geolocator: &dyn Geolocator,
    item: IncomingItem,
) -> Result<RawClassifiedEvent> {
    let classification = classifier.classify(&item.text);
    let confidence = validate_confidence(classification.confidence)?;

    let location = item
        .location_name
        .as_deref()
        .and_then(|name| geolocator.resolve(name));
    if location.is_none() && item.location_name.is_some() {
        debug!(source = %item.source, "location unresolved, event will not be plotted");
    }

    Ok(
        RawClassifiedEvent::new(item.text, classification.category, confidence, item.timestamp)
            .with_source(item.source)
            .with_location(location),
    )
}

/// Sort a loaded history ascending by timestamp if a store returned it out of order.
pub fn ensure_ascending(mut history: Vec<StabilitySnapshot>) -> Vec<StabilitySnapshot> {
    if history.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
        history.sort_by_key(|s| s.timestamp);
    }
    history
}
