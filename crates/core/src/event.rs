use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RiskError};

/// Unique identifier of an ingested event.
pub type EventId = Uuid;

/// Risk category assigned by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskCategory {
    CivilUnrest,
    EconomicCrisis,
    NaturalDisaster,
    Other,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::CivilUnrest,
        RiskCategory::EconomicCrisis,
        RiskCategory::NaturalDisaster,
        RiskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::CivilUnrest => "CivilUnrest",
            RiskCategory::EconomicCrisis => "EconomicCrisis",
            RiskCategory::NaturalDisaster => "NaturalDisaster",
            RiskCategory::Other => "Other",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = RiskError;

    /// Accepts `CivilUnrest`, `civil_unrest`, `Civil Unrest`, `civil-unrest`, ...
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "civilunrest" => Ok(RiskCategory::CivilUnrest),
            "economiccrisis" => Ok(RiskCategory::EconomicCrisis),
            "naturaldisaster" => Ok(RiskCategory::NaturalDisaster),
            "other" => Ok(RiskCategory::Other),
            _ => Err(RiskError::UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for RiskCategory {
    type Error = RiskError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RiskCategory> for String {
    fn from(value: RiskCategory) -> Self {
        value.as_str().to_string()
    }
}

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Check that a classifier confidence lies in `[0, 1]`.
pub fn validate_confidence(confidence: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(RiskError::InvalidConfidence(confidence))
    }
}

/// A text event as produced by the classifier collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClassifiedEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: EventId,
    pub text: String,
    #[serde(default = "default_source")]
    pub source: String,
    pub category: RiskCategory,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

fn default_source() -> String {
    "unknown".to_string()
}

impl RawClassifiedEvent {
    pub fn new(
        text: impl Into<String>,
        category: RiskCategory,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            source: default_source(),
            category,
            confidence,
            timestamp,
            location: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_location(mut self, location: Option<Coordinate>) -> Self {
        self.location = location;
        self
    }
}

/// A classified event together with its computed risk score.
///
/// Fields are read-only after construction: downstream stages borrow the
/// score, they never rewrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    #[serde(flatten)]
    event: RawClassifiedEvent,
    risk_score: f64,
}

impl ScoredEvent {
    pub fn new(event: RawClassifiedEvent, risk_score: f64) -> Self {
        Self { event, risk_score }
    }

    pub fn event(&self) -> &RawClassifiedEvent {
        &self.event
    }

    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    pub fn id(&self) -> EventId {
        self.event.id
    }

    pub fn text(&self) -> &str {
        &self.event.text
    }

    pub fn category(&self) -> RiskCategory {
        self.event.category
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.event.timestamp
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.event.location
    }
}
