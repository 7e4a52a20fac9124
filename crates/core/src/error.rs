use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Unknown risk category: {0}")]
    UnknownCategory(String),

    #[error("Confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("Insufficient history: need at least {required} points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Insufficient data: need at least {required} items, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl From<std::io::Error> for RiskError {
    fn from(e: std::io::Error) -> Self {
        RiskError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for RiskError {
    fn from(e: serde_json::Error) -> Self {
        RiskError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
