//! Filesystem rule loader.
//!
//! Scans the rules directory for YAML documents of every supported kind
//! via two-pass deserialization (RuleEnvelope -> RuleDocument) and compiles
//! the enabled ones into [`AnalyticsRules`].

mod compile;
mod core;
mod error;


pub use self::compile::AnalyticsRules;
pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
