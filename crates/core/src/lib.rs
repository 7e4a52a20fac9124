pub mod collaborator;
pub mod config;
pub mod error;
pub mod event;
pub mod snapshot;

pub use config::Config;
pub use error::*;
pub use event::*;
pub use snapshot::*;
