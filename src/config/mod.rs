//! Configuration management for teamrank
//!
//! Settings come from an optional TOML file, then environment variables,
//! then command line flags, and are validated once all layers are applied.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, LeaderboardSettings, LoggingSettings, ReplaySettings,
    ReportSettings,
};
pub use rating::{RatingAlgorithm, RatingConfig};
