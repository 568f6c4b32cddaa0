//! teamrank - team match history to per-queue skill ratings
//!
//! This crate replays team-vs-team match results through a two-team
//! TrueSkill update, keeping an independent Gaussian skill belief per
//! player and queue, and ranks players by a conservative score.

pub mod config;
pub mod error;
pub mod ingest;
pub mod leaderboard;
pub mod rating;
pub mod record;
pub mod replay;
pub mod report;
pub mod resolver;
pub mod types;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use leaderboard::{LeaderboardBuilder, RankingEntry};
pub use rating::{RatingCalculator, RatingSnapshot, RatingStore};
pub use record::{MatchRecord, Participant};
pub use replay::{FailurePolicy, ReplayEngine, ReplayOutcome};
pub use resolver::TeamOutcomeResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
