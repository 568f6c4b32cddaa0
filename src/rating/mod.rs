//! Skill belief updates and the rating store
//!
//! The default update is a first-principles two-team TrueSkill; a Weng-Lin
//! (OpenSkill) update from the skillratings crate is available behind the
//! same `RatingCalculator` trait.

pub mod calculator;
pub mod gaussian;
pub mod storage;
pub mod trueskill;
pub mod weng_lin;

// Re-export commonly used types
pub use calculator::{RatingCalculator, TeamUpdate};
pub use storage::{RatingSnapshot, RatingStore};
pub use trueskill::TrueSkillCalculator;
pub use weng_lin::WengLinRatingCalculator;
