//! Rating calculator trait
//!
//! A calculator turns the pre-match beliefs of a winning and a losing team
//! into post-match beliefs. Implementations are pure: the same inputs always
//! give bit-identical outputs.

use crate::config::RatingConfig;
use crate::types::SkillBelief;
use serde::{Deserialize, Serialize};

/// Posterior beliefs for both sides of a match, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub winners: Vec<SkillBelief>,
    pub losers: Vec<SkillBelief>,
}

/// Trait for two-team rating updates
pub trait RatingCalculator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Update beliefs after `winners` beat `losers`
    ///
    /// # Arguments
    /// * `winners` - Pre-match beliefs of the winning team
    /// * `losers` - Pre-match beliefs of the losing team
    ///
    /// # Returns
    /// Posterior beliefs, one per input belief and in the same order
    fn rate_two_teams(
        &self,
        winners: &[SkillBelief],
        losers: &[SkillBelief],
    ) -> crate::error::Result<TeamUpdate>;

    /// Prior probability that `team_a` beats `team_b`
    fn win_probability(&self, team_a: &[SkillBelief], team_b: &[SkillBelief]) -> f64;

    /// Belief for players never seen before
    fn initial_belief(&self) -> SkillBelief;

    /// Parameters the calculator was built with
    fn config(&self) -> &RatingConfig;
}

/// Shared input check: both teams need at least one player
pub(crate) fn ensure_teams_present(
    winners: &[SkillBelief],
    losers: &[SkillBelief],
) -> crate::error::Result<()> {
    if winners.is_empty() || losers.is_empty() {
        return Err(crate::error::RatingError::malformed(
            "Both teams need at least one player for a rating update",
        )
        .into());
    }
    Ok(())
}

/// Variance after adding skill drift
pub(crate) fn inflate(belief: &SkillBelief, tau: f64) -> f64 {
    belief.variance() + tau * tau
}

/// Apply the variance floor and convert back to a standard deviation
pub(crate) fn floored_sigma(variance: f64, min_variance: f64) -> f64 {
    if variance.is_finite() && variance > min_variance {
        variance.sqrt()
    } else {
        min_variance.sqrt()
    }
}
