//! Weng-Lin (OpenSkill) rating calculator
//!
//! Alternative to the TrueSkill update, backed by the skillratings crate.
//! Drift inflation and the variance floor are applied around the library
//! call so both calculators honour the same configuration.

use crate::config::RatingConfig;
use crate::rating::calculator::{
    ensure_teams_present, floored_sigma, inflate, RatingCalculator, TeamUpdate,
};
use crate::types::SkillBelief;
use skillratings::weng_lin::{
    expected_score_two_teams, weng_lin_two_teams, WengLinConfig, WengLinRating,
};
use skillratings::Outcomes;

/// Tolerance handed to the library to keep uncertainty from collapsing
const UNCERTAINTY_TOLERANCE: f64 = 0.000_001;

/// Weng-Lin rating calculator implementation
#[derive(Debug, Clone)]
pub struct WengLinRatingCalculator {
    config: RatingConfig,
    weng_lin_config: WengLinConfig,
}

impl WengLinRatingCalculator {
    /// Create a new Weng-Lin rating calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        let weng_lin_config = WengLinConfig {
            beta: config.beta,
            uncertainty_tolerance: UNCERTAINTY_TOLERANCE,
        };

        Ok(Self {
            config,
            weng_lin_config,
        })
    }

    fn drifted(&self, team: &[SkillBelief]) -> Vec<WengLinRating> {
        team.iter()
            .map(|b| WengLinRating {
                rating: b.mu,
                uncertainty: inflate(b, self.config.tau).sqrt(),
            })
            .collect()
    }

    fn floored(&self, team: Vec<WengLinRating>) -> Vec<SkillBelief> {
        team.into_iter()
            .map(|rating| {
                let belief = SkillBelief::from(rating);
                SkillBelief::new(
                    belief.mu,
                    floored_sigma(belief.variance(), self.config.min_variance),
                )
            })
            .collect()
    }

}

impl RatingCalculator for WengLinRatingCalculator {
    fn name(&self) -> &'static str {
        "weng_lin"
    }

    fn win_probability(&self, team_a: &[SkillBelief], team_b: &[SkillBelief]) -> f64 {
        let (a, _b) = expected_score_two_teams(
            &self.drifted(team_a),
            &self.drifted(team_b),
            &self.weng_lin_config,
        );
        a
    }

    fn rate_two_teams(
        &self,
        winners: &[SkillBelief],
        losers: &[SkillBelief],
    ) -> crate::error::Result<TeamUpdate> {
        ensure_teams_present(winners, losers)?;

        let (new_winners, new_losers) = weng_lin_two_teams(
            &self.drifted(winners),
            &self.drifted(losers),
            &Outcomes::WIN,
            &self.weng_lin_config,
        );

        Ok(TeamUpdate {
            winners: self.floored(new_winners),
            losers: self.floored(new_losers),
        })
    }

    fn initial_belief(&self) -> SkillBelief {
        self.config.default_belief()
    }

    fn config(&self) -> &RatingConfig {
        &self.config
    }
}
