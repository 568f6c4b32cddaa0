//! Two-team TrueSkill update
//!
//! Each team's performance is the sum of its members' skills plus per-player
//! noise `beta`. Observing that the winners out-performed the losers
//! truncates the distribution of the performance difference; the resulting
//! mean shift and variance reduction are shared out to players in proportion
//! to their own (drift-inflated) variance.

use crate::config::RatingConfig;
use crate::rating::calculator::{
    ensure_teams_present, floored_sigma, inflate, RatingCalculator, TeamUpdate,
};
use crate::rating::gaussian::{v_win, w_win};
use crate::types::SkillBelief;

/// TrueSkill rating calculator for exactly two teams, no draws
#[derive(Debug, Clone)]
pub struct TrueSkillCalculator {
    config: RatingConfig,
}

impl TrueSkillCalculator {
    /// Create a new TrueSkill calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl RatingCalculator for TrueSkillCalculator {
    fn name(&self) -> &'static str {
        "trueskill"
    }

    fn win_probability(&self, team_a: &[SkillBelief], team_b: &[SkillBelief]) -> f64 {
        let tau = self.config.tau;
        let players = (team_a.len() + team_b.len()) as f64;
        let variance: f64 = team_a
            .iter()
            .chain(team_b)
            .map(|b| inflate(b, tau))
            .sum::<f64>()
            + players * self.config.beta * self.config.beta;
        let delta: f64 =
            team_a.iter().map(|b| b.mu).sum::<f64>() - team_b.iter().map(|b| b.mu).sum::<f64>();

        crate::rating::gaussian::cdf(delta / variance.sqrt())
    }

    fn rate_two_teams(
        &self,
        winners: &[SkillBelief],
        losers: &[SkillBelief],
    ) -> crate::error::Result<TeamUpdate> {
        ensure_teams_present(winners, losers)?;

        let tau = self.config.tau;
        let winner_variances: Vec<f64> = winners.iter().map(|b| inflate(b, tau)).collect();
        let loser_variances: Vec<f64> = losers.iter().map(|b| inflate(b, tau)).collect();

        let players = (winners.len() + losers.len()) as f64;
        let c_squared = winner_variances.iter().sum::<f64>()
            + loser_variances.iter().sum::<f64>()
            + players * self.config.beta * self.config.beta;
        let c = c_squared.sqrt();

        let winner_mu: f64 = winners.iter().map(|b| b.mu).sum();
        let loser_mu: f64 = losers.iter().map(|b| b.mu).sum();
        let t = (winner_mu - loser_mu) / c;
        let v = v_win(t);
        let w = w_win(t);

        let min_variance = self.config.min_variance;
        let update = |belief: &SkillBelief, variance: f64, sign: f64| {
            let mu = belief.mu + sign * (variance / c) * v;
            let posterior = variance * (1.0 - (variance / c_squared) * w);
            SkillBelief::new(mu, floored_sigma(posterior, min_variance))
        };

        Ok(TeamUpdate {
            winners: winners
                .iter()
                .zip(winner_variances)
                .map(|(b, var)| update(b, var, 1.0))
                .collect(),
            losers: losers
                .iter()
                .zip(loser_variances)
                .map(|(b, var)| update(b, var, -1.0))
                .collect(),
        })
    }

    fn initial_belief(&self) -> SkillBelief {
        self.config.default_belief()
    }

    fn config(&self) -> &RatingConfig {
        &self.config
    }
}
