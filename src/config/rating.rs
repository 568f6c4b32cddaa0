//! Rating system configuration

use crate::error::{RatingError, Result};
use crate::rating::{RatingCalculator, TrueSkillCalculator, WengLinRatingCalculator};
use crate::types::SkillBelief;
use serde::{Deserialize, Serialize};

/// Which two-team update backs a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RatingAlgorithm {
    #[default]
    #[serde(rename = "trueskill", alias = "true_skill")]
    TrueSkill,
    WengLin,
}

impl std::str::FromStr for RatingAlgorithm {
    type Err = RatingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trueskill" | "true_skill" => Ok(Self::TrueSkill),
            "weng_lin" | "wenglin" | "openskill" => Ok(Self::WengLin),
            other => Err(RatingError::ConfigurationError {
                message: format!("Unknown rating algorithm: {}", other),
            }),
        }
    }
}

/// Constants shared by every update call of a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub algorithm: RatingAlgorithm,
    /// Mean of the belief assigned to unseen players
    pub default_mu: f64,
    /// Standard deviation of the belief assigned to unseen players
    pub default_sigma: f64,
    /// Per-player performance noise (standard deviation)
    pub beta: f64,
    /// Skill drift added to every participant before an update
    pub tau: f64,
    /// Lower bound on any posterior variance
    pub min_variance: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            algorithm: RatingAlgorithm::TrueSkill,
            default_mu: 25.0,
            default_sigma: 25.0 / 3.0,
            beta: 25.0 / 6.0,
            tau: 25.0 / 300.0,
            min_variance: 1e-4,
        }
    }
}

impl RatingConfig {
    pub fn default_belief(&self) -> SkillBelief {
        SkillBelief::new(self.default_mu, self.default_sigma)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.default_mu.is_finite(), "Default mu must be finite"),
            (
                self.default_sigma.is_finite() && self.default_sigma > 0.0,
                "Default sigma must be positive",
            ),
            (
                self.beta.is_finite() && self.beta > 0.0,
                "Beta must be positive",
            ),
            (
                self.tau.is_finite() && self.tau >= 0.0,
                "Tau must be non-negative",
            ),
            (
                self.min_variance.is_finite() && self.min_variance > 0.0,
                "Minimum variance must be positive",
            ),
        ];

        for (ok, message) in checks {
            if !ok {
                return Err(RatingError::ConfigurationError {
                    message: message.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Build the calculator selected by `algorithm`
    pub fn build_calculator(&self) -> Result<Box<dyn RatingCalculator>> {
        Ok(match self.algorithm {
            RatingAlgorithm::TrueSkill => Box::new(TrueSkillCalculator::new(self.clone())?),
            RatingAlgorithm::WengLin => Box::new(WengLinRatingCalculator::new(self.clone())?),
        })
    }
}
