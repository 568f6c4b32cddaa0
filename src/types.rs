//! Common types used throughout the rating engine

use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use skillratings::weng_lin::WengLinRating;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for queues (game modes)
pub type QueueId = String;

/// Team label as it appears in match data
pub type TeamId = i64;

/// A player reference: stable id plus the name it was seen with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A competitive queue. Every queue is its own rating namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
}

impl Queue {
    pub fn new(id: impl Into<QueueId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Gaussian belief about a player's latent skill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillBelief {
    pub mu: f64,
    pub sigma: f64,
}

impl SkillBelief {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    /// Cautious skill estimate: `mu - k * sigma`
    pub fn conservative(&self, k: f64) -> f64 {
        self.mu - k * self.sigma
    }
}

impl Default for SkillBelief {
    fn default() -> Self {
        Self {
            mu: 25.0,
            sigma: 25.0 / 3.0,
        }
    }
}

impl From<WengLinRating> for SkillBelief {
    fn from(rating: WengLinRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillBelief> for WengLinRating {
    fn from(belief: SkillBelief) -> Self {
        Self {
            rating: belief.mu,
            uncertainty: belief.sigma,
        }
    }
}

impl From<TrueSkillRating> for SkillBelief {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillBelief> for TrueSkillRating {
    fn from(belief: SkillBelief) -> Self {
        Self {
            rating: belief.mu,
            uncertainty: belief.sigma,
        }
    }
}

/// Key of the rating namespace: one belief per (queue, player)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatingKey {
    pub queue: QueueId,
    pub player: PlayerId,
}

impl RatingKey {
    pub fn new(queue: impl Into<QueueId>, player: impl Into<PlayerId>) -> Self {
        Self {
            queue: queue.into(),
            player: player.into(),
        }
    }
}

/// Rating change information for a player after one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub old_belief: SkillBelief,
    pub new_belief: SkillBelief,
    pub won: bool,
}

impl RatingChange {
    pub fn mu_delta(&self) -> f64 {
        self.new_belief.mu - self.old_belief.mu
    }
}
