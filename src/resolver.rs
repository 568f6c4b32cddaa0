//! Team outcome resolution
//!
//! Splits a match into its two rosters, looks up every participant's
//! current belief and decides which side won. Rosters are sorted by player
//! id so aggregate sums do not depend on the order players were listed in.

use crate::error::{RatingError, Result};
use crate::rating::RatingStore;
use crate::record::MatchRecord;
use crate::types::{PlayerId, SkillBelief, TeamId};

/// Aggregate belief of a team: summed means and summed variances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamAggregate {
    pub mu: f64,
    pub variance: f64,
}

/// One side of a match with the pre-match beliefs of its members
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRoster {
    pub team: TeamId,
    pub players: Vec<PlayerId>,
    pub beliefs: Vec<SkillBelief>,
}

impl TeamRoster {
    pub fn aggregate(&self) -> TeamAggregate {
        TeamAggregate {
            mu: self.beliefs.iter().map(|b| b.mu).sum(),
            variance: self.beliefs.iter().map(|b| b.variance()).sum(),
        }
    }
}

/// Which roster won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    TeamA,
    TeamB,
}

/// A match split into two rosters. Team A carries the lower team id.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub team_a: TeamRoster,
    pub team_b: TeamRoster,
    pub winner: Winner,
}

impl ResolvedMatch {
    /// (winning roster, losing roster)
    pub fn ranked(&self) -> (&TeamRoster, &TeamRoster) {
        match self.winner {
            Winner::TeamA => (&self.team_a, &self.team_b),
            Winner::TeamB => (&self.team_b, &self.team_a),
        }
    }
}

/// Resolves matches against the current rating store
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamOutcomeResolver;

impl TeamOutcomeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Partition `record` into two rosters with their current beliefs
    pub fn resolve(&self, record: &MatchRecord, store: &RatingStore) -> Result<ResolvedMatch> {
        let teams = record.teams();
        if teams.len() > 2 {
            return Err(RatingError::UnsupportedTopology { teams: teams.len() }.into());
        }

        let mut ids = teams.into_iter();
        let (team_a, team_b) = match (ids.next(), ids.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(RatingError::malformed(format!(
                    "match at {} does not have two teams",
                    record.timestamp
                ))
                .into())
            }
        };

        let winner = if record.winning_team == team_a {
            Winner::TeamA
        } else if record.winning_team == team_b {
            Winner::TeamB
        } else {
            return Err(RatingError::malformed(format!(
                "winning team {} did not play in match at {}",
                record.winning_team, record.timestamp
            ))
            .into());
        };

        let queue = record.queue.id.as_str();
        Ok(ResolvedMatch {
            team_a: Self::roster(record, team_a, queue, store),
            team_b: Self::roster(record, team_b, queue, store),
            winner,
        })
    }

    fn roster(record: &MatchRecord, team: TeamId, queue: &str, store: &RatingStore) -> TeamRoster {
        let mut players: Vec<PlayerId> = record
            .participants
            .iter()
            .filter(|p| p.team == team)
            .map(|p| p.player.id.clone())
            .collect();
        players.sort();

        let beliefs = players.iter().map(|id| store.get(id, queue)).collect();

        TeamRoster {
            team,
            players,
            beliefs,
        }
    }
}
