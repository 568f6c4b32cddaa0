//! Normalized match records
//!
//! A `MatchRecord` is what the replay engine consumes. `validate` enforces
//! the record invariants: exactly two teams, each with at least one player,
//! a winner that is one of them, and no player listed twice.

use crate::error::{RatingError, Result};
use crate::types::{Player, PlayerId, Queue, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Team value the source data uses to mark a tie
pub const TIE_MARKER: TeamId = 0;

/// One player's entry in a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub player: Player,
    /// Id as it appeared in the source, before alias folding
    pub source_id: PlayerId,
    pub team: TeamId,
    /// Carried through from the source; never used for ratings
    pub captain: bool,
    /// Carried through from the source; never used for ratings
    pub pick_order: Option<u32>,
}

impl Participant {
    pub fn new(player: Player, team: TeamId) -> Self {
        Self {
            source_id: player.id.clone(),
            player,
            team,
            captain: false,
            pick_order: None,
        }
    }
}

/// A single validated game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Epoch milliseconds; the replay order key
    pub timestamp: i64,
    /// Epoch milliseconds the game finished, when the source has it
    #[serde(default)]
    pub completed_at: Option<i64>,
    pub queue: Queue,
    pub winning_team: TeamId,
    pub participants: Vec<Participant>,
}

impl MatchRecord {
    /// When the game counts as played: completion time, else start time
    pub fn played_at(&self) -> i64 {
        self.completed_at.unwrap_or(self.timestamp)
    }

    /// Distinct team values present, in ascending order
    pub fn teams(&self) -> BTreeSet<TeamId> {
        self.participants.iter().map(|p| p.team).collect()
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.queue.id.is_empty() {
            return Err(RatingError::malformed("queue id is empty").into());
        }

        if self.winning_team == TIE_MARKER {
            return Err(RatingError::DrawNotSupported {
                timestamp: self.timestamp,
            }
            .into());
        }

        let teams = self.teams();
        if teams.len() > 2 {
            return Err(RatingError::UnsupportedTopology { teams: teams.len() }.into());
        }
        if teams.len() < 2 {
            return Err(RatingError::malformed(format!(
                "match at {} has {} team(s), expected 2",
                self.timestamp,
                teams.len()
            ))
            .into());
        }
        if !teams.contains(&self.winning_team) {
            return Err(RatingError::malformed(format!(
                "winning team {} is not one of the teams {:?}",
                self.winning_team, teams
            ))
            .into());
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if participant.player.id.is_empty() {
                return Err(RatingError::malformed("participant with empty player id").into());
            }
            if !seen.insert(participant.player.id.as_str()) {
                return Err(RatingError::malformed(format!(
                    "player {} appears more than once",
                    participant.player.id
                ))
                .into());
            }
        }

        Ok(())
    }
}
