//! Replay engine
//!
//! Recomputes every rating from scratch by walking the match history in
//! timestamp order. Each match is read, resolved and rated against the
//! store as it stood before the match; all of its writes land together
//! afterwards, so a failing match never leaves partial updates behind.

use crate::error::Result;
use crate::rating::{RatingCalculator, RatingSnapshot, RatingStore};
use crate::record::{MatchRecord, Participant};
use crate::resolver::TeamOutcomeResolver;
use crate::types::{PlayerId, RatingChange, RatingKey};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// What to do with a match that cannot be rated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the replay and return the error
    #[default]
    Halt,
    /// Leave the store untouched for that match and carry on
    Skip,
}

/// Per (queue, player) bookkeeping gathered during a replay
///
/// Nothing here feeds back into ratings; it backs the leaderboard filters
/// and report columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerActivity {
    /// Most recent display name seen for the player
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    /// Epoch millis of the latest game played (completion time when known)
    pub last_played: i64,
    /// Epoch millis of every game played, in replay order
    pub played: Vec<i64>,
    /// Pick positions summed over games the player did not captain
    pub pick_order_total: u64,
    pub pick_order_count: u32,
    /// Source ids that were folded into this player
    pub source_ids: BTreeSet<PlayerId>,
}

impl PlayerActivity {
    fn record(&mut self, participant: &Participant, won: bool, played_at: i64) {
        self.name = participant.player.name.clone();
        self.games_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.last_played = if self.played.is_empty() {
            played_at
        } else {
            self.last_played.max(played_at)
        };
        self.played.push(played_at);

        // Unpicked non-captains count as position 0
        if !participant.captain {
            self.pick_order_total += u64::from(participant.pick_order.unwrap_or(0));
            self.pick_order_count += 1;
        }
        self.source_ids.insert(participant.source_id.clone());
    }

    /// Mean pick position as a non-captain (0 when never picked)
    pub fn avg_pick_order(&self) -> f64 {
        if self.pick_order_count == 0 {
            0.0
        } else {
            self.pick_order_total as f64 / f64::from(self.pick_order_count)
        }
    }

    /// Games played at or after `since` (epoch millis)
    pub fn games_since(&self, since: i64) -> u32 {
        self.played.iter().filter(|&&t| t >= since).count() as u32
    }
}

/// A match the engine left out under `FailurePolicy::Skip`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMatch {
    /// Position in the input sequence
    pub position: usize,
    pub timestamp: i64,
    pub reason: String,
}

/// Everything a replay produces
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub store: RatingStore,
    pub activity: BTreeMap<RatingKey, PlayerActivity>,
    pub matches_applied: usize,
    pub skipped: Vec<SkippedMatch>,
    /// Latest play time (epoch millis) among applied matches
    pub latest_played: Option<i64>,
}

impl ReplayOutcome {
    pub fn snapshot(&self) -> RatingSnapshot {
        self.store.snapshot()
    }

    pub fn activity(&self, player: &str, queue: &str) -> Option<&PlayerActivity> {
        self.activity.get(&RatingKey::new(queue, player))
    }
}

/// Replays match histories through a rating calculator
pub struct ReplayEngine {
    calculator: Box<dyn RatingCalculator>,
    resolver: TeamOutcomeResolver,
    policy: FailurePolicy,
}

impl ReplayEngine {
    /// Create an engine that halts on the first failing match
    pub fn new(calculator: Box<dyn RatingCalculator>) -> Self {
        Self {
            calculator,
            resolver: TeamOutcomeResolver::new(),
            policy: FailurePolicy::Halt,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Recompute all ratings from an empty store
    pub fn replay(&self, matches: &[MatchRecord]) -> Result<ReplayOutcome> {
        // Stable: equal timestamps keep their input order
        let mut order: Vec<usize> = (0..matches.len()).collect();
        order.sort_by_key(|&i| matches[i].timestamp);

        let mut outcome = ReplayOutcome {
            store: RatingStore::new(self.calculator.initial_belief()),
            activity: BTreeMap::new(),
            matches_applied: 0,
            skipped: Vec::new(),
            latest_played: None,
        };

        for position in order {
            let record = &matches[position];
            match self.rate_match(record, &outcome.store) {
                Ok(changes) => {
                    self.commit(record, &changes, &mut outcome);
                    outcome.matches_applied += 1;
                }
                Err(e) => match self.policy {
                    FailurePolicy::Halt => {
                        return Err(e).with_context(|| {
                            format!(
                                "Replay halted at match #{} (timestamp {})",
                                position, record.timestamp
                            )
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!(
                            "Skipping match #{} (timestamp {}): {}",
                            position, record.timestamp, e
                        );
                        outcome.skipped.push(SkippedMatch {
                            position,
                            timestamp: record.timestamp,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            "Replayed {} matches with {} ({} skipped, {} ratings)",
            outcome.matches_applied,
            self.calculator.name(),
            outcome.skipped.len(),
            outcome.store.len()
        );

        Ok(outcome)
    }

    /// Compute the rating changes of one match without touching the store
    pub fn rate_match(&self, record: &MatchRecord, store: &RatingStore) -> Result<Vec<RatingChange>> {
        let resolved = self.resolver.resolve(record, store)?;
        let (winners, losers) = resolved.ranked();

        let (ahead, behind) = (winners.aggregate(), losers.aggregate());
        debug!(
            "[{}] match at {}: team {} (mu {:.2}, var {:.2}) beat team {} (mu {:.2}, var {:.2}), prior {:.3}",
            record.queue.id,
            record.timestamp,
            winners.team,
            ahead.mu,
            ahead.variance,
            losers.team,
            behind.mu,
            behind.variance,
            self.calculator
                .win_probability(&winners.beliefs, &losers.beliefs)
        );

        let update = self
            .calculator
            .rate_two_teams(&winners.beliefs, &losers.beliefs)?;

        let mut changes = Vec::with_capacity(winners.players.len() + losers.players.len());
        for (roster, posteriors, won) in [
            (winners, &update.winners, true),
            (losers, &update.losers, false),
        ] {
            for ((player_id, old), new) in roster.players.iter().zip(&roster.beliefs).zip(posteriors)
            {
                changes.push(RatingChange {
                    player_id: player_id.clone(),
                    old_belief: *old,
                    new_belief: *new,
                    won,
                });
            }
        }

        Ok(changes)
    }

    fn commit(&self, record: &MatchRecord, changes: &[RatingChange], outcome: &mut ReplayOutcome) {
        let queue = record.queue.id.as_str();

        for change in changes {
            debug!(
                "[{}] {}: mu {:.3} -> {:.3}, sigma {:.3} -> {:.3}",
                queue,
                change.player_id,
                change.old_belief.mu,
                change.new_belief.mu,
                change.old_belief.sigma,
                change.new_belief.sigma
            );
            outcome
                .store
                .put(&change.player_id, queue, change.new_belief);
        }

        let played_at = record.played_at();
        for participant in &record.participants {
            let won = participant.team == record.winning_team;
            outcome
                .activity
                .entry(RatingKey::new(queue, participant.player.id.as_str()))
                .or_default()
                .record(participant, won, played_at);
        }
        outcome.latest_played = Some(
            outcome
                .latest_played
                .map_or(played_at, |latest| latest.max(played_at)),
        );
    }
}

impl std::fmt::Debug for ReplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayEngine")
            .field("calculator", &self.calculator.name())
            .field("policy", &self.policy)
            .finish()
    }
}
