//! Leaderboard construction
//!
//! Players are ranked by the conservative score `mu - k * sigma`, then by
//! `mu`, then by player id, so the order is total and reproducible even when
//! many players still hold the default belief.

use crate::rating::RatingSnapshot;
use crate::replay::{PlayerActivity, ReplayOutcome};
use crate::types::{PlayerId, QueueId, RatingKey, SkillBelief};
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One ranked player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based position
    pub rank: usize,
    pub player_id: PlayerId,
    pub queue_id: QueueId,
    pub mu: f64,
    pub sigma: f64,
    pub conservative_score: f64,
}

/// A ranking entry joined with the player's activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub entry: RankingEntry,
    pub activity: PlayerActivity,
    /// Games inside the recent window (all games when no window is set)
    pub recent_games: u32,
}

/// Filter thresholds a set of standings was built with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsFilters {
    pub min_games: u32,
    /// Recent window in days (0 disables both recent filters)
    pub last_days: u32,
    pub min_recent_games: u32,
    pub top: usize,
}

/// Filtered leaderboard with counts of what each filter removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub queue_id: QueueId,
    pub rows: Vec<Standing>,
    pub filters: StandingsFilters,
    /// Reference time of the recent window (epoch millis)
    pub as_of: Option<i64>,
    pub filtered_by_min_games: usize,
    pub filtered_by_last_days: usize,
    pub filtered_by_recent_games: usize,
    pub cutoff: usize,
}

/// Builds rankings from a rating snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardBuilder {
    conservative_k: f64,
    filters: StandingsFilters,
    as_of: Option<i64>,
}

/// Keep rows matching `keep`; returns how many were dropped
fn retain_counting(rows: &mut Vec<Standing>, keep: impl Fn(&Standing) -> bool) -> usize {
    let before = rows.len();
    rows.retain(|row| keep(row));
    before - rows.len()
}

/// First instant (epoch millis, UTC) of the calendar day `days` before `as_of`
pub fn window_start(as_of: i64, days: u32) -> i64 {
    DateTime::<Utc>::from_timestamp_millis(as_of)
        .and_then(|dt| dt.date_naive().checked_sub_days(Days::new(u64::from(days))))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc().timestamp_millis())
        .unwrap_or(i64::MIN)
}

impl Default for LeaderboardBuilder {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl LeaderboardBuilder {
    pub fn new(conservative_k: f64) -> Self {
        Self {
            conservative_k,
            filters: StandingsFilters::default(),
            as_of: None,
        }
    }

    /// Drop players with fewer games than this from standings
    pub fn with_min_games(mut self, min_games: u32) -> Self {
        self.filters.min_games = min_games;
        self
    }

    /// Keep only the first `top` standings (0 keeps everyone)
    pub fn with_top(mut self, top: usize) -> Self {
        self.filters.top = top;
        self
    }

    /// Require a game in the last `last_days` days, and at least
    /// `min_recent_games` of them (0 skips that check)
    pub fn with_recent(mut self, last_days: u32, min_recent_games: u32) -> Self {
        self.filters.last_days = last_days;
        self.filters.min_recent_games = min_recent_games;
        self
    }

    /// Fix the end of the recent window instead of using the latest game
    pub fn with_as_of(mut self, as_of: Option<i64>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn conservative_k(&self) -> f64 {
        self.conservative_k
    }

    /// Rank every player of `queue` in the snapshot
    pub fn build(&self, snapshot: &RatingSnapshot, queue: &str) -> Vec<RankingEntry> {
        let mut scored: Vec<(&PlayerId, SkillBelief, f64)> = snapshot
            .queue(queue)
            .map(|(player, belief)| (player, *belief, belief.conservative(self.conservative_k)))
            .collect();

        scored.sort_by(|a, b| Self::compare(a.2, &a.1, a.0, b.2, &b.1, b.0));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (player, belief, score))| RankingEntry {
                rank: i + 1,
                player_id: player.clone(),
                queue_id: queue.to_string(),
                mu: belief.mu,
                sigma: belief.sigma,
                conservative_score: score,
            })
            .collect()
    }

    /// Rank `queue`, join activity and apply the filters in order: minimum
    /// games, last played inside the recent window, games inside the window,
    /// then the top cutoff
    ///
    /// The window ends at the builder's `as_of`, else at the latest game of
    /// the replay, so the same history always gives the same standings.
    pub fn build_standings(&self, outcome: &ReplayOutcome, queue: &str) -> Standings {
        let filters = self.filters;
        let as_of = self.as_of.or(outcome.latest_played);
        let since = match as_of {
            Some(as_of) if filters.last_days > 0 => Some(window_start(as_of, filters.last_days)),
            _ => None,
        };

        let mut rows: Vec<Standing> = self
            .build(&outcome.snapshot(), queue)
            .into_iter()
            .filter_map(|entry| {
                let activity = outcome
                    .activity
                    .get(&RatingKey::new(queue, entry.player_id.as_str()))?;
                let recent_games = since.map_or(activity.games_played, |s| activity.games_since(s));
                Some(Standing {
                    entry,
                    activity: activity.clone(),
                    recent_games,
                })
            })
            .collect();

        let filtered_by_min_games =
            retain_counting(&mut rows, |row| row.activity.games_played >= filters.min_games);
        let (filtered_by_last_days, filtered_by_recent_games) = match since {
            Some(since) => {
                let stale = retain_counting(&mut rows, |row| row.activity.last_played >= since);
                let sparse = if filters.min_recent_games > 0 {
                    retain_counting(&mut rows, |row| row.recent_games >= filters.min_recent_games)
                } else {
                    0
                };
                (stale, sparse)
            }
            None => (0, 0),
        };

        let cutoff = if filters.top > 0 {
            rows.len().saturating_sub(filters.top)
        } else {
            0
        };
        if filters.top > 0 {
            rows.truncate(filters.top);
        }
        for (i, row) in rows.iter_mut().enumerate() {
            row.entry.rank = i + 1;
        }

        Standings {
            queue_id: queue.to_string(),
            rows,
            filters,
            as_of,
            filtered_by_min_games,
            filtered_by_last_days,
            filtered_by_recent_games,
            cutoff,
        }
    }

    fn compare(
        score_a: f64,
        a: &SkillBelief,
        id_a: &str,
        score_b: f64,
        b: &SkillBelief,
        id_b: &str,
    ) -> Ordering {
        score_b
            .total_cmp(&score_a)
            .then_with(|| b.mu.total_cmp(&a.mu))
            .then_with(|| id_a.cmp(id_b))
    }
}
