//! Test fixtures and builders for integration testing

#![allow(dead_code)]

use teamrank::config::RatingConfig;
use teamrank::record::{MatchRecord, Participant};
use teamrank::replay::ReplayEngine;
use teamrank::types::{Player, Queue, TeamId};

pub const QUEUE: &str = "ranked";

/// Builder for match records
pub struct MatchBuilder {
    record: MatchRecord,
}

impl MatchBuilder {
    pub fn new(timestamp: i64) -> Self {
        Self {
            record: MatchRecord {
                timestamp,
                completed_at: None,
                queue: Queue::new(QUEUE, "Ranked 5v5"),
                winning_team: 1,
                participants: Vec::new(),
            },
        }
    }

    pub fn queue(mut self, id: &str) -> Self {
        self.record.queue = Queue::new(id, format!("Queue {}", id));
        self
    }

    pub fn team(mut self, team: TeamId, players: &[&str]) -> Self {
        for id in players {
            self.record
                .participants
                .push(Participant::new(Player::new(*id, id.to_uppercase()), team));
        }
        self
    }

    pub fn winner(mut self, team: TeamId) -> Self {
        self.record.winning_team = team;
        self
    }

    pub fn build(self) -> MatchRecord {
        self.record
    }
}

/// 1-v-1 record where `winner` beats `loser`
pub fn duel(timestamp: i64, winner: &str, loser: &str) -> MatchRecord {
    MatchBuilder::new(timestamp)
        .team(1, &[winner])
        .team(2, &[loser])
        .winner(1)
        .build()
}

pub fn trueskill_engine() -> ReplayEngine {
    ReplayEngine::new(
        RatingConfig::default()
            .build_calculator()
            .expect("default config is valid"),
    )
}

/// Small mixed history over two queues
pub fn sample_history() -> Vec<MatchRecord> {
    vec![
        MatchBuilder::new(1_000)
            .team(1, &["a", "b", "c"])
            .team(2, &["d", "e", "f"])
            .winner(1)
            .build(),
        MatchBuilder::new(2_000)
            .team(1, &["a", "d", "e"])
            .team(2, &["b", "c", "f"])
            .winner(2)
            .build(),
        MatchBuilder::new(3_000)
            .queue("casual")
            .team(1, &["a", "f"])
            .team(2, &["b", "e"])
            .winner(2)
            .build(),
        MatchBuilder::new(4_000)
            .team(1, &["a", "f", "c"])
            .team(2, &["b", "d", "e"])
            .winner(1)
            .build(),
        duel(5_000, "c", "a"),
    ]
}
