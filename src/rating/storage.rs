//! Rating store and snapshots
//!
//! The store maps (queue, player) to the latest skill belief. Unseen pairs
//! read as the configured default belief. The store is only ever mutated
//! through `put`, and ordered maps keep every snapshot deterministic.

use crate::types::{PlayerId, QueueId, RatingKey, SkillBelief};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current belief for every observed (queue, player) pair
#[derive(Debug, Clone, PartialEq)]
pub struct RatingStore {
    beliefs: BTreeMap<RatingKey, SkillBelief>,
    default_belief: SkillBelief,
}

impl RatingStore {
    /// Create an empty store handing out `default_belief` for unseen players
    pub fn new(default_belief: SkillBelief) -> Self {
        Self {
            beliefs: BTreeMap::new(),
            default_belief,
        }
    }

    /// Stored belief, or the default if the pair was never written
    pub fn get(&self, player: &str, queue: &str) -> SkillBelief {
        self.beliefs
            .get(&RatingKey::new(queue, player))
            .copied()
            .unwrap_or(self.default_belief)
    }

    /// Overwrite the belief for a pair
    pub fn put(&mut self, player: &str, queue: &str, belief: SkillBelief) {
        self.beliefs.insert(RatingKey::new(queue, player), belief);
    }

    pub fn contains(&self, player: &str, queue: &str) -> bool {
        self.beliefs.contains_key(&RatingKey::new(queue, player))
    }

    pub fn default_belief(&self) -> SkillBelief {
        self.default_belief
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Complete copy of the store for downstream consumers
    pub fn snapshot(&self) -> RatingSnapshot {
        RatingSnapshot {
            beliefs: self.beliefs.clone(),
        }
    }
}

/// Immutable, ordered copy of a rating store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    beliefs: BTreeMap<RatingKey, SkillBelief>,
}

impl RatingSnapshot {
    pub fn get(&self, player: &str, queue: &str) -> Option<SkillBelief> {
        self.beliefs.get(&RatingKey::new(queue, player)).copied()
    }

    /// All (key, belief) pairs ordered by queue, then player
    pub fn iter(&self) -> impl Iterator<Item = (&RatingKey, &SkillBelief)> {
        self.beliefs.iter()
    }

    /// Beliefs of one queue, ordered by player id
    pub fn queue(&self, queue: &str) -> impl Iterator<Item = (&PlayerId, &SkillBelief)> + '_ {
        let queue = queue.to_string();
        self.beliefs
            .iter()
            .filter(move |(key, _)| key.queue == queue)
            .map(|(key, belief)| (&key.player, belief))
    }

    /// Distinct queue ids present in the snapshot
    pub fn queues(&self) -> Vec<QueueId> {
        let mut queues: Vec<QueueId> = self.beliefs.keys().map(|k| k.queue.clone()).collect();
        queues.dedup();
        queues
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }
}
