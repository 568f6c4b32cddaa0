//! Match history ingestion
//!
//! Parses the JSON game export, folds alias ids into their primary id and
//! turns each game into a validated `MatchRecord`. Everything here runs
//! before the replay engine sees a single record.
//!
//! The export is read as an array of untyped JSON values and each game is
//! decoded on its own, so one mistyped game falls under the invalid-game
//! policy instead of failing the whole file.

use crate::error::{RatingError, Result};
use crate::record::{MatchRecord, Participant, TIE_MARKER};
use crate::types::{Player, PlayerId, Queue};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Identifier that may arrive as a JSON number or string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    pub id: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQueue {
    pub id: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipant {
    pub user: Option<RawUser>,
    pub team: Option<i64>,
    #[serde(default)]
    pub captain: Option<Value>,
    #[serde(default)]
    pub pick_order: Option<Value>,
}

/// One game exactly as exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub completion_timestamp: Option<i64>,
    pub queue: Option<RawQueue>,
    pub winning_team: Option<i64>,
    #[serde(default)]
    pub players: Vec<RawParticipant>,
}

/// Maps alias player ids onto a primary id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    primary_of: HashMap<PlayerId, PlayerId>,
}

impl AliasTable {
    /// Build from `primary id -> [alias ids]`
    pub fn new(aliases: &BTreeMap<PlayerId, Vec<PlayerId>>) -> Self {
        let mut primary_of = HashMap::new();
        for (primary, secondary) in aliases {
            for alias in secondary {
                if let Some(previous) = primary_of.insert(alias.clone(), primary.clone()) {
                    warn!(
                        "Alias {} listed under both {} and {}; using {}",
                        alias, previous, primary, primary
                    );
                }
            }
        }
        Self { primary_of }
    }

    /// Primary id for `id`, or `id` itself when it is not an alias
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.primary_of.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn is_empty(&self) -> bool {
        self.primary_of.is_empty()
    }
}

/// Result of loading a full history
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<MatchRecord>,
    pub ties_discarded: usize,
}

/// Read the JSON array of games without decoding the games themselves
pub fn parse_matches(json: &str) -> Result<Vec<Value>> {
    let matches: Vec<Value> =
        serde_json::from_str(json).context("Failed to parse match history JSON")?;
    debug!("Parsed {} raw matches", matches.len());
    Ok(matches)
}

/// Decode one game of the export
pub fn decode(game: &Value) -> Result<RawMatch> {
    RawMatch::deserialize(game)
        .map_err(|e| RatingError::malformed(format!("undecodable game: {}", e)).into())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.as_str(), "1" | "true" | "True"),
        _ => false,
    }
}

/// Pick position when it is a non-negative integer (numeric strings accepted)
fn pick_position(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert one raw game into a validated record
pub fn normalize(raw: &RawMatch, aliases: &AliasTable) -> Result<MatchRecord> {
    let timestamp = raw
        .timestamp
        .ok_or_else(|| RatingError::malformed("missing timestamp"))?;

    let queue = raw
        .queue
        .as_ref()
        .ok_or_else(|| RatingError::malformed(format!("match at {} has no queue", timestamp)))?;
    let queue_id = queue
        .id
        .as_ref()
        .ok_or_else(|| RatingError::malformed(format!("match at {} has no queue id", timestamp)))?
        .to_string();
    let queue = Queue::new(
        queue_id.clone(),
        queue.name.clone().unwrap_or_else(|| queue_id.clone()),
    );

    let winning_team = raw.winning_team.ok_or_else(|| {
        RatingError::malformed(format!("match at {} has no winning team", timestamp))
    })?;

    let mut participants = Vec::with_capacity(raw.players.len());
    for entry in &raw.players {
        let user = entry.user.as_ref().ok_or_else(|| {
            RatingError::malformed(format!("participant without user at {}", timestamp))
        })?;
        let raw_id = user
            .id
            .as_ref()
            .ok_or_else(|| {
                RatingError::malformed(format!("participant without user id at {}", timestamp))
            })?
            .to_string();
        let team = entry.team.ok_or_else(|| {
            RatingError::malformed(format!("player {} has no team at {}", raw_id, timestamp))
        })?;

        let id = aliases.resolve(&raw_id).to_string();
        let name = user.name.clone().unwrap_or_else(|| id.clone());
        participants.push(Participant {
            player: Player::new(id, name),
            source_id: raw_id,
            team,
            captain: entry.captain.as_ref().map(is_truthy).unwrap_or(false),
            pick_order: entry.pick_order.as_ref().and_then(pick_position),
        });
    }

    let record = MatchRecord {
        timestamp,
        completed_at: raw.completion_timestamp,
        queue,
        winning_team,
        participants,
    };
    record.validate()?;
    Ok(record)
}

/// Decode and normalize a whole history
///
/// Ties are dropped when `discard_ties` is set and rejected otherwise. With
/// `skip_invalid` undecodable or malformed games are logged and left out;
/// without it the first bad game aborts the load.
pub fn load_history(
    raw: &[Value],
    aliases: &AliasTable,
    discard_ties: bool,
    skip_invalid: bool,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for (position, game) in raw.iter().enumerate() {
        let record = decode(game).and_then(|game| {
            if discard_ties && game.winning_team == Some(TIE_MARKER) {
                Ok(None)
            } else {
                normalize(&game, aliases).map(Some)
            }
        });

        match record {
            Ok(None) => report.ties_discarded += 1,
            Ok(Some(record)) => report.records.push(record),
            Err(e) if skip_invalid => {
                warn!("Skipping game #{}: {}", position, e);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Invalid game #{} in history", position));
            }
        }
    }

    info!(
        "Loaded {} of {} games ({} ties discarded)",
        report.records.len(),
        raw.len(),
        report.ties_discarded
    );
    Ok(report)
}
