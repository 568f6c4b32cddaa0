//! End-to-end replay scenarios
//!
//! These tests drive the public API the way the CLI does: build records,
//! replay them and read the leaderboard.

mod fixtures;

use fixtures::{duel, sample_history, trueskill_engine, MatchBuilder, QUEUE};
use teamrank::config::{RatingAlgorithm, RatingConfig};
use teamrank::error::RatingError;
use teamrank::ingest::{self, AliasTable};
use teamrank::leaderboard::LeaderboardBuilder;
use teamrank::rating::RatingStore;
use teamrank::record::MatchRecord;
use teamrank::replay::{FailurePolicy, ReplayEngine};
use teamrank::resolver::TeamOutcomeResolver;
use teamrank::types::SkillBelief;

fn default_belief() -> SkillBelief {
    RatingConfig::default().default_belief()
}

#[test]
fn test_scenario_repeated_duel_wins() {
    let engine = trueskill_engine();
    let history = vec![duel(1_000, "x", "y"), duel(2_000, "x", "y")];

    let mut previous_x = default_belief();
    let mut previous_y = default_belief();
    for played in 1..=history.len() {
        let outcome = engine.replay(&history[..played]).unwrap();
        let x = outcome.store.get("x", QUEUE);
        let y = outcome.store.get("y", QUEUE);

        assert!(x.mu > previous_x.mu, "x should gain after match {}", played);
        assert!(y.mu < previous_y.mu, "y should lose after match {}", played);
        previous_x = x;
        previous_y = y;
    }

    let k = 3.0;
    assert!(previous_x.conservative(k) > previous_y.conservative(k));

    let outcome = engine.replay(&history).unwrap();
    let board = LeaderboardBuilder::new(k).build(&outcome.snapshot(), QUEUE);
    assert_eq!(board[0].player_id, "x");
    assert_eq!(board[1].player_id, "y");
}

#[test]
fn test_scenario_five_vs_five_shares_by_uncertainty() {
    let engine = trueskill_engine();
    let team_one = ["p1", "p2", "p3", "p4", "p5"];
    let team_two = ["q1", "q2", "q3", "q4", "q5"];
    let record = MatchBuilder::new(1_000)
        .team(1, &team_one)
        .team(2, &team_two)
        .winner(1)
        .build();

    // Same mean, increasing uncertainty down each roster
    let mut store = RatingStore::new(default_belief());
    for (i, (a, b)) in team_one.iter().zip(&team_two).enumerate() {
        let sigma = 2.0 + i as f64;
        store.put(a, QUEUE, SkillBelief::new(25.0, sigma));
        store.put(b, QUEUE, SkillBelief::new(25.0, sigma));
    }

    let changes = engine.rate_match(&record, &store).unwrap();
    assert_eq!(changes.len(), 10);

    for roster in [&team_one, &team_two] {
        let deltas: Vec<f64> = roster
            .iter()
            .map(|id| {
                changes
                    .iter()
                    .find(|c| c.player_id == *id)
                    .unwrap()
                    .mu_delta()
            })
            .collect();

        if roster == &team_one {
            assert!(deltas.iter().all(|d| *d > 0.0));
        } else {
            assert!(deltas.iter().all(|d| *d < 0.0));
        }
        // Lower sigma, smaller move
        assert!(deltas.windows(2).all(|w| w[0].abs() < w[1].abs()));
    }

    // From scratch every winner rises and every loser falls
    let outcome = engine.replay(&[record]).unwrap();
    for id in team_one {
        assert!(outcome.store.get(id, QUEUE).mu > 25.0);
    }
    for id in team_two {
        assert!(outcome.store.get(id, QUEUE).mu < 25.0);
    }
}

#[test]
fn test_scenario_three_team_record_rejected() {
    let three_teams = MatchBuilder::new(2_000)
        .team(1, &["a"])
        .team(2, &["b"])
        .team(3, &["c"])
        .winner(1)
        .build();

    // Validation rejects it up front
    let err = three_teams.validate().unwrap_err();
    assert_eq!(
        err.downcast_ref::<RatingError>(),
        Some(&RatingError::UnsupportedTopology { teams: 3 })
    );

    // The resolver fails closed and the store is untouched
    let engine = trueskill_engine();
    let before = engine.replay(&[duel(1_000, "a", "b")]).unwrap();
    assert!(TeamOutcomeResolver::new()
        .resolve(&three_teams, &before.store)
        .is_err());

    // Under both policies no partial writes happen
    let history = vec![duel(1_000, "a", "b"), three_teams];
    assert!(engine.replay(&history).is_err());

    let skipping = trueskill_engine().with_policy(FailurePolicy::Skip);
    let after = skipping.replay(&history).unwrap();
    assert_eq!(after.snapshot(), before.snapshot());
    assert_eq!(after.skipped.len(), 1);
    assert!(!after.store.contains("c", QUEUE));
}

#[test]
fn test_scenario_first_appearance_gets_default() {
    let engine = trueskill_engine();
    let history = sample_history();
    let outcome = engine.replay(&history[..2]).unwrap();

    let newcomer_match = MatchBuilder::new(9_000)
        .team(1, &["a", "newcomer"])
        .team(2, &["b", "c"])
        .winner(2)
        .build();
    let changes = engine.rate_match(&newcomer_match, &outcome.store).unwrap();
    let newcomer = changes
        .iter()
        .find(|c| c.player_id == "newcomer")
        .unwrap();
    assert_eq!(newcomer.old_belief, SkillBelief::new(25.0, 25.0 / 3.0));

    // A player rated in one queue is still new in another
    assert!(outcome.store.contains("a", QUEUE));
    assert_eq!(outcome.store.get("a", "casual"), default_belief());
}

#[test]
fn test_replay_ignores_input_order() {
    let engine = trueskill_engine();
    let history = sample_history();
    let mut reversed = history.clone();
    reversed.reverse();

    let forward = engine.replay(&history).unwrap();
    let backward = engine.replay(&reversed).unwrap();
    assert_eq!(forward.snapshot(), backward.snapshot());

    let builder = LeaderboardBuilder::default();
    assert_eq!(
        builder.build(&forward.snapshot(), QUEUE),
        builder.build(&backward.snapshot(), QUEUE)
    );
}

#[test]
fn test_equal_timestamps_keep_input_order() {
    let engine = trueskill_engine();
    let first = duel(1_000, "a", "b");
    let second = duel(1_000, "b", "a");

    let ab = engine.replay(&[first.clone(), second.clone()]).unwrap();
    let ba = engine.replay(&[second.clone(), first.clone()]).unwrap();
    let stepwise = engine.replay(&[first, duel(1_001, "b", "a")]).unwrap();

    assert_eq!(ab.snapshot(), stepwise.snapshot());
    assert_ne!(ab.snapshot(), ba.snapshot());
}

#[test]
fn test_relabelled_teams_give_identical_ratings() {
    let engine = trueskill_engine();
    let original = MatchBuilder::new(1_000)
        .team(1, &["a", "b"])
        .team(2, &["c", "d"])
        .winner(1)
        .build();
    let relabelled = MatchBuilder::new(1_000)
        .team(2, &["a", "b"])
        .team(1, &["c", "d"])
        .winner(2)
        .build();

    let left = engine.replay(&[original]).unwrap();
    let right = engine.replay(&[relabelled]).unwrap();
    assert_eq!(left.snapshot(), right.snapshot());
}

#[test]
fn test_swapped_outcome_mirrors_updates() {
    let engine = trueskill_engine();
    let a_wins = engine.replay(&[duel(1_000, "a", "b")]).unwrap();
    let b_wins = engine.replay(&[duel(1_000, "b", "a")]).unwrap();

    let base = default_belief().mu;
    let a_gain = a_wins.store.get("a", QUEUE).mu - base;
    let a_loss = b_wins.store.get("a", QUEUE).mu - base;

    assert!(a_gain > 0.0);
    assert!((a_gain + a_loss).abs() < 1e-12);
    assert_eq!(
        a_wins.store.get("a", QUEUE).sigma,
        b_wins.store.get("a", QUEUE).sigma
    );
}

#[test]
fn test_queue_isolation() {
    let engine = trueskill_engine();
    let history = sample_history();
    let ranked_only: Vec<MatchRecord> = history
        .iter()
        .filter(|r| r.queue.id == QUEUE)
        .cloned()
        .collect();

    let full = engine.replay(&history).unwrap().snapshot();
    let isolated = engine.replay(&ranked_only).unwrap().snapshot();

    let ranked = |s: &teamrank::RatingSnapshot| -> Vec<(String, SkillBelief)> {
        s.queue(QUEUE).map(|(p, b)| (p.clone(), *b)).collect()
    };
    assert_eq!(ranked(&full), ranked(&isolated));
    assert!(full.queue("casual").count() > 0);
}

#[test]
fn test_sigma_shrinks_with_play() {
    let engine = trueskill_engine();
    let floor = RatingConfig::default().min_variance.sqrt();
    let history: Vec<MatchRecord> = (0..12)
        .map(|i| {
            if i % 3 == 0 {
                duel(i, "b", "a")
            } else {
                duel(i, "a", "b")
            }
        })
        .collect();

    let mut previous = default_belief().sigma;
    for played in 1..=history.len() {
        let sigma = engine
            .replay(&history[..played])
            .unwrap()
            .store
            .get("a", QUEUE)
            .sigma;
        assert!(sigma <= previous + 1e-9);
        assert!(sigma >= floor);
        previous = sigma;
    }
    assert!(previous < default_belief().sigma * 0.75);
}

#[test]
fn test_standings_apply_min_games_and_top() {
    let engine = trueskill_engine();
    let outcome = engine.replay(&sample_history()).unwrap();

    // In "ranked" only a and c reach four games
    let standings = LeaderboardBuilder::default()
        .with_min_games(4)
        .build_standings(&outcome, QUEUE);
    assert_eq!(standings.rows.len(), 2);
    assert_eq!(standings.filtered_by_min_games, 4);
    assert!(standings.rows.iter().all(|r| r.activity.games_played >= 4));
    let ranks: Vec<usize> = standings.rows.iter().map(|r| r.entry.rank).collect();
    assert_eq!(ranks, vec![1, 2]);

    let top = LeaderboardBuilder::default()
        .with_top(2)
        .build_standings(&outcome, QUEUE);
    assert_eq!(top.rows.len(), 2);
    assert_eq!(top.cutoff, 4);
    assert_eq!(top.filtered_by_min_games, 0);

    let full = LeaderboardBuilder::default().build(&outcome.snapshot(), QUEUE);
    assert_eq!(top.rows[0].entry, full[0]);
}

#[test]
fn test_leaderboard_is_byte_identical_across_calls() {
    let outcome = trueskill_engine().replay(&sample_history()).unwrap();
    let snapshot = outcome.snapshot();
    let builder = LeaderboardBuilder::default();

    let first = serde_json::to_vec(&builder.build(&snapshot, QUEUE)).unwrap();
    let second = serde_json::to_vec(&builder.build(&snapshot, QUEUE)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_weng_lin_backend_end_to_end() {
    let config = RatingConfig {
        algorithm: RatingAlgorithm::WengLin,
        ..RatingConfig::default()
    };
    let engine = ReplayEngine::new(config.build_calculator().unwrap());
    assert_eq!(engine.calculator().name(), "weng_lin");

    let outcome = engine
        .replay(&[duel(1_000, "x", "y"), duel(2_000, "x", "y")])
        .unwrap();
    let x = outcome.store.get("x", QUEUE);
    let y = outcome.store.get("y", QUEUE);
    assert!(x.mu > y.mu);
    assert!(x.sigma < config.default_sigma);
}

#[test]
fn test_json_history_to_leaderboard() {
    let json = r#"[
        {"timestamp": 2000, "queue": {"id": 1, "name": "Pugs"}, "winningTeam": 2,
         "completionTimestamp": 2500,
         "players": [
            {"user": {"id": 10, "name": "Ann"}, "team": 1, "captain": 1, "pickOrder": null},
            {"user": {"id": 11, "name": "Ben"}, "team": 1, "captain": 0, "pickOrder": 2},
            {"user": {"id": 12, "name": "Cat"}, "team": 2, "captain": 1, "pickOrder": null},
            {"user": {"id": 13, "name": "Dan"}, "team": 2, "captain": 0, "pickOrder": 1}
         ]},
        {"timestamp": 1000, "queue": {"id": 1, "name": "Pugs"}, "winningTeam": 0,
         "players": [
            {"user": {"id": 10, "name": "Ann"}, "team": 1},
            {"user": {"id": 12, "name": "Cat"}, "team": 2}
         ]}
    ]"#;

    let raw = ingest::parse_matches(json).unwrap();
    let history = ingest::load_history(&raw, &AliasTable::default(), true, false).unwrap();
    assert_eq!(history.records.len(), 1);
    assert_eq!(history.ties_discarded, 1);

    let outcome = trueskill_engine().replay(&history.records).unwrap();
    let board = LeaderboardBuilder::default().build(&outcome.snapshot(), "1");
    let order: Vec<&str> = board.iter().map(|e| e.player_id.as_str()).collect();

    // Winners share identical beliefs, so ids break the tie
    assert_eq!(order, vec!["12", "13", "10", "11"]);
    assert_eq!(outcome.activity("12", "1").unwrap().name, "Cat");
}

#[test]
fn test_mistyped_game_skipped_and_stale_players_filtered() {
    // 2024-01-27T00:00:00Z
    const START: i64 = 1_706_313_600_000;
    const DAY: i64 = 86_400_000;
    let json = format!(
        r#"[
        {{"timestamp": {first}, "queue": {{"id": 1, "name": "Pugs"}}, "winningTeam": 1,
         "players": [
            {{"user": {{"id": 10, "name": "Ann"}}, "team": 1}},
            {{"user": {{"id": 12, "name": "Cat"}}, "team": 2}}
         ]}},
        {{"timestamp": {second}, "queue": {{"id": 1, "name": "Pugs"}}, "winningTeam": 1,
         "players": [
            {{"user": {{"id": 10, "name": "Ann"}}, "team": "one"}},
            {{"user": {{"id": 13, "name": "Dan"}}, "team": 2}}
         ]}},
        {{"timestamp": {third}, "completionTimestamp": {completed},
         "queue": {{"id": 1, "name": "Pugs"}}, "winningTeam": 2,
         "players": [
            {{"user": {{"id": 13, "name": "Dan"}}, "team": 1, "pickOrder": -1}},
            {{"user": {{"id": 12, "name": "Cat"}}, "team": 2, "pickOrder": "1"}}
         ]}}
    ]"#,
        first = START + 3_600_000,
        second = START + 7_200_000,
        third = START + 40 * DAY,
        completed = START + 40 * DAY + 1_800_000,
    );

    let raw = ingest::parse_matches(&json).unwrap();
    assert!(ingest::load_history(&raw, &AliasTable::default(), false, false).is_err());

    let history = ingest::load_history(&raw, &AliasTable::default(), false, true).unwrap();
    assert_eq!(history.records.len(), 2);

    let outcome = trueskill_engine().replay(&history.records).unwrap();
    assert_eq!(outcome.latest_played, Some(START + 40 * DAY + 1_800_000));

    let standings = LeaderboardBuilder::default()
        .with_recent(30, 1)
        .build_standings(&outcome, "1");
    let mut kept: Vec<&str> = standings
        .rows
        .iter()
        .map(|row| row.entry.player_id.as_str())
        .collect();
    kept.sort();

    assert_eq!(kept, vec!["12", "13"]);
    assert_eq!(standings.filtered_by_last_days, 1);
    assert_eq!(standings.filtered_by_recent_games, 0);
    assert!(standings.rows.iter().all(|row| row.recent_games == 1));
}
