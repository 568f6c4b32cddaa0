//! Command line entry point for teamrank
//!
//! Loads a JSON match history, replays it into per-queue ratings and prints
//! a leaderboard for every queue (or the one requested).

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use teamrank::config::AppConfig;
use teamrank::ingest::{self, AliasTable};
use teamrank::leaderboard::LeaderboardBuilder;
use teamrank::replay::{FailurePolicy, ReplayEngine};
use teamrank::report;
use tracing::{debug, info};

/// Team match history to TrueSkill leaderboards
#[derive(Parser)]
#[command(
    name = "teamrank",
    version,
    about = "Replay team match history into per-queue skill ratings and print leaderboards"
)]
struct Args {
    /// JSON file containing the match history
    #[arg(value_name = "GAMES")]
    games: PathBuf,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Only print the leaderboard of this queue id
    #[arg(short, long, value_name = "QUEUE")]
    queue: Option<String>,

    /// Minimum games required to appear on the leaderboard
    #[arg(long, value_name = "N")]
    min_games: Option<u32>,

    /// Show only the top N players (0 for all)
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Require a game within the last N days (0 disables)
    #[arg(long, value_name = "DAYS")]
    last_days: Option<u32>,

    /// Games required within the last-days window
    #[arg(long, value_name = "N")]
    min_recent_games: Option<u32>,

    /// End of the last-days window (defaults to the latest game)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_as_of)]
    as_of: Option<i64>,

    /// Add the source ids column to the report
    #[arg(short, long)]
    verbose: bool,

    /// Also write the leaderboard as CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Drop tied games instead of failing on them
    #[arg(long)]
    discard_ties: bool,

    /// Skip invalid games instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with per-match logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without replaying")]
    dry_run: bool,
}

/// Parse a calendar date into epoch millis at midnight UTC
fn parse_as_of(value: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {}", value))?;
    date.and_hms_opt(0, 0, 0)
        .map(|start| start.and_utc().timestamp_millis())
        .ok_or_else(|| anyhow!("Invalid date: {}", value))
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file, environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::from_file(path)?;
            config.apply_env()?;
            config
        }
        None => AppConfig::from_env()?,
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.logging.log_level = log_level.clone();
    }
    if args.debug {
        config.logging.log_level = "debug".to_string();
    }
    if let Some(min_games) = args.min_games {
        config.leaderboard.min_games = min_games;
    }
    if let Some(top) = args.top {
        config.leaderboard.top = top;
    }
    if let Some(last_days) = args.last_days {
        config.leaderboard.last_days = last_days;
    }
    if let Some(min_recent_games) = args.min_recent_games {
        config.leaderboard.min_recent_games = min_recent_games;
    }
    if args.verbose {
        config.report.verbose = true;
    }
    if args.discard_ties {
        config.replay.discard_ties = true;
    }
    if args.skip_invalid {
        config.replay.failure_policy = FailurePolicy::Skip;
    }

    teamrank::config::validate_config(&config)?;
    Ok(config)
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let json = std::fs::read_to_string(&args.games)
        .with_context(|| format!("Failed to read games file {}", args.games.display()))?;
    let raw = ingest::parse_matches(&json)?;

    let aliases = AliasTable::new(&config.aliases);
    let skip_invalid = config.replay.failure_policy == FailurePolicy::Skip;
    let history = ingest::load_history(&raw, &aliases, config.replay.discard_ties, skip_invalid)?;

    let engine = ReplayEngine::new(config.rating.build_calculator()?)
        .with_policy(config.replay.failure_policy);
    let outcome = engine.replay(&history.records)?;

    let builder = LeaderboardBuilder::new(config.leaderboard.conservative_k)
        .with_min_games(config.leaderboard.min_games)
        .with_top(config.leaderboard.top)
        .with_recent(
            config.leaderboard.last_days,
            config.leaderboard.min_recent_games,
        )
        .with_as_of(args.as_of);

    let queues = match &args.queue {
        Some(queue) => vec![queue.clone()],
        None => outcome.snapshot().queues(),
    };
    if queues.is_empty() {
        info!("No rated games found in {}", args.games.display());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut csv = match &args.csv {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create CSV file {}", path.display())
        })?)),
        None => None,
    };

    for queue_id in &queues {
        let standings = builder.build_standings(&outcome, queue_id);
        let title = history
            .records
            .iter()
            .find(|r| &r.queue.id == queue_id)
            .map(|r| r.queue.to_string())
            .unwrap_or_else(|| queue_id.clone());
        debug!("Rendering {} standings for {}", standings.rows.len(), title);

        report::write_table(&mut out, &title, &standings, config.report.verbose)?;
        writeln!(out)?;
        if let Some(csv) = csv.as_mut() {
            report::write_csv(csv, &standings, config.report.verbose)?;
        }
    }

    writeln!(out, "Games used: {}", outcome.matches_applied)?;
    writeln!(out, "Ties discarded: {}", history.ties_discarded)?;
    if !outcome.skipped.is_empty() {
        writeln!(out, "Games skipped: {}", outcome.skipped.len())?;
    }
    if !aliases.is_empty() {
        let primaries: Vec<&str> = config.aliases.keys().map(String::as_str).collect();
        writeln!(out, "Aliased player/s: {}", primaries.join(", "))?;
    }

    if let Some(mut csv) = csv {
        csv.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.logging.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "teamrank {} using {} (mu0={}, sigma0={:.3}, beta={:.3}, tau={:.4})",
        teamrank::VERSION,
        config.rating.build_calculator()?.name(),
        config.rating.default_mu,
        config.rating.default_sigma,
        config.rating.beta,
        config.rating.tau
    );

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    run(&args, &config)
}
