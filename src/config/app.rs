//! Main application configuration
//!
//! This module defines the top-level configuration for teamrank, including
//! TOML file loading, environment variable overrides and validation.

use crate::config::rating::{RatingAlgorithm, RatingConfig};
use crate::replay::FailurePolicy;
use crate::types::PlayerId;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingSettings,
    pub rating: RatingConfig,
    pub replay: ReplaySettings,
    pub leaderboard: LeaderboardSettings,
    pub report: ReportSettings,
    /// Primary player id -> alias ids folded into it
    pub aliases: BTreeMap<PlayerId, Vec<PlayerId>>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// How the match history is fed to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Drop tied games instead of rejecting them
    pub discard_ties: bool,
    /// Halt on, or skip, games that cannot be rated
    pub failure_policy: FailurePolicy,
}

/// Leaderboard presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// k in `mu - k * sigma`
    pub conservative_k: f64,
    /// Players with fewer games are left off the leaderboard
    pub min_games: u32,
    /// Show only the top N players (0 shows everyone)
    pub top: usize,
    /// Require a game within this many days of the latest game (0 disables)
    pub last_days: u32,
    /// Games required inside that window (0 disables)
    pub min_recent_games: u32,
}

/// Report output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Add the source ids column
    pub verbose: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            conservative_k: 3.0,
            min_games: 0,
            top: 0,
            last_days: 0,
            min_recent_games: 0,
        }
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(anyhow!("Invalid {} value: {}", name, value)),
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Override settings from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.log_level = level;
        }

        // Rating settings
        if let Some(algorithm) = lookup("RATING_ALGORITHM") {
            self.rating.algorithm = algorithm.parse::<RatingAlgorithm>()?;
        }
        if let Some(mu) = lookup("TS_DEFAULT_MU") {
            self.rating.default_mu = parse_value("TS_DEFAULT_MU", &mu)?;
        }
        if let Some(sigma) = lookup("TS_DEFAULT_SIGMA") {
            self.rating.default_sigma = parse_value("TS_DEFAULT_SIGMA", &sigma)?;
        }
        if let Some(beta) = lookup("TS_BETA") {
            self.rating.beta = parse_value("TS_BETA", &beta)?;
        }
        if let Some(tau) = lookup("TS_TAU") {
            self.rating.tau = parse_value("TS_TAU", &tau)?;
        }
        if let Some(min_variance) = lookup("TS_MIN_VARIANCE") {
            self.rating.min_variance = parse_value("TS_MIN_VARIANCE", &min_variance)?;
        }

        // Replay settings
        if let Some(discard) = lookup("DISCARD_TIES") {
            self.replay.discard_ties = parse_flag("DISCARD_TIES", &discard)?;
        }
        if let Some(skip) = lookup("SKIP_INVALID_MATCHES") {
            self.replay.failure_policy = if parse_flag("SKIP_INVALID_MATCHES", &skip)? {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Halt
            };
        }

        // Leaderboard settings
        if let Some(k) = lookup("CONSERVATIVE_K") {
            self.leaderboard.conservative_k = parse_value("CONSERVATIVE_K", &k)?;
        }
        if let Some(min_games) = lookup("MINIMUM_GAMES_REQUIRED") {
            self.leaderboard.min_games = parse_value("MINIMUM_GAMES_REQUIRED", &min_games)?;
        }
        if let Some(top) = lookup("TOP_X_CUTOFF") {
            self.leaderboard.top = parse_value("TOP_X_CUTOFF", &top)?;
        }
        if let Some(days) = lookup("LAST_DAYS_THRESHOLD") {
            self.leaderboard.last_days = parse_value("LAST_DAYS_THRESHOLD", &days)?;
        }
        if let Some(games) = lookup("MINIMUM_GAMES_LAST_DAYS") {
            self.leaderboard.min_recent_games = parse_value("MINIMUM_GAMES_LAST_DAYS", &games)?;
        }
        if let Some(verbose) = lookup("VERBOSE_OUTPUT") {
            self.report.verbose = parse_flag("VERBOSE_OUTPUT", &verbose)?;
        }

        if let Some(aliases) = lookup("ALIASED_PLAYERS") {
            self.aliases = serde_json::from_str(&aliases)
                .map_err(|e| anyhow!("Invalid ALIASED_PLAYERS value: {}", e))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.logging.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.logging.log_level)),
    }

    config.rating.validate()?;

    if !config.leaderboard.conservative_k.is_finite() || config.leaderboard.conservative_k < 0.0 {
        return Err(anyhow!("Conservative multiplier must be non-negative"));
    }

    for (primary, aliases) in &config.aliases {
        if primary.is_empty() || aliases.iter().any(|a| a.is_empty()) {
            return Err(anyhow!("Alias entries cannot be empty"));
        }
    }

    Ok(())
}
