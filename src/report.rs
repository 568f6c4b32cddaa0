//! Text and CSV rendering of standings
//!
//! Formatting lives outside the rating core; these writers only read
//! `Standings` and never touch ratings.

use crate::leaderboard::{Standing, Standings};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::io::Write;

const HEADERS: [&str; 9] = [
    "Rank",
    "Name",
    "Rating (mu - k*sigma)",
    "mu",
    "sigma",
    "Games Played",
    "Win/Loss",
    "Last Played (UTC)",
    "Avg Pick Order",
];

/// Extra column in verbose output: every source id folded into the player
const SOURCE_IDS_HEADER: &str = "Source ID/s";

/// Format an epoch-millis timestamp as a calendar date (UTC)
pub fn format_date(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn headers(verbose: bool) -> Vec<String> {
    let mut headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    if verbose {
        headers.push(SOURCE_IDS_HEADER.to_string());
    }
    headers
}

fn cells(row: &Standing, verbose: bool) -> Vec<String> {
    let mut cells = vec![
        row.entry.rank.to_string(),
        row.activity.name.clone(),
        format!("{:.2}", row.entry.conservative_score),
        format!("{:.2}", row.entry.mu),
        format!("{:.2}", row.entry.sigma),
        row.activity.games_played.to_string(),
        format!("{}/{}", row.activity.wins, row.activity.losses),
        format_date(row.activity.last_played),
        format!("{:.2}", row.activity.avg_pick_order()),
    ];
    if verbose {
        let ids: Vec<&str> = row.activity.source_ids.iter().map(String::as_str).collect();
        cells.push(ids.join(","));
    }
    cells
}

/// Render a plain-text table followed by filter summaries
///
/// `verbose` adds the source ids column.
pub fn write_table<W: Write>(
    out: &mut W,
    title: &str,
    standings: &Standings,
    verbose: bool,
) -> Result<()> {
    let header = headers(verbose);
    let rows: Vec<Vec<String>> = standings.rows.iter().map(|r| cells(r, verbose)).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!(" {}{} ", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("|")
    };

    writeln!(out, "{}", title)?;
    writeln!(out, "+{}+", separator)?;
    writeln!(out, "|{}|", line(&header[..]))?;
    writeln!(out, "+{}+", separator)?;
    for row in &rows {
        writeln!(out, "|{}|", line(&row[..]))?;
    }
    writeln!(out, "+{}+", separator)?;

    let filters = &standings.filters;
    writeln!(
        out,
        "Minimum games required: {} ({} players filtered)",
        filters.min_games, standings.filtered_by_min_games
    )?;
    if filters.last_days > 0 {
        let as_of = standings
            .as_of
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "Last days threshold: {} as of {} ({} players filtered)",
            filters.last_days, as_of, standings.filtered_by_last_days
        )?;
        if filters.min_recent_games > 0 {
            writeln!(
                out,
                "Min games in last days threshold: {} ({} players filtered)",
                filters.min_recent_games, standings.filtered_by_recent_games
            )?;
        }
    }
    if filters.top > 0 {
        writeln!(
            out,
            "Showing top {} players ({} cutoff)",
            filters.top, standings.cutoff
        )?;
    }

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write standings as CSV with a header row
pub fn write_csv<W: Write>(out: &mut W, standings: &Standings, verbose: bool) -> Result<()> {
    writeln!(out, "Queue,{}", headers(verbose).join(","))?;
    for row in &standings.rows {
        let fields: Vec<String> = cells(row, verbose).iter().map(|c| csv_field(c)).collect();
        writeln!(
            out,
            "{},{}",
            csv_field(&standings.queue_id),
            fields.join(",")
        )?;
    }
    Ok(())
}
