use crate::core::analysis::{TierReport, TierSummary};
use crate::domain::model::Tally;
use crate::utils::error::Result;
use crate::webhook::limits::fields_from_entries;
use crate::webhook::Embed;

pub const STATS_TITLE: &str = "🎲 BGA Game Statistics";
pub const STATS_DESCRIPTION: &str = "Weekly analysis for tracked players";
pub const STATS_FOOTER: &str = "Counted stats for games with two or more players in this Discord.";
pub const STATS_COLOR: u32 = 0x3498db;

pub const GAMES_TITLE: &str = "🎮 Games by ELO Category";
pub const GAMES_FOOTER: &str = "Game categorization based on top player ELO";
pub const GAMES_COLOR: u32 = 0x2ecc71;

/// Percentage rounded half to even, 0 when there is nothing to divide by.
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(total) * 100.0).round_ties_even() as u32
}

/// Players of a tier, best win ratio first. Equal ratios keep name order.
pub fn ranked_players(summary: &TierSummary) -> Vec<(&str, Tally)> {
    let mut players: Vec<(&str, Tally)> = summary
        .players
        .iter()
        .map(|(name, tally)| (name.as_str(), *tally))
        .collect();
    players.sort_by(|a, b| b.1.win_ratio().total_cmp(&a.1.win_ratio()));
    players
}

pub fn player_line(name: &str, tally: &Tally) -> String {
    let t = tally.total;
    format!(
        "• {}\n🥇{}/{} ({}%) 🥈{}/{} ({}%) 💩{}/{} ({}%)",
        name,
        tally.win,
        t,
        percent(tally.win, t),
        tally.second,
        t,
        percent(tally.second, t),
        tally.last,
        t,
        percent(tally.last, t)
    )
}

fn field_name(tier: impl std::fmt::Display) -> String {
    format!("ELO: {}", tier)
}

/// Per-tier player statistics. `None` when no tier has players.
pub fn stats_embed(report: &TierReport) -> Option<Embed> {
    let mut fields = Vec::new();
    for (tier, summary) in report.iter() {
        if summary.players.is_empty() {
            continue;
        }
        let lines: Vec<String> = ranked_players(summary)
            .iter()
            .map(|(name, tally)| player_line(name, tally))
            .collect();
        fields.extend(fields_from_entries(&field_name(tier), &lines, "\n"));
    }

    if fields.is_empty() {
        return None;
    }

    Some(
        Embed::new(STATS_TITLE)
            .description(STATS_DESCRIPTION)
            .fields(fields)
            .color(STATS_COLOR)
            .footer(STATS_FOOTER),
    )
}

/// Games of every tier with their best player. `None` when there are no games.
pub fn games_embed(report: &TierReport) -> Option<Embed> {
    let mut fields = Vec::new();
    for (tier, summary) in report.iter() {
        if summary.games.is_empty() {
            continue;
        }
        let entries: Vec<String> = summary
            .games
            .iter()
            .map(|game| match &game.champion {
                Some(c) => format!(
                    "• {}\n  👑 {} ({}/{} - {}%)",
                    game.game_name,
                    c.name,
                    c.wins,
                    c.total,
                    percent(c.wins, c.total)
                ),
                None => format!("• {}\n  👑 No winners", game.game_name),
            })
            .collect();
        fields.extend(fields_from_entries(&field_name(tier), &entries, "\n"));
    }

    if fields.is_empty() {
        return None;
    }

    Some(
        Embed::new(GAMES_TITLE)
            .fields(fields)
            .color(GAMES_COLOR)
            .footer(GAMES_FOOTER),
    )
}

/// 匯出每個難度區間的玩家統計
pub fn write_csv<W: std::io::Write>(report: &TierReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["tier", "player", "win", "second", "last", "total", "win_pct"])?;

    for (tier, summary) in report.iter() {
        for (name, tally) in ranked_players(summary) {
            csv_writer.write_record([
                tier.label().to_string(),
                name.to_string(),
                tally.win.to_string(),
                tally.second.to_string(),
                tally.last.to_string(),
                tally.total.to_string(),
                percent(tally.win, tally.total).to_string(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
