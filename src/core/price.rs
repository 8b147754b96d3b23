use crate::domain::model::PlayerPrice;
use crate::webhook::{Embed, EmbedField};

pub const PRICE_TITLE: &str = "📊 Daily LiveFPL Price Predictions";
pub const PRICE_FOOTER: &str = "LiveFPL Price Movement Analysis";
pub const RISERS_NAME: &str = "📈 TOP 10 PREDICTED RISERS";
pub const FALLERS_NAME: &str = "📉 TOP 10 PREDICTED FALLERS";
pub const RISER_COLOR: u32 = 0x2ecc71;
pub const FALLER_COLOR: u32 = 0xe74c3c;
pub const EMPTY_COLOR: u32 = 0xff0000;

pub const TOP_N: usize = 10;
pub const BAR_BLOCKS: usize = 20;
/// Entries inside a field are separated by a blank line; fields are split there.
pub const ENTRY_SEPARATOR: &str = "\n\n";

fn parse_percent(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('%').trim().parse().ok()
}

impl PlayerPrice {
    /// Numeric prediction, e.g. `"-25%"` → `-25.0`. Unparsable → 0.
    pub fn prediction_value(&self) -> f64 {
        parse_percent(&self.prediction)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

/// `` `[-----     ]` 25% `` style bar for a progress percentage.
pub fn progress_bar(value: &str, total_blocks: usize) -> String {
    let filled = parse_percent(value)
        .filter(|v| v.is_finite())
        .map(|v| (v.abs().min(100.0) / 100.0 * total_blocks as f64).floor() as usize)
        .unwrap_or(0)
        .min(total_blocks);
    let empty = total_blocks - filled;
    format!("`[{}{}]` {}", "-".repeat(filled), " ".repeat(empty), value)
}

/// Top risers (highest positive prediction first) and top fallers (most
/// negative first).
pub fn top_movers(players: &[PlayerPrice]) -> (Vec<&PlayerPrice>, Vec<&PlayerPrice>) {
    let mut sorted: Vec<&PlayerPrice> = players.iter().collect();
    sorted.sort_by(|a, b| b.prediction_value().total_cmp(&a.prediction_value()));

    let risers: Vec<&PlayerPrice> = sorted
        .iter()
        .copied()
        .filter(|p| p.prediction_value() > 0.0)
        .take(TOP_N)
        .collect();

    let mut fallers: Vec<&PlayerPrice> = sorted
        .iter()
        .copied()
        .filter(|p| p.prediction_value() < 0.0)
        .collect();
    fallers.sort_by(|a, b| a.prediction_value().total_cmp(&b.prediction_value()));
    fallers.truncate(TOP_N);

    (risers, fallers)
}

pub fn format_entry(rank: usize, p: &PlayerPrice) -> String {
    format!(
        "{}. **{}** ({}) {} - {}\n{}\nPred: {}, Time: {}, /hr: {}",
        rank,
        p.name,
        p.position,
        p.price,
        p.team,
        progress_bar(&p.progress_now, BAR_BLOCKS),
        p.prediction,
        p.prediction_time,
        p.progress_per_hour
    )
}

fn movers_embed(name: &str, color: u32, players: &[&PlayerPrice]) -> Embed {
    let value = players
        .iter()
        .enumerate()
        .map(|(i, p)| format_entry(i + 1, p))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR);

    Embed::new(PRICE_TITLE)
        .field(EmbedField::new(name, value))
        .color(color)
        .footer(PRICE_FOOTER)
}

/// One embed for risers and one for fallers; an error embed when there is no data.
pub fn build_embeds(players: &[PlayerPrice]) -> Vec<Embed> {
    if players.is_empty() {
        return vec![Embed::new(PRICE_TITLE)
            .description("❌ No player data found")
            .color(EMPTY_COLOR)];
    }

    let (risers, fallers) = top_movers(players);
    let mut embeds = Vec::new();
    if !risers.is_empty() {
        embeds.push(movers_embed(RISERS_NAME, RISER_COLOR, &risers));
    }
    if !fallers.is_empty() {
        embeds.push(movers_embed(FALLERS_NAME, FALLER_COLOR, &fallers));
    }
    embeds
}
