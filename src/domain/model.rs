use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPlayer {
    pub id: String,
    pub name: String,
}

impl TrackedPlayer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One row of the match-history endpoint. The site sends ids as strings or
/// numbers depending on the endpoint version.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTable {
    #[serde(default, deserialize_with = "lenient_string")]
    pub table_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub game_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub player_names: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ranks: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Winner,
    RunnerUp,
    Loser,
    Last,
}

/// A finished table reduced to the tracked players' placements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub table_id: String,
    pub game_id: String,
    pub game_name: String,
    pub winners: Vec<String>,
    pub runner_ups: Vec<String>,
    pub losers: Vec<String>,
    pub lasts: Vec<String>,
}

impl MatchRecord {
    pub fn placements(&self) -> impl Iterator<Item = (&str, Placement)> {
        tagged(&self.winners, Placement::Winner)
            .chain(tagged(&self.runner_ups, Placement::RunnerUp))
            .chain(tagged(&self.losers, Placement::Loser))
            .chain(tagged(&self.lasts, Placement::Last))
    }

    pub fn participants(&self) -> usize {
        self.winners.len() + self.runner_ups.len() + self.losers.len() + self.lasts.len()
    }
}

fn tagged(names: &[String], placement: Placement) -> impl Iterator<Item = (&str, Placement)> {
    names.iter().map(move |n| (n.as_str(), placement))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub win: u32,
    pub second: u32,
    pub last: u32,
    pub total: u32,
}

impl Tally {
    pub fn apply(&mut self, placement: Placement) {
        match placement {
            Placement::Winner => self.win += 1,
            Placement::RunnerUp => self.second += 1,
            Placement::Last => self.last += 1,
            Placement::Loser => {}
        }
        self.total += 1;
    }

    pub fn win_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.win) / f64::from(self.total)
        }
    }
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.win += other.win;
        self.second += other.second;
        self.last += other.last;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    pub game_name: String,
    #[serde(default)]
    pub users: BTreeMap<String, Tally>,
}

/// The persisted tracker state, keyed by the site's game id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub games: BTreeMap<String, GameEntry>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub counted_tables: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsPost {
    pub title: String,
    pub permalink: String,
    pub created_utc: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPrice {
    pub name: String,
    pub position: String,
    pub price: String,
    pub team: String,
    pub progress_now: String,
    pub prediction: String,
    pub prediction_time: String,
    pub progress_per_hour: String,
}

/// 讓 EtlEngine 在每個階段記錄處理筆數
pub trait RecordCount {
    fn record_count(&self) -> usize;
}

impl<T> RecordCount for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}
