//! Placement classification and cumulative per-game tallies.

use crate::domain::model::{Database, GameEntry, MatchRecord, RawTable};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Reduces a raw table to the tracked players' placements.
///
/// Rank `1` wins, rank `2` is runner-up, the largest rank is last and any
/// other rank is a plain loss. In a two-player game the loser is counted as
/// runner-up. Returns `None` when the table has no id, no game id, or no
/// numeric rank at all.
pub fn classify_table(table: &RawTable, tracked: &HashSet<String>) -> Option<MatchRecord> {
    let table_id = table.table_id.clone()?;
    let game_id = table.game_id.clone()?;

    let names: Vec<&str> = table
        .player_names
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .collect();
    let ranks: Vec<Option<u32>> = table
        .ranks
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|r| r.trim().parse().ok())
        .collect();

    let largest = ranks.iter().flatten().copied().max()?;

    let mut record = MatchRecord {
        table_id,
        game_id,
        game_name: table
            .game_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        ..MatchRecord::default()
    };

    for (name, rank) in names.iter().zip(ranks.iter()) {
        if !tracked.contains(*name) {
            continue;
        }
        let bucket = match rank {
            Some(1) => &mut record.winners,
            Some(2) => &mut record.runner_ups,
            Some(r) if *r == largest => &mut record.lasts,
            _ => &mut record.losers,
        };
        bucket.push(name.to_string());
    }

    Some(record)
}

/// Matches collected during one run, deduplicated by table id.
#[derive(Debug)]
pub struct MatchHistory {
    tracked: HashSet<String>,
    excluded_games: HashSet<String>,
    seen: BTreeSet<String>,
    matches: BTreeMap<String, MatchRecord>,
}

impl MatchHistory {
    /// `already_counted` holds tables folded into the database by earlier runs.
    pub fn new<'a>(
        tracked: impl IntoIterator<Item = &'a str>,
        excluded_games: impl IntoIterator<Item = &'a str>,
        already_counted: &BTreeSet<String>,
    ) -> Self {
        Self {
            tracked: tracked.into_iter().map(str::to_string).collect(),
            excluded_games: excluded_games.into_iter().map(str::to_string).collect(),
            seen: already_counted.clone(),
            matches: BTreeMap::new(),
        }
    }

    /// Returns `true` when the table was new and accepted.
    pub fn offer(&mut self, table: &RawTable) -> bool {
        let (Some(table_id), Some(game_id)) = (&table.table_id, &table.game_id) else {
            return false;
        };
        if self.excluded_games.contains(game_id) || self.seen.contains(table_id) {
            return false;
        }

        match classify_table(table, &self.tracked) {
            Some(record) => {
                tracing::debug!(
                    "Added game: {} (table {}, {} tracked players)",
                    record.game_name,
                    record.table_id,
                    record.participants()
                );
                self.seen.insert(table_id.clone());
                self.matches.insert(table_id.clone(), record);
                true
            }
            None => {
                tracing::warn!("Skipping table {}: no numeric ranks", table_id);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn into_matches(self) -> Vec<MatchRecord> {
        self.matches.into_values().collect()
    }
}

impl GameEntry {
    pub fn new(game_name: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            users: BTreeMap::new(),
        }
    }
}

impl Database {
    /// Folds one match into the tallies. A table already counted is ignored
    /// and `false` is returned.
    pub fn record(&mut self, record: &MatchRecord) -> bool {
        if !self.counted_tables.insert(record.table_id.clone()) {
            return false;
        }

        let game = self
            .games
            .entry(record.game_id.clone())
            .or_insert_with(|| GameEntry::new(record.game_name.clone()));

        for (name, placement) in record.placements() {
            game.users.entry(name.to_string()).or_default().apply(placement);
        }
        true
    }

    /// Returns how many of the matches were new.
    pub fn record_all<'a>(&mut self, records: impl IntoIterator<Item = &'a MatchRecord>) -> usize {
        records.into_iter().filter(|r| self.record(r)).count()
    }

    pub fn is_counted(&self, table_id: &str) -> bool {
        self.counted_tables.contains(table_id)
    }
}
