use crate::core::tier::EloTier;
use crate::domain::model::{Database, RecordCount, Tally};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameChampion {
    pub name: String,
    pub wins: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierGame {
    pub game_id: String,
    pub game_name: String,
    pub champion: Option<GameChampion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierSummary {
    pub players: BTreeMap<String, Tally>,
    pub games: Vec<TierGame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierReport {
    pub tiers: BTreeMap<EloTier, TierSummary>,
}

impl TierReport {
    /// Non-empty tiers, hardest first.
    pub fn iter(&self) -> impl Iterator<Item = (EloTier, &TierSummary)> {
        self.tiers.iter().map(|(tier, summary)| (*tier, summary))
    }

    pub fn game_count(&self) -> usize {
        self.tiers.values().map(|s| s.games.len()).sum()
    }
}

impl RecordCount for TierReport {
    fn record_count(&self) -> usize {
        self.game_count()
    }
}

/// Player with the best win ratio. Only a strictly better ratio replaces the
/// current best, so ties go to the first name in order and nobody is picked
/// when nobody won.
pub fn best_player(users: &BTreeMap<String, Tally>) -> Option<GameChampion> {
    let mut best: Option<(&String, &Tally)> = None;
    for (name, tally) in users {
        let best_ratio = best.map(|(_, t)| t.win_ratio()).unwrap_or(0.0);
        if tally.win_ratio() > best_ratio {
            best = Some((name, tally));
        }
    }
    best.map(|(name, tally)| GameChampion {
        name: name.clone(),
        wins: tally.win,
        total: tally.total,
    })
}

/// Buckets every game of the database into its tier and sums the players'
/// tallies per tier. `ratings` maps game id to the ELO offset; a missing
/// entry or `None` puts the game in the lowest tier.
pub fn analyze(database: &Database, ratings: &HashMap<String, Option<u32>>) -> TierReport {
    let mut report = TierReport::default();

    for (game_id, game) in &database.games {
        let elo = ratings.get(game_id).copied().flatten();
        let summary = report.tiers.entry(EloTier::classify(elo)).or_default();

        for (user, tally) in &game.users {
            *summary.players.entry(user.clone()).or_default() += *tally;
        }

        summary.games.push(TierGame {
            game_id: game_id.clone(),
            game_name: game.game_name.clone(),
            champion: best_player(&game.users),
        });
    }

    report
}
