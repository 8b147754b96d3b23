use crate::config::TrackerConfig;
use crate::core::analysis::{analyze, TierReport};
use crate::core::report::{games_embed, stats_embed, write_csv};
use crate::core::tally::MatchHistory;
use crate::core::tier::elo_offset;
use crate::core::{MatchSource, Notifier, Pipeline, Storage};
use crate::domain::model::{Database, MatchRecord, RecordCount, TrackedPlayer};
use crate::utils::error::{NotifierError, Result};
use crate::webhook::{Embed, WebhookPayload};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone};
use std::collections::HashMap;
use std::time::Duration;

pub const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Player lines and game entries are separated by a single newline.
const LINE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub players: Vec<TrackedPlayer>,
    pub excluded_game_ids: Vec<String>,
    /// Relative to the storage root.
    pub database_file: String,
    pub default_start: i64,
    pub request_delay: Duration,
    pub full_refresh: bool,
    pub dry_run: bool,
    pub csv_path: Option<String>,
}

impl TrackerSettings {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            players: config.tracker.players.clone(),
            excluded_game_ids: config.tracker.excluded_game_ids.clone(),
            database_file: config.tracker.database_path.clone(),
            default_start: config.tracker.default_start_timestamp,
            request_delay: Duration::from_millis(config.tracker.request_delay_ms),
            full_refresh: false,
            dry_run: false,
            csv_path: None,
        }
    }
}

/// Stored database plus the tables found in this run.
#[derive(Debug)]
pub struct Harvest {
    pub database: Database,
    pub new_matches: Vec<MatchRecord>,
    /// Upper bound of the games query; the next run starts here.
    pub query_end: i64,
}

impl RecordCount for Harvest {
    fn record_count(&self) -> usize {
        self.new_matches.len()
    }
}

#[derive(Debug)]
pub struct TrackerOutcome {
    pub database: Database,
    pub report: TierReport,
    pub query_end: i64,
}

impl RecordCount for TrackerOutcome {
    fn record_count(&self) -> usize {
        self.report.record_count()
    }
}

pub struct BgaPipeline<S: Storage, M: MatchSource, N: Notifier> {
    storage: S,
    source: M,
    notifier: N,
    settings: TrackerSettings,
}

fn parse_last_update(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, LAST_UPDATE_FORMAT)
        .ok()?
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.timestamp())
}

fn format_last_update(timestamp: i64) -> String {
    let moment = Local.timestamp_opt(timestamp, 0).earliest().unwrap_or_else(Local::now);
    moment.format(LAST_UPDATE_FORMAT).to_string()
}

impl<S: Storage, M: MatchSource, N: Notifier> BgaPipeline<S, M, N> {
    pub fn new(storage: S, source: M, notifier: N, settings: TrackerSettings) -> Self {
        Self {
            storage,
            source,
            notifier,
            settings,
        }
    }

    /// A missing file starts an empty database; an unreadable one is
    /// reported and also replaced by an empty database.
    async fn load_database(&self) -> Database {
        let path = &self.settings.database_file;
        match self.storage.read_file(path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(database) => database,
                Err(e) => {
                    tracing::warn!("⚠️ Could not parse database {}: {}, starting empty", path, e);
                    Database::default()
                }
            },
            Err(NotifierError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No database at {}, starting empty", path);
                Database::default()
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not read database {}: {}, starting empty", path, e);
                Database::default()
            }
        }
    }

    fn start_timestamp(&self, database: &Database) -> i64 {
        if self.settings.full_refresh {
            return self.settings.default_start;
        }
        match database.last_update.as_deref() {
            Some(value) => parse_last_update(value).unwrap_or_else(|| {
                tracing::warn!("Unparsable last_update {:?}, using default start", value);
                self.settings.default_start
            }),
            None => self.settings.default_start,
        }
    }

    async fn pause(&self) {
        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }
    }

    /// Pages through the common games of one pair until an empty page.
    /// An error ends the pair, keeping what was already collected.
    async fn collect_pair(
        &self,
        player: &TrackedPlayer,
        opponent: &TrackedPlayer,
        start: i64,
        end: i64,
        history: &mut MatchHistory,
    ) {
        let mut page = 1;
        loop {
            let tables = match self.source.fetch_tables(&player.id, &opponent.id, start, end, page).await {
                Ok(tables) => tables,
                Err(e) => {
                    tracing::error!(
                        "❌ Fetching {} vs {} page {} failed: {}",
                        player.name,
                        opponent.name,
                        page,
                        e
                    );
                    return;
                }
            };
            if tables.is_empty() {
                return;
            }

            let added = tables.iter().filter(|table| history.offer(table)).count();
            tracing::debug!(
                "{} vs {} page {}: {} tables, {} new",
                player.name,
                opponent.name,
                page,
                tables.len(),
                added
            );

            page += 1;
            self.pause().await;
        }
    }

    async fn ratings(&self, database: &Database) -> HashMap<String, Option<u32>> {
        let mut ratings = HashMap::new();
        for game_id in database.games.keys() {
            let elo = match self.source.fetch_top_rating(game_id).await {
                Ok(rating) => rating.map(elo_offset),
                Err(e) => {
                    tracing::warn!("Rating lookup for game {} failed: {}", game_id, e);
                    None
                }
            };
            ratings.insert(game_id.clone(), elo);
        }
        ratings
    }

    async fn deliver(&self, embed: Option<Embed>, what: &str) {
        let Some(embed) = embed else {
            tracing::info!("Nothing to send for {}", what);
            return;
        };
        let messages = embed.fit_into_messages(LINE_SEPARATOR);
        let total = messages.len();
        for (i, message) in messages.into_iter().enumerate() {
            match self.notifier.send(&WebhookPayload::embed(message)).await {
                Ok(()) => tracing::info!("✅ Sent {} ({}/{})", what, i + 1, total),
                Err(e) => tracing::error!("❌ Failed to send {} ({}/{}): {}", what, i + 1, total, e),
            }
        }
    }

    async fn export_csv(&self, report: &TierReport, path: &str) -> Result<()> {
        let mut buffer = Vec::new();
        write_csv(report, &mut buffer)?;
        self.storage.write_file(path, &buffer).await?;
        tracing::info!("📄 Tier table exported to {}", path);
        Ok(())
    }
}

#[async_trait]
impl<S: Storage, M: MatchSource, N: Notifier> Pipeline for BgaPipeline<S, M, N> {
    type Extracted = Harvest;
    type Transformed = TrackerOutcome;

    async fn extract(&self) -> Result<Harvest> {
        let mut database = self.load_database().await;
        if self.settings.full_refresh {
            // 全量重建：舊的統計與已計入的桌號一併清除
            tracing::info!(
                "Full refresh: rebuilding all tallies from {}",
                self.settings.default_start
            );
            database.games.clear();
            database.counted_tables.clear();
        }
        let start = self.start_timestamp(&database);
        let end = Local::now().timestamp();
        tracing::info!("Fetching games between {} and {}", start, end);

        let players = &self.settings.players;
        let mut history = MatchHistory::new(
            players.iter().map(|p| p.name.as_str()),
            self.settings.excluded_game_ids.iter().map(String::as_str),
            &database.counted_tables,
        );

        for (i, player) in players.iter().enumerate() {
            for opponent in &players[i + 1..] {
                tracing::info!("🔍 {} vs {}", player.name, opponent.name);
                self.collect_pair(player, opponent, start, end, &mut history).await;
                self.pause().await;
            }
        }

        if history.is_empty() {
            tracing::info!("No new games since last update");
        }

        Ok(Harvest {
            database,
            new_matches: history.into_matches(),
            query_end: end,
        })
    }

    async fn transform(&self, harvest: Harvest) -> Result<TrackerOutcome> {
        let Harvest {
            mut database,
            new_matches,
            query_end,
        } = harvest;

        let added = database.record_all(&new_matches);
        tracing::info!("Folded {} new tables into {} games", added, database.games.len());

        let ratings = self.ratings(&database).await;
        let report = analyze(&database, &ratings);

        Ok(TrackerOutcome {
            database,
            report,
            query_end,
        })
    }

    async fn load(&self, outcome: TrackerOutcome) -> Result<String> {
        let TrackerOutcome {
            mut database,
            report,
            query_end,
        } = outcome;

        self.deliver(stats_embed(&report), "statistics").await;
        self.deliver(games_embed(&report), "game list").await;

        if let Some(path) = &self.settings.csv_path {
            self.export_csv(&report, path).await?;
        }

        database.last_update = Some(format_last_update(query_end));

        let path = self.settings.database_file.clone();
        if self.settings.dry_run {
            tracing::info!("[dry run] database not saved");
        } else {
            let json = serde_json::to_vec_pretty(&database)?;
            self.storage.write_file(&path, &json).await?;
            tracing::info!("💾 Database saved to {}", path);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::RawTable;
    use crate::webhook::EmbedField;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn raw(table_id: &str, game_id: &str, names: &str, ranks: &str) -> RawTable {
        RawTable {
            table_id: Some(table_id.to_string()),
            game_id: Some(game_id.to_string()),
            game_name: Some(format!("game{}", game_id)),
            player_names: Some(names.to_string()),
            ranks: Some(ranks.to_string()),
        }
    }

    /// Pages keyed by (player, opponent); a pair missing from the map fails.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<(String, String), Vec<Vec<RawTable>>>,
        ratings: HashMap<String, f64>,
        starts: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl MatchSource for FakeSource {
        async fn fetch_tables(
            &self,
            player_id: &str,
            opponent_id: &str,
            start: i64,
            _end: i64,
            page: u32,
        ) -> Result<Vec<RawTable>> {
            self.starts.lock().unwrap().push(start);
            let pages = self
                .pages
                .get(&(player_id.to_string(), opponent_id.to_string()))
                .ok_or_else(|| NotifierError::SourceResponseError {
                    source_name: "fake".to_string(),
                    status: 500,
                })?;
            Ok(pages.get(page as usize - 1).cloned().unwrap_or_default())
        }

        async fn fetch_top_rating(&self, game_id: &str) -> Result<Option<f64>> {
            Ok(self.ratings.get(game_id).copied())
        }
    }

    /// Serves every table whose finish time falls inside the queried window.
    #[derive(Default)]
    struct TimedSource {
        tables: Mutex<Vec<(i64, RawTable)>>,
        rating_delay: Duration,
    }

    #[async_trait]
    impl MatchSource for TimedSource {
        async fn fetch_tables(
            &self,
            _player_id: &str,
            _opponent_id: &str,
            start: i64,
            end: i64,
            page: u32,
        ) -> Result<Vec<RawTable>> {
            if page > 1 {
                return Ok(Vec::new());
            }
            let tables = self.tables.lock().unwrap();
            Ok(tables
                .iter()
                .filter(|(finished, _)| (start..=end).contains(finished))
                .map(|(_, table)| table.clone())
                .collect())
        }

        async fn fetch_top_rating(&self, _game_id: &str) -> Result<Option<f64>> {
            tokio::time::sleep(self.rating_delay).await;
            Ok(Some(2150.0))
        }
    }

    async fn run_once<M: MatchSource>(
        pipeline: &BgaPipeline<LocalStorage, M, RecordingNotifier>,
    ) -> Vec<String> {
        let harvest = pipeline.extract().await.unwrap();
        let ids = harvest.new_matches.iter().map(|m| m.table_id.clone()).collect();
        let outcome = pipeline.transform(harvest).await.unwrap();
        pipeline.load(outcome).await.unwrap();
        ids
    }

    fn saved_database(dir: &TempDir) -> Database {
        serde_json::from_slice(&std::fs::read(dir.path().join("db.json")).unwrap()).unwrap()
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<WebhookPayload>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, payload: &WebhookPayload) -> Result<()> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn settings() -> TrackerSettings {
        TrackerSettings {
            players: vec![
                TrackedPlayer::new("1", "alice"),
                TrackedPlayer::new("2", "bob"),
                TrackedPlayer::new("3", "carol"),
            ],
            excluded_game_ids: vec!["99".to_string()],
            database_file: "db.json".to_string(),
            default_start: 1_609_459_200,
            request_delay: Duration::ZERO,
            full_refresh: false,
            dry_run: false,
            csv_path: None,
        }
    }

    fn source() -> FakeSource {
        let mut pages = HashMap::new();
        pages.insert(
            ("1".to_string(), "2".to_string()),
            vec![vec![raw("t1", "10", "alice,bob", "1,2"), raw("t2", "99", "alice,bob", "1,2")]],
        );
        // alice/carol fails; bob/carol sees t1 again
        pages.insert(
            ("2".to_string(), "3".to_string()),
            vec![vec![raw("t1", "10", "alice,bob", "1,2")], vec![raw("t3", "11", "bob,carol,dave", "2,1,3")]],
        );
        FakeSource {
            pages,
            ratings: HashMap::from([("10".to_string(), 2150.0)]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_extract_pairs_pages_and_dedups() {
        let dir = TempDir::new().unwrap();
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            source(),
            RecordingNotifier::default(),
            settings(),
        );

        let harvest = pipeline.extract().await.unwrap();

        let ids: Vec<&str> = harvest.new_matches.iter().map(|m| m.table_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert!(harvest.database.games.is_empty());
        assert!(pipeline.source.starts.lock().unwrap().iter().all(|s| *s == 1_609_459_200));
    }

    #[tokio::test]
    async fn test_full_run_sends_embeds_and_saves() {
        let dir = TempDir::new().unwrap();
        let notifier = RecordingNotifier::default();
        let mut config = settings();
        config.csv_path = Some("out/tiers.csv".to_string());
        let pipeline = BgaPipeline::new(LocalStorage::new(dir.path()), source(), notifier.clone(), config);

        let harvest = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(harvest).await.unwrap();
        assert_eq!(outcome.database.counted_tables.len(), 2);
        assert_eq!(outcome.report.game_count(), 2);

        let path = pipeline.load(outcome).await.unwrap();
        assert_eq!(path, "db.json");

        let saved: Database =
            serde_json::from_slice(&std::fs::read(dir.path().join("db.json")).unwrap()).unwrap();
        assert!(saved.last_update.is_some());
        assert_eq!(saved.games["10"].users["alice"].win, 1);
        assert_eq!(saved.games["11"].users["carol"].win, 1);

        let csv = std::fs::read_to_string(dir.path().join("out/tiers.csv")).unwrap();
        assert!(csv.starts_with("tier,player,win,second,last,total,win_pct"));
        assert!(csv.contains(">800,alice,1,0,0,1,100"));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].embeds[0].title.as_deref(), Some(crate::core::report::STATS_TITLE));
        assert_eq!(sent[1].embeds[0].title.as_deref(), Some(crate::core::report::GAMES_TITLE));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_save() {
        let dir = TempDir::new().unwrap();
        let mut config = settings();
        config.dry_run = true;
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            source(),
            RecordingNotifier::default(),
            config,
        );

        let harvest = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(harvest).await.unwrap();
        pipeline.load(outcome).await.unwrap();

        assert!(!dir.path().join("db.json").exists());
    }

    #[tokio::test]
    async fn test_start_timestamp_from_last_update() {
        let dir = TempDir::new().unwrap();
        let database = Database {
            last_update: Some("2024-06-01 12:00:00".to_string()),
            ..Default::default()
        };
        std::fs::write(dir.path().join("db.json"), serde_json::to_vec(&database).unwrap()).unwrap();

        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            FakeSource::default(),
            RecordingNotifier::default(),
            settings(),
        );
        let loaded = pipeline.load_database().await;
        let expected = parse_last_update("2024-06-01 12:00:00").unwrap();
        assert_eq!(pipeline.start_timestamp(&loaded), expected);

        let mut full = settings();
        full.full_refresh = true;
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            FakeSource::default(),
            RecordingNotifier::default(),
            full,
        );
        assert_eq!(pipeline.start_timestamp(&loaded), 1_609_459_200);
    }

    #[tokio::test]
    async fn test_last_update_is_the_query_end() {
        let dir = TempDir::new().unwrap();
        let source = TimedSource {
            rating_delay: Duration::from_millis(2100),
            ..Default::default()
        };
        source
            .tables
            .lock()
            .unwrap()
            .push((1_609_459_300, raw("t1", "10", "alice,bob", "1,2")));
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            source,
            RecordingNotifier::default(),
            settings(),
        );

        let harvest = pipeline.extract().await.unwrap();
        let first_end = harvest.query_end;
        let outcome = pipeline.transform(harvest).await.unwrap();
        assert_eq!(outcome.query_end, first_end);
        pipeline.load(outcome).await.unwrap();

        let saved = saved_database(&dir);
        assert_eq!(saved.last_update.as_deref().and_then(parse_last_update), Some(first_end));

        // finished while the first run was still looking up ratings
        pipeline
            .source
            .tables
            .lock()
            .unwrap()
            .push((first_end + 1, raw("t2", "10", "alice,bob", "2,1")));
        assert_eq!(run_once(&pipeline).await, vec!["t2"]);

        let saved = saved_database(&dir);
        assert_eq!(saved.counted_tables.len(), 2);
        assert_eq!(saved.games["10"].users["bob"].win, 1);
        assert_eq!(saved.games["10"].users["alice"].win, 1);
    }

    #[tokio::test]
    async fn test_full_refresh_rebuilds_legacy_database() {
        let dir = TempDir::new().unwrap();
        // no counted_tables: written before table ids were stored
        let legacy = r#"{
            "games": {"10": {"game_name": "game10", "users": {
                "alice": {"win": 1, "second": 0, "last": 0, "total": 1},
                "bob": {"win": 0, "second": 1, "last": 0, "total": 1}
            }}},
            "last_update": "2024-06-01 12:00:00"
        }"#;
        std::fs::write(dir.path().join("db.json"), legacy).unwrap();

        let mut config = settings();
        config.full_refresh = true;
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            source(),
            RecordingNotifier::default(),
            config,
        );
        assert_eq!(run_once(&pipeline).await, vec!["t1", "t3"]);

        let saved = saved_database(&dir);
        let alice = saved.games["10"].users["alice"];
        assert_eq!((alice.win, alice.total), (1, 1));
        assert_eq!(saved.games["10"].users["bob"].second, 1);
        assert_eq!(saved.games["11"].users["carol"].win, 1);
    }

    #[tokio::test]
    async fn test_oversized_embed_is_sent_in_parts() {
        let dir = TempDir::new().unwrap();
        let notifier = RecordingNotifier::default();
        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            FakeSource::default(),
            notifier.clone(),
            settings(),
        );
        let embed = Embed::new("games")
            .fields((0..8).map(|i| EmbedField::new(format!("tier {}", i), "g".repeat(1000))));

        pipeline.deliver(Some(embed), "game list").await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        let fields: usize = sent.iter().map(|p| p.embeds[0].fields.len()).sum();
        assert_eq!(fields, 8);
    }

    #[tokio::test]
    async fn test_corrupt_database_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("db.json"), b"{not json").unwrap();

        let pipeline = BgaPipeline::new(
            LocalStorage::new(dir.path()),
            FakeSource::default(),
            RecordingNotifier::default(),
            settings(),
        );
        assert_eq!(pipeline.load_database().await, Database::default());
    }
}
