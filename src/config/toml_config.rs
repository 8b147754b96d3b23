use crate::adapters::bga::DEFAULT_BASE_URL;
use crate::adapters::webhook::DEFAULT_ATTEMPTS;
use crate::domain::model::TrackedPlayer;
use crate::utils::error::{NotifierError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_unique, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// 2021-01-01 00:00:00 UTC
pub const DEFAULT_START_TIMESTAMP: i64 = 1_609_459_200;
pub const DEFAULT_DATABASE_PATH: &str = "data/bga_games_database.json";
pub const EXAMPLE_CONFIG_FILE: &str = "tracker.example.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub webhook: WebhookSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    pub players: Vec<TrackedPlayer>,
    /// Cooperative or solo games where placements mean nothing.
    pub excluded_game_ids: Vec<String>,
    pub database_path: String,
    pub base_url: String,
    pub default_start_timestamp: i64,
    pub request_delay_ms: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            // Turing Machine, Hanabi, Word Traveler
            excluded_game_ids: vec!["1015".into(), "1804".into(), "1937".into()],
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_start_timestamp: DEFAULT_START_TIMESTAMP,
            request_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    pub request_token: Option<String>,
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSection {
    pub url: Option<String>,
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for WebhookSection {
    fn default() -> Self {
        Self {
            url: None,
            attempts: DEFAULT_ATTEMPTS,
            retry_delay_ms: 1000,
        }
    }
}

fn env_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"))
}

/// `${VAR}` left in place means the variable was not set.
fn resolved(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && !env_placeholder().is_match(v))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl TrackerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NotifierError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        let config: Self = toml::from_str(&processed).map_err(|e| NotifierError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;
        Ok(config.normalized())
    }

    /// Loads the file when it exists, otherwise starts from defaults.
    /// Values still missing afterwards are taken from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::warn!(
                "No config file at {}, using defaults (copy {} to start one)",
                path.display(),
                EXAMPLE_CONFIG_FILE
            );
            Self::default()
        };
        Ok(config.with_env_fallback())
    }

    /// 替換環境變數 (例如 ${DISCORD_WEBHOOK})
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    fn normalized(mut self) -> Self {
        self.session.request_token = resolved(self.session.request_token.take());
        self.session.cookie = resolved(self.session.cookie.take());
        self.webhook.url = resolved(self.webhook.url.take());
        self
    }

    pub fn with_env_fallback(mut self) -> Self {
        if self.session.request_token.is_none() {
            self.session.request_token = env_var("BGA_REQUEST_TOKEN");
        }
        if self.session.cookie.is_none() {
            self.session.cookie = env_var("BGA_SESSION_COOKIE");
        }
        if self.webhook.url.is_none() {
            self.webhook.url = env_var("DISCORD_WEBHOOK");
        }
        self
    }

    pub fn player_names(&self) -> Vec<&str> {
        self.tracker.players.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn request_token(&self) -> Result<&String> {
        validate_required_field("session.request_token", &self.session.request_token)
    }
}

impl Validate for TrackerConfig {
    fn validate(&self) -> Result<()> {
        if self.tracker.players.len() < 2 {
            return Err(NotifierError::InvalidConfigValueError {
                field: "tracker.players".to_string(),
                value: self.tracker.players.len().to_string(),
                reason: format!(
                    "At least two players are needed to find common games; copy {} to tracker.toml and list them under [[tracker.players]]",
                    EXAMPLE_CONFIG_FILE
                ),
            });
        }
        for player in &self.tracker.players {
            validate_non_empty_string("tracker.players.id", &player.id)?;
            validate_non_empty_string("tracker.players.name", &player.name)?;
        }
        let ids: Vec<&str> = self.tracker.players.iter().map(|p| p.id.as_str()).collect();
        validate_unique("tracker.players.id", &ids)?;
        validate_unique("tracker.players.name", &self.player_names())?;

        validate_url("tracker.base_url", &self.tracker.base_url)?;
        validate_path("tracker.database_path", &self.tracker.database_path)?;
        self.request_token()?;

        if let Some(url) = &self.webhook.url {
            validate_url("webhook.url", url)?;
        }
        validate_range("webhook.attempts", self.webhook.attempts, 1, 10)?;

        Ok(())
    }
}
