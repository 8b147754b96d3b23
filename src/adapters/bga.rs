use crate::core::MatchSource;
use crate::domain::model::RawTable;
use crate::utils::error::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://boardgamearena.com";
const GAMES_PATH: &str = "/gamestats/gamestats/getGames.html";
const RANKING_PATH: &str = "/gamepanel/gamepanel/getRanking.html";
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Every endpoint wraps its payload in `data`. An empty result sometimes
/// comes back as `[]` instead of an object.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GamesData {
    #[serde(default)]
    tables: Vec<RawTable>,
}

#[derive(Debug, Default, Deserialize)]
struct RankingData {
    #[serde(default)]
    ranks: Vec<serde_json::Value>,
}

/// Client for the site's JSON endpoints, reusing an existing browser session.
#[derive(Debug, Clone)]
pub struct BgaClient {
    client: Client,
    base_url: String,
    request_token: String,
}

impl BgaClient {
    pub fn new(base_url: &str, request_token: &str, session_cookie: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|e| NotifierError::InvalidConfigValueError {
                field: "session.cookie".to_string(),
                value: "<redacted>".to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_token: request_token.to_string(),
        })
    }

    async fn post_form<T>(&self, path: &str, form: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-request-token", &self.request_token)
            .header("Referer", &url)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::SourceResponseError {
                source_name: "bga".to_string(),
                status: response.status().as_u16(),
            });
        }

        let envelope: Envelope = response.json().await?;
        match envelope.data {
            Some(data @ serde_json::Value::Object(_)) => Ok(serde_json::from_value(data)?),
            _ => Ok(T::default()),
        }
    }
}

fn rating_of(entry: &serde_json::Value) -> Option<f64> {
    match entry.get("ranking") {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl MatchSource for BgaClient {
    async fn fetch_tables(
        &self,
        player_id: &str,
        opponent_id: &str,
        start: i64,
        end: i64,
        page: u32,
    ) -> Result<Vec<RawTable>> {
        let form = [
            ("player", player_id.to_string()),
            ("opponent_id", opponent_id.to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("updateStats", "0".to_string()),
            ("page", page.to_string()),
            ("finished", "1".to_string()),
        ];
        let data: GamesData = self.post_form(GAMES_PATH, &form).await?;
        Ok(data.tables)
    }

    async fn fetch_top_rating(&self, game_id: &str) -> Result<Option<f64>> {
        let form = [
            ("game", game_id.to_string()),
            ("mode", "elo".to_string()),
            ("start", "0".to_string()),
        ];
        let data: RankingData = self.post_form(RANKING_PATH, &form).await?;

        // 沒有 ranking 欄位時視為起始分數
        Ok(data
            .ranks
            .first()
            .map(|top| rating_of(top).unwrap_or(crate::core::tier::BASE_RATING)))
    }
}
