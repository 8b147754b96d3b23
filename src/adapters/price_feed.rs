use crate::core::PriceSource;
use crate::domain::model::PlayerPrice;
use crate::utils::error::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// The feed is either a bare array or `{"players": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedBody {
    List(Vec<PlayerPrice>),
    Wrapped { players: Vec<PlayerPrice> },
}

/// Reads price-change predictions from a JSON feed.
#[derive(Debug, Clone)]
pub struct PriceFeedClient {
    client: Client,
    url: String,
}

impl PriceFeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl PriceSource for PriceFeedClient {
    async fn fetch_predictions(&self) -> Result<Vec<PlayerPrice>> {
        tracing::debug!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(NotifierError::SourceResponseError {
                source_name: "price feed".to_string(),
                status: response.status().as_u16(),
            });
        }

        let players = match response.json::<FeedBody>().await? {
            FeedBody::List(players) => players,
            FeedBody::Wrapped { players } => players,
        };
        Ok(players)
    }
}
