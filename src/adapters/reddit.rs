use crate::core::NewsSource;
use crate::domain::model::NewsPost;
use crate::utils::error::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_USER_AGENT: &str = "stats-notifier/0.1 (fpl news relay)";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: NewsPost,
}

/// Reads the public JSON search listing of a subreddit.
#[derive(Debug, Clone)]
pub struct RedditClient {
    client: Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl NewsSource for RedditClient {
    async fn search(&self, subreddit: &str, query: &str, limit: usize) -> Result<Vec<NewsPost>> {
        let url = format!("{}/r/{}/search.json", self.base_url, subreddit);
        let limit = limit.to_string();
        tracing::debug!("GET {} q={}", url, query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("restrict_sr", "1"),
                ("sort", "new"),
                ("t", "day"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::SourceResponseError {
                source_name: "reddit".to_string(),
                status: response.status().as_u16(),
            });
        }

        let listing: Listing = response.json().await?;
        Ok(listing.data.children.into_iter().map(|c| c.data).collect())
    }
}
