//! Settings for the two FPL jobs, which only read the environment.

use crate::adapters::reddit::DEFAULT_USER_AGENT;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_required_field, validate_url, Validate,
};

pub const DEFAULT_NEWS_LIMIT: usize = 50;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub subreddit: String,
    pub webhook_url: Option<String>,
    pub user_agent: String,
    pub limit: usize,
}

impl NewsConfig {
    pub fn from_env(subreddit: impl Into<String>) -> Self {
        Self {
            subreddit: subreddit.into(),
            webhook_url: env_var("DISCORD_WEBHOOK"),
            user_agent: env_var("REDDIT_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            limit: DEFAULT_NEWS_LIMIT,
        }
    }
}

impl Validate for NewsConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("subreddit", &self.subreddit)?;
        validate_non_empty_string("REDDIT_USER_AGENT", &self.user_agent)?;
        validate_positive_number("limit", self.limit, 1)?;
        if let Some(url) = &self.webhook_url {
            validate_url("DISCORD_WEBHOOK", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PriceConfig {
    pub feed_url: Option<String>,
    pub webhook_url: Option<String>,
}

impl PriceConfig {
    /// `feed` from the command line wins over `FPL_PRICE_FEED`.
    pub fn from_env(feed: Option<String>) -> Self {
        Self {
            feed_url: feed.or_else(|| env_var("FPL_PRICE_FEED")),
            webhook_url: env_var("DISCORD_WEBHOOK"),
        }
    }

    pub fn feed_url(&self) -> Result<&String> {
        validate_required_field("FPL_PRICE_FEED", &self.feed_url)
    }
}

impl Validate for PriceConfig {
    fn validate(&self) -> Result<()> {
        validate_url("FPL_PRICE_FEED", self.feed_url()?)?;
        if let Some(url) = &self.webhook_url {
            validate_url("DISCORD_WEBHOOK", url)?;
        }
        Ok(())
    }
}
