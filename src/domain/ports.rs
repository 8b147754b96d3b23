use crate::domain::model::{NewsPost, PlayerPrice, RawTable, RecordCount};
use crate::utils::error::Result;
use crate::webhook::WebhookPayload;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: RecordCount + Send;
    type Transformed: RecordCount + Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}

/// Match history and ratings of the board-game site.
#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn fetch_tables(
        &self,
        player_id: &str,
        opponent_id: &str,
        start: i64,
        end: i64,
        page: u32,
    ) -> Result<Vec<RawTable>>;

    /// Rating of the best player of the game, before the base offset is removed.
    async fn fetch_top_rating(&self, game_id: &str) -> Result<Option<f64>>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, subreddit: &str, query: &str, limit: usize) -> Result<Vec<NewsPost>>;
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_predictions(&self) -> Result<Vec<PlayerPrice>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &WebhookPayload) -> Result<()>;
}
