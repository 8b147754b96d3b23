use crate::config::NewsConfig;
use crate::core::news::select_messages;
use crate::core::{NewsSource, Notifier, Pipeline};
use crate::domain::model::NewsPost;
use crate::utils::error::Result;
use crate::webhook::limits::split_content;
use crate::webhook::WebhookPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const NEWS_QUERY: &str = "flair:\"News\"";
pub const DEFAULT_POST_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct NewsSettings {
    pub subreddit: String,
    pub query: String,
    pub limit: usize,
    pub post_delay: Duration,
    /// Fixed "now" for the window; the current time when unset.
    pub reference_time: Option<DateTime<Utc>>,
}

impl NewsSettings {
    pub fn from_config(config: &NewsConfig) -> Self {
        Self {
            subreddit: config.subreddit.clone(),
            query: NEWS_QUERY.to_string(),
            limit: config.limit,
            post_delay: DEFAULT_POST_DELAY,
            reference_time: None,
        }
    }
}

pub struct NewsPipeline<R: NewsSource, N: Notifier> {
    source: R,
    notifier: N,
    settings: NewsSettings,
}

impl<R: NewsSource, N: Notifier> NewsPipeline<R, N> {
    pub fn new(source: R, notifier: N, settings: NewsSettings) -> Self {
        Self {
            source,
            notifier,
            settings,
        }
    }
}

#[async_trait]
impl<R: NewsSource, N: Notifier> Pipeline for NewsPipeline<R, N> {
    type Extracted = Vec<NewsPost>;
    type Transformed = Vec<String>;

    async fn extract(&self) -> Result<Vec<NewsPost>> {
        tracing::info!("Searching r/{} for {}", self.settings.subreddit, self.settings.query);
        self.source
            .search(&self.settings.subreddit, &self.settings.query, self.settings.limit)
            .await
    }

    async fn transform(&self, posts: Vec<NewsPost>) -> Result<Vec<String>> {
        let now = self.settings.reference_time.unwrap_or_else(Utc::now);
        Ok(select_messages(&posts, now))
    }

    /// 任何一則訊息送出失敗都會中止
    async fn load(&self, messages: Vec<String>) -> Result<String> {
        if messages.is_empty() {
            tracing::info!("No new posts in the given window.");
            return Ok("no new posts".to_string());
        }

        let total = messages.len();
        for (i, message) in messages.iter().enumerate() {
            for chunk in split_content(message) {
                self.notifier.send(&WebhookPayload::content(chunk)).await?;
            }
            tracing::info!("✅ Sent post {}/{}", i + 1, total);

            if i + 1 < total && !self.settings.post_delay.is_zero() {
                tokio::time::sleep(self.settings.post_delay).await;
            }
        }
        Ok(format!("{} posts sent", total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::NotifierError;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    struct FakeReddit {
        posts: Vec<NewsPost>,
    }

    #[async_trait]
    impl NewsSource for FakeReddit {
        async fn search(&self, subreddit: &str, query: &str, limit: usize) -> Result<Vec<NewsPost>> {
            assert_eq!(subreddit, "FantasyPL");
            assert_eq!(query, NEWS_QUERY);
            assert_eq!(limit, 50);
            Ok(self.posts.clone())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<WebhookPayload>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, payload: &WebhookPayload) -> Result<()> {
            if self.fail {
                return Err(NotifierError::WebhookError { status: 400 });
            }
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn settings() -> NewsSettings {
        NewsSettings {
            subreddit: "FantasyPL".to_string(),
            query: NEWS_QUERY.to_string(),
            limit: 50,
            post_delay: Duration::ZERO,
            reference_time: Some(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()),
        }
    }

    fn post(title: &str, created: DateTime<Utc>) -> NewsPost {
        NewsPost {
            title: title.to_string(),
            permalink: format!("/r/FantasyPL/comments/{}/", title),
            created_utc: created.timestamp() as f64,
        }
    }

    async fn run(pipeline: &NewsPipeline<FakeReddit, RecordingNotifier>) -> Result<String> {
        let posts = pipeline.extract().await?;
        let messages = pipeline.transform(posts).await?;
        pipeline.load(messages).await
    }

    #[tokio::test]
    async fn test_only_posts_in_window_are_sent() {
        let notifier = RecordingNotifier::default();
        let reddit = FakeReddit {
            posts: vec![
                post("inside", Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap()),
                post("too_old", Utc.with_ymd_and_hms(2025, 3, 9, 17, 59, 59).unwrap()),
            ],
        };
        let pipeline = NewsPipeline::new(reddit, notifier.clone(), settings());

        let output = run(&pipeline).await.unwrap();

        assert_eq!(output, "1 posts sent");
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(
            sent[0].content.as_deref(),
            Some("**inside**\nhttps://reddit.com/r/FantasyPL/comments/inside/")
        );
    }

    #[tokio::test]
    async fn test_no_posts_sends_nothing() {
        let notifier = RecordingNotifier::default();
        let pipeline = NewsPipeline::new(FakeReddit { posts: vec![] }, notifier.clone(), settings());

        assert_eq!(run(&pipeline).await.unwrap(), "no new posts");
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_aborts() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let reddit = FakeReddit {
            posts: vec![post("inside", Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap())],
        };
        let pipeline = NewsPipeline::new(reddit, notifier, settings());

        assert!(matches!(
            run(&pipeline).await,
            Err(NotifierError::WebhookError { status: 400 })
        ));
    }
}
