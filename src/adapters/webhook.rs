use crate::core::Notifier;
use crate::utils::error::{NotifierError, Result};
use crate::webhook::WebhookPayload;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts payloads to a chat webhook. Transport errors, 429 and 5xx are
/// retried a fixed number of times; anything else fails right away.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
    attempts: u32,
    retry_delay: Duration,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn send(&self, payload: &WebhookPayload) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            let response = self
                .client
                .post(&self.url)
                .json(payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("Webhook accepted message: HTTP {}", resp.status());
                    return Ok(());
                }
                Ok(resp) if Self::is_retryable(resp.status()) => {
                    tracing::warn!(
                        "Webhook attempt {}/{} failed: HTTP {}",
                        attempt,
                        self.attempts,
                        resp.status()
                    );
                    last_error = Some(NotifierError::WebhookError {
                        status: resp.status().as_u16(),
                    });
                }
                Ok(resp) => {
                    return Err(NotifierError::WebhookError {
                        status: resp.status().as_u16(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Webhook attempt {}/{} failed: {}", attempt, self.attempts, e);
                    last_error = Some(NotifierError::ApiError(e));
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last_error.unwrap_or(NotifierError::WebhookError { status: 0 }))
    }
}

/// Where pipeline output goes: a real webhook, the log (dry run) or nowhere.
#[derive(Debug, Clone)]
pub enum WebhookSink {
    Webhook(WebhookClient),
    DryRun,
    Disabled,
}

impl WebhookSink {
    pub fn from_options(url: Option<&str>, dry_run: bool, attempts: u32, retry_delay: Duration) -> Self {
        match (dry_run, url) {
            (true, _) => WebhookSink::DryRun,
            (false, Some(url)) => {
                WebhookSink::Webhook(WebhookClient::new(url).with_retry(attempts, retry_delay))
            }
            (false, None) => WebhookSink::Disabled,
        }
    }
}

#[async_trait]
impl Notifier for WebhookSink {
    async fn send(&self, payload: &WebhookPayload) -> Result<()> {
        match self {
            WebhookSink::Webhook(client) => client.send(payload).await,
            WebhookSink::DryRun => {
                let json = serde_json::to_string_pretty(payload)?;
                tracing::info!("[dry run] webhook payload:\n{}", json);
                Ok(())
            }
            WebhookSink::Disabled => {
                tracing::debug!("No webhook configured, message dropped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn payload() -> WebhookPayload {
        WebhookPayload::content("**Injury news**\nhttps://reddit.com/r/FantasyPL/comments/abc/")
    }

    #[tokio::test]
    async fn test_send_posts_json_payload() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST)
                .path("/webhook")
                .json_body(serde_json::json!({
                    "content": "**Injury news**\nhttps://reddit.com/r/FantasyPL/comments/abc/"
                }));
            then.status(204);
        });

        let client = WebhookClient::new(server.url("/webhook"));
        client.send(&payload()).await.unwrap();

        hook.assert();
    }

    #[tokio::test]
    async fn test_send_retries_server_errors() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST).path("/webhook");
            then.status(503);
        });

        let client = WebhookClient::new(server.url("/webhook")).with_retry(3, Duration::ZERO);
        let result = client.send(&payload()).await;

        hook.assert_hits(3);
        assert!(matches!(result, Err(NotifierError::WebhookError { status: 503 })));
    }

    #[tokio::test]
    async fn test_send_does_not_retry_client_errors() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST).path("/webhook");
            then.status(404);
        });

        let client = WebhookClient::new(server.url("/webhook")).with_retry(3, Duration::ZERO);
        let result = client.send(&payload()).await;

        hook.assert_hits(1);
        assert!(matches!(result, Err(NotifierError::WebhookError { status: 404 })));
    }

    #[tokio::test]
    async fn test_dry_run_and_disabled_sinks_do_not_send() {
        let dry = WebhookSink::from_options(Some("http://127.0.0.1:1/hook"), true, 3, Duration::ZERO);
        assert!(matches!(dry, WebhookSink::DryRun));
        dry.send(&payload()).await.unwrap();

        let disabled = WebhookSink::from_options(None, false, 3, Duration::ZERO);
        assert!(matches!(disabled, WebhookSink::Disabled));
        disabled.send(&payload()).await.unwrap();
    }
}
