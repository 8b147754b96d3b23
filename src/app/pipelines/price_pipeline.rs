use crate::core::price::{build_embeds, ENTRY_SEPARATOR};
use crate::core::{Notifier, Pipeline, PriceSource};
use crate::domain::model::PlayerPrice;
use crate::utils::error::Result;
use crate::webhook::{Embed, WebhookPayload};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_EMBED_DELAY: Duration = Duration::from_millis(500);

pub struct PricePipeline<P: PriceSource, N: Notifier> {
    source: P,
    notifier: N,
    embed_delay: Duration,
}

impl<P: PriceSource, N: Notifier> PricePipeline<P, N> {
    pub fn new(source: P, notifier: N) -> Self {
        Self {
            source,
            notifier,
            embed_delay: DEFAULT_EMBED_DELAY,
        }
    }

    pub fn with_embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay = delay;
        self
    }
}

#[async_trait]
impl<P: PriceSource, N: Notifier> Pipeline for PricePipeline<P, N> {
    type Extracted = Vec<PlayerPrice>;
    type Transformed = Vec<Embed>;

    async fn extract(&self) -> Result<Vec<PlayerPrice>> {
        let players = self.source.fetch_predictions().await?;
        tracing::info!("Found {} players with predictions", players.len());
        Ok(players)
    }

    async fn transform(&self, players: Vec<PlayerPrice>) -> Result<Vec<Embed>> {
        Ok(build_embeds(&players)
            .into_iter()
            .map(|embed| embed.fit_to_limits(ENTRY_SEPARATOR))
            .collect())
    }

    /// Failed embeds are logged; the run still succeeds.
    async fn load(&self, embeds: Vec<Embed>) -> Result<String> {
        let total = embeds.len();
        let mut delivered = 0;
        for (i, embed) in embeds.into_iter().enumerate() {
            match self.notifier.send(&WebhookPayload::embed(embed)).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!("❌ Failed to send embed {}/{}: {}", i + 1, total, e),
            }
            if i + 1 < total && !self.embed_delay.is_zero() {
                tokio::time::sleep(self.embed_delay).await;
            }
        }
        Ok(format!("{}/{} embeds sent", delivered, total))
    }
}
