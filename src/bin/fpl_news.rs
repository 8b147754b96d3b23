use clap::Parser;
use stats_notifier::adapters::reddit::{RedditClient, DEFAULT_BASE_URL};
use stats_notifier::adapters::webhook::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY};
use stats_notifier::app::pipelines::NewsSettings;
use stats_notifier::config::NewsArgs;
use stats_notifier::utils::{logger, validation::Validate};
use stats_notifier::{EtlEngine, NewsConfig, NewsPipeline, NotifierError, WebhookSink};

async fn run(args: NewsArgs) -> Result<String, NotifierError> {
    let config = NewsConfig::from_env(args.subreddit);
    config.validate()?;

    let reddit = RedditClient::new(DEFAULT_BASE_URL, &config.user_agent)?;
    let notifier = WebhookSink::from_options(
        config.webhook_url.as_deref(),
        args.dry_run,
        DEFAULT_ATTEMPTS,
        DEFAULT_RETRY_DELAY,
    );
    if matches!(notifier, WebhookSink::Disabled) {
        tracing::warn!("DISCORD_WEBHOOK not set, posts will only be logged");
    }

    let pipeline = NewsPipeline::new(reddit, notifier, NewsSettings::from_config(&config));
    EtlEngine::new(pipeline).run().await
}

#[tokio::main]
async fn main() {
    let args = NewsArgs::parse();
    logger::init(args.verbose);

    tracing::info!("Starting fpl-news for r/{}", args.subreddit);

    match run(args).await {
        Ok(summary) => println!("✅ {}", summary),
        Err(e) => {
            let exit_code = e.report("fpl-news");
            // 傳送失敗一律視為失敗
            std::process::exit(exit_code.max(1));
        }
    }
}
