use clap::Parser;
use stats_notifier::adapters::price_feed::PriceFeedClient;
use stats_notifier::adapters::webhook::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY};
use stats_notifier::config::PriceArgs;
use stats_notifier::utils::{logger, validation::Validate};
use stats_notifier::{EtlEngine, NotifierError, PriceConfig, PricePipeline, WebhookSink};

async fn run(args: PriceArgs) -> Result<String, NotifierError> {
    let config = PriceConfig::from_env(args.feed);
    config.validate()?;

    let feed = PriceFeedClient::new(config.feed_url()?.as_str());
    let notifier = WebhookSink::from_options(
        config.webhook_url.as_deref(),
        args.dry_run,
        DEFAULT_ATTEMPTS,
        DEFAULT_RETRY_DELAY,
    );

    EtlEngine::new(PricePipeline::new(feed, notifier)).run().await
}

#[tokio::main]
async fn main() {
    let args = PriceArgs::parse();
    logger::init(args.verbose);

    tracing::info!("Starting fpl-price");

    match run(args).await {
        Ok(summary) => println!("✅ {}", summary),
        Err(e) => {
            let exit_code = e.report("fpl-price");
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
