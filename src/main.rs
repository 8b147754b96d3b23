use clap::Parser;
use stats_notifier::adapters::bga::BgaClient;
use stats_notifier::app::pipelines::TrackerSettings;
use stats_notifier::config::StatsArgs;
use stats_notifier::utils::{logger, validation::Validate};
use stats_notifier::{BgaPipeline, EtlEngine, LocalStorage, NotifierError, TrackerConfig, WebhookSink};
use std::time::Duration;

async fn run(args: StatsArgs) -> Result<String, NotifierError> {
    let config = TrackerConfig::load(&args.config)?;
    config.validate()?;
    if args.verbose {
        tracing::debug!("Tracked players: {:?}", config.player_names());
    }

    let source = BgaClient::new(
        &config.tracker.base_url,
        config.request_token()?,
        config.session.cookie.as_deref(),
    )?;
    let notifier = WebhookSink::from_options(
        config.webhook.url.as_deref(),
        args.dry_run,
        config.webhook.attempts,
        Duration::from_millis(config.webhook.retry_delay_ms),
    );
    if matches!(notifier, WebhookSink::Disabled) {
        tracing::warn!("DISCORD_WEBHOOK not set, statistics will only be logged");
    }

    let mut settings = TrackerSettings::from_config(&config);
    settings.full_refresh = args.full;
    settings.dry_run = args.dry_run;
    settings.csv_path = args.csv.clone();

    // 路徑相對於目前工作目錄
    let pipeline = BgaPipeline::new(LocalStorage::new("."), source, notifier, settings);

    EtlEngine::new_with_monitoring(pipeline, args.monitor).run().await
}

#[tokio::main]
async fn main() {
    let args = StatsArgs::parse();
    logger::init(args.verbose);

    tracing::info!("Starting bga-stats");

    match run(args).await {
        Ok(database_path) => {
            tracing::info!("✅ Statistics updated");
            tracing::info!("📁 Database: {}", database_path);
            println!("✅ Statistics updated");
            println!("📁 Database: {}", database_path);
        }
        Err(e) => {
            let exit_code = e.report("bga-stats");
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
