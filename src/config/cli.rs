use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "bga-stats")]
#[command(about = "Tracks common board game results and posts tiered statistics to a webhook")]
pub struct StatsArgs {
    /// TOML config file; missing file means defaults plus environment
    #[arg(long, default_value = "tracker.toml")]
    pub config: String,

    /// Ignore last_update and fetch from the configured start timestamp
    #[arg(long)]
    pub full: bool,

    /// Log the webhook payloads and skip saving the database
    #[arg(long)]
    pub dry_run: bool,

    /// Also export the tier table as CSV
    #[arg(long)]
    pub csv: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring (CPU and memory usage)")]
    pub monitor: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "fpl-news")]
#[command(about = "Relays the day's flaired news posts of a subreddit to a webhook")]
pub struct NewsArgs {
    #[arg(long, default_value = "FantasyPL")]
    pub subreddit: String,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "fpl-price")]
#[command(about = "Posts the top predicted price risers and fallers to a webhook")]
pub struct PriceArgs {
    /// Prediction feed URL, falls back to FPL_PRICE_FEED
    #[arg(long)]
    pub feed: Option<String>,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
