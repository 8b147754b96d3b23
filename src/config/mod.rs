#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{NewsArgs, PriceArgs, StatsArgs};
pub use env::{NewsConfig, PriceConfig};
pub use toml_config::TrackerConfig;
