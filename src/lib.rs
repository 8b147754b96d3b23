pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod webhook;

pub use adapters::storage::LocalStorage;
pub use adapters::webhook::{WebhookClient, WebhookSink};
pub use app::pipelines::{BgaPipeline, NewsPipeline, PricePipeline};
pub use config::{NewsConfig, PriceConfig, TrackerConfig};
pub use core::etl::EtlEngine;
pub use utils::error::{NotifierError, Result};
