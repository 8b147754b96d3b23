pub mod bga_pipeline;
pub mod news_pipeline;
pub mod price_pipeline;

pub use bga_pipeline::{BgaPipeline, TrackerSettings};
pub use news_pipeline::{NewsPipeline, NewsSettings};
pub use price_pipeline::PricePipeline;
