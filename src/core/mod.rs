pub mod analysis;
pub mod etl;
pub mod news;
pub mod price;
pub mod report;
pub mod tally;
pub mod tier;

pub use crate::domain::model::{Database, MatchRecord, RawTable, Tally};
pub use crate::domain::ports::{MatchSource, NewsSource, Notifier, Pipeline, PriceSource, Storage};
pub use crate::utils::error::Result;
