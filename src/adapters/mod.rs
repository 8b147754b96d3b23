// Adapters layer: concrete implementations for external systems (storage, http sources, webhook).

pub mod bga;
pub mod price_feed;
pub mod reddit;
pub mod storage;
pub mod webhook;
