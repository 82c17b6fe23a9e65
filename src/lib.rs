//! Behavior tracking, product scoring and recommendations for a small demo shop.
//!
//! Customer interactions are appended to `smart_shopping.behavior_events`. Popularity
//! and trend scores are recomputed from the last two weeks of events when a refresh is
//! due, relevance is nudged per category on every product view, and recommendations
//! rank products by `popularity + trend`.
//!
//! Nothing here takes locks or opens transactions across operations. Score refreshes
//! and relevance increments are read-then-write and assume a single active customer.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recommender;
pub mod report;
pub mod scores;
pub mod session;
pub mod tracker;

pub use error::{ShopError, ShopResult};
