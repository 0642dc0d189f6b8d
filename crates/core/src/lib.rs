//! Core types and shared functionality for feedstash.
//!
//! This crate provides:
//! - Feed domain types and the `FeedLoader` capability
//! - The feed store contract with SQLite, JSON file, and in-memory adapters
//! - Cache staleness policy and the local (cache-backed) loader
//! - Ownership-gated result delivery for spawned operations
//! - Unified store errors and layered configuration

pub mod cache;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;

pub use cache::{
    CachePolicy, CachedFeed, FeedStore, InMemoryFeedStore, JsonFileFeedStore, LocalFeedEntry, LocalFeedLoader,
    RetrievalOutcome, SqliteFeedStore,
};
pub use clock::{Clock, SystemClock};
pub use config::{AppConfig, ConfigError, StoreKind};
pub use delivery::{Completion, DeliveryToken, Liveness};
pub use error::Error;
pub use feed::{FeedEntry, FeedLoader};
