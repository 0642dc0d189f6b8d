//! Subcommand handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use feedstash_client::{HttpTransport, RemoteFeedLoader, TransportConfig};
use feedstash_core::{
    AppConfig, FeedEntry, FeedLoader, FeedStore, InMemoryFeedStore, JsonFileFeedStore, LocalFeedLoader,
    SqliteFeedStore, StoreKind, SystemClock,
};

use crate::Command;

type Local = LocalFeedLoader<Arc<dyn FeedStore>>;

pub async fn run(cmd: Command, config: &AppConfig) -> Result<()> {
    match cmd {
        Command::Refresh => {
            let local = local_loader(config).await?;
            local.validate_cache().await;

            let feed = remote_loader(config)?.load().await.context("failed to load remote feed")?;
            local.save(&feed).await.context("failed to save feed to cache")?;
            tracing::info!(entries = feed.len(), "cache refreshed");
            print_feed(&feed)
        }
        Command::Cached => {
            let local = local_loader(config).await?;
            local.validate_cache().await;

            let feed = local.load().await.context("failed to load cached feed")?;
            tracing::info!(entries = feed.len(), "loaded cached feed");
            print_feed(&feed)
        }
        Command::Validate => {
            local_loader(config).await?.validate_cache().await;
            tracing::info!("cache validated");
            Ok(())
        }
        Command::Remote => {
            let feed = remote_loader(config)?.load().await.context("failed to load remote feed")?;
            tracing::info!(entries = feed.len(), "loaded remote feed");
            print_feed(&feed)
        }
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn FeedStore>> {
    let store: Arc<dyn FeedStore> = match config.store {
        StoreKind::Sqlite => Arc::new(
            SqliteFeedStore::open(&config.db_path)
                .await
                .with_context(|| format!("failed to open cache database {}", config.db_path.display()))?,
        ),
        StoreKind::Json => Arc::new(JsonFileFeedStore::new(&config.json_path)),
        StoreKind::Memory => Arc::new(InMemoryFeedStore::new()),
    };
    Ok(store)
}

async fn local_loader(config: &AppConfig) -> Result<Local> {
    let store = open_store(config).await?;
    Ok(LocalFeedLoader::with_policy(store, SystemClock, config.cache_policy()))
}

fn remote_loader(config: &AppConfig) -> Result<RemoteFeedLoader<HttpTransport>> {
    let url = config.require_feed_url()?;
    let transport = HttpTransport::new(TransportConfig::from(config))?;
    Ok(RemoteFeedLoader::new(url, transport))
}

fn print_feed(feed: &[FeedEntry]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(feed)?);
    Ok(())
}
